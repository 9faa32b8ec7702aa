use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap};
use vizij_pose_override_core::{BoneId, Config, IdAllocator, TransformValue};

#[derive(Clone, Debug)]
struct BoneSlot {
    entity: Entity,
    name: String,
    parent: Option<BoneId>,
    children: Vec<BoneId>,
    rest: TransformValue,
    root: bool,
    live: bool,
}

/// Index from entities under a [`crate::PoseOverrideRoot`] to stable
/// [`BoneId`]s, with the hierarchy links and rest pose of each bone.
///
/// An entity keeps its id for as long as it stays under a root; the rest
/// pose is the `Transform` seen when the entity was first indexed. Entities
/// missing from a pass are dropped, and ids are never handed out twice.
#[derive(Resource, Default, Debug)]
pub struct BoneIndex {
    ids: IdAllocator,
    slots: BTreeMap<BoneId, BoneSlot>,
    by_entity: HashMap<Entity, BoneId>,
}

impl BoneIndex {
    fn live_slot(&self, bone: BoneId) -> Option<&BoneSlot> {
        self.slots.get(&bone).filter(|s| s.live)
    }

    pub fn bone(&self, entity: Entity) -> Option<BoneId> {
        let bone = *self.by_entity.get(&entity)?;
        self.live_slot(bone).map(|_| bone)
    }

    pub fn entity(&self, bone: BoneId) -> Option<Entity> {
        self.live_slot(bone).map(|s| s.entity)
    }

    pub fn name(&self, bone: BoneId) -> Option<&str> {
        self.live_slot(bone).map(|s| s.name.as_str())
    }

    pub fn parent(&self, bone: BoneId) -> Option<BoneId> {
        self.live_slot(bone).and_then(|s| s.parent)
    }

    pub fn children(&self, bone: BoneId) -> &[BoneId] {
        self.live_slot(bone)
            .map(|s| s.children.as_slice())
            .unwrap_or_default()
    }

    pub fn is_root(&self, bone: BoneId) -> bool {
        self.live_slot(bone).is_some_and(|s| s.root)
    }

    pub fn rest_pose(&self, bone: BoneId) -> Option<TransformValue> {
        self.live_slot(bone).map(|s| s.rest)
    }

    /// Lowest-id live bone with the given name.
    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.slots
            .iter()
            .find(|(_, s)| s.live && s.name == name)
            .map(|(bone, _)| *bone)
    }

    /// Number of live bones.
    pub fn len(&self) -> usize {
        self.slots.values().filter(|s| s.live).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn begin_pass(&mut self) {
        for s in self.slots.values_mut() {
            s.live = false;
            s.parent = None;
            s.children.clear();
        }
    }

    /// Forget every bone the pass did not visit.
    pub(crate) fn end_pass(&mut self) {
        let before = self.slots.len();
        self.slots.retain(|_, s| s.live);
        let slots = &self.slots;
        self.by_entity.retain(|_, bone| slots.contains_key(&*bone));
        let pruned = before - self.slots.len();
        if pruned > 0 {
            debug!("bone index pruned {} entities", pruned);
        }
    }

    pub(crate) fn upsert(
        &mut self,
        entity: Entity,
        name: &str,
        rest: TransformValue,
        root: bool,
    ) -> BoneId {
        if let Some(&bone) = self.by_entity.get(&entity) {
            if let Some(s) = self.slots.get_mut(&bone) {
                s.name.clear();
                s.name.push_str(name);
                s.root = root;
                s.live = true;
                return bone;
            }
        }
        let bone = self.ids.alloc_bone();
        self.slots.insert(
            bone,
            BoneSlot {
                entity,
                name: name.to_string(),
                parent: None,
                children: Vec::new(),
                rest,
                root,
                live: true,
            },
        );
        self.by_entity.insert(entity, bone);
        bone
    }

    pub(crate) fn link(&mut self, child: BoneId, parent: BoneId) {
        if let Some(s) = self.slots.get_mut(&child) {
            s.parent = Some(parent);
        }
        if let Some(p) = self.slots.get_mut(&parent) {
            p.children.push(child);
        }
    }
}

/// Core settings used by the bind and evaluate systems.
#[derive(Resource, Debug, Default, Clone)]
pub struct PoseOverrideConfig(pub Config);
