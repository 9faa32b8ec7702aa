use bevy::prelude::*;
use std::collections::HashSet;

use crate::components::{BoundPoseOverride, PoseOverride, PoseOverrideRoot};
use crate::resources::{BoneIndex, PoseOverrideConfig};
use vizij_pose_override_core::{
    BlendEvaluator, BoneId, Config, PoseStream, PropertyHandle, ReadOnlyHandle, ReadWriteHandle,
    SkeletonHierarchy, StreamBinder, TransformValue,
};

pub(crate) fn transform_value(tf: &Transform) -> TransformValue {
    TransformValue {
        position: tf.translation,
        scale: tf.scale,
        rotation: tf.rotation,
    }
}

/// Editor-time view of the indexed skeletons in a `World`.
pub struct WorldHierarchy<'a> {
    world: &'a mut World,
    index: &'a BoneIndex,
}

impl<'a> WorldHierarchy<'a> {
    pub fn new(world: &'a mut World, index: &'a BoneIndex) -> Self {
        Self { world, index }
    }
}

impl SkeletonHierarchy for WorldHierarchy<'_> {
    fn contains(&self, bone: BoneId) -> bool {
        self.index.entity(bone).is_some()
    }

    fn name(&self, bone: BoneId) -> Option<&str> {
        self.index.name(bone)
    }

    fn parent(&self, bone: BoneId) -> Option<BoneId> {
        self.index.parent(bone)
    }

    fn children(&self, bone: BoneId) -> &[BoneId] {
        self.index.children(bone)
    }

    fn is_skeleton_root(&self, bone: BoneId) -> bool {
        self.index.is_root(bone)
    }

    fn local_transform(&self, bone: BoneId) -> Option<TransformValue> {
        let entity = self.index.entity(bone)?;
        self.world.get::<Transform>(entity).map(transform_value)
    }

    fn set_local_transform(&mut self, bone: BoneId, value: TransformValue) {
        let Some(entity) = self.index.entity(bone) else {
            return;
        };
        if let Some(mut tf) = self.world.get_mut::<Transform>(entity) {
            tf.translation = value.position;
            tf.scale = value.scale;
            tf.rotation = value.rotation;
        }
    }
}

/// Run `f` against a [`WorldHierarchy`] built from the current [`BoneIndex`].
pub fn with_hierarchy<R>(world: &mut World, f: impl FnOnce(&mut WorldHierarchy<'_>) -> R) -> R {
    world.init_resource::<BoneIndex>();
    world.resource_scope(|world, index: Mut<BoneIndex>| {
        let mut h = WorldHierarchy::new(world, &index);
        f(&mut h)
    })
}

/// Per-frame pose stream over bone `Transform`s.
///
/// Handles are bone ids, so evaluators bound in one frame stay valid in the
/// next. There are no float channels: units keep their stored weights and
/// [`PoseOverride::weight`] scales all of them at evaluation.
pub struct TransformPoseStream<'a, 'w, 's, 't> {
    index: &'a BoneIndex,
    transforms: &'a mut Query<'w, 's, &'t mut Transform>,
}

impl<'a, 'w, 's, 't> TransformPoseStream<'a, 'w, 's, 't> {
    pub fn new(index: &'a BoneIndex, transforms: &'a mut Query<'w, 's, &'t mut Transform>) -> Self {
        Self { index, transforms }
    }

    fn resolve(&self, bone: BoneId) -> Option<Entity> {
        self.index
            .entity(bone)
            .filter(|e| self.transforms.contains(*e))
    }

    fn read(&self, handle: u32) -> Option<&Transform> {
        let entity = self.index.entity(BoneId(handle))?;
        self.transforms.get(entity).ok()
    }

    fn write(&mut self, handle: u32, f: impl FnOnce(&mut Transform)) {
        let Some(entity) = self.index.entity(BoneId(handle)) else {
            return;
        };
        if let Ok(mut tf) = self.transforms.get_mut(entity) {
            f(&mut tf);
        }
    }
}

impl StreamBinder for TransformPoseStream<'_, '_, '_, '_> {
    fn bind_read_write(&mut self, bone: BoneId) -> Option<ReadWriteHandle> {
        self.resolve(bone).map(|_| ReadWriteHandle(bone.0))
    }

    fn bind_read_only(&mut self, bone: BoneId) -> Option<ReadOnlyHandle> {
        self.resolve(bone).map(|_| ReadOnlyHandle(bone.0))
    }

    fn bind_property(&mut self, _name: &str) -> Option<PropertyHandle> {
        None
    }

    fn bind_pose(&self, bone: BoneId) -> Option<TransformValue> {
        self.resolve(bone)?;
        self.index.rest_pose(bone)
    }
}

impl PoseStream for TransformPoseStream<'_, '_, '_, '_> {
    fn read_position(&self, handle: ReadOnlyHandle) -> Vec3 {
        self.read(handle.0).map_or(Vec3::ZERO, |tf| tf.translation)
    }

    fn read_scale(&self, handle: ReadOnlyHandle) -> Vec3 {
        self.read(handle.0).map_or(Vec3::ONE, |tf| tf.scale)
    }

    fn write_position(&mut self, handle: ReadWriteHandle, value: Vec3) {
        self.write(handle.0, |tf| tf.translation = value);
    }

    fn write_scale(&mut self, handle: ReadWriteHandle, value: Vec3) {
        self.write(handle.0, |tf| tf.scale = value);
    }

    fn read_float(&self, _handle: PropertyHandle) -> f32 {
        0.0
    }
}

/// Walks descendants under each PoseOverrideRoot and refreshes the BoneIndex.
/// Parents come from `Parent`, so nested roots resolve to the outermost one.
pub fn build_bone_index_system(
    roots: Query<Entity, With<PoseOverrideRoot>>,
    nodes: Query<(
        Option<&Name>,
        Option<&Parent>,
        Option<&Children>,
        Option<&Transform>,
    )>,
    mut index: ResMut<BoneIndex>,
) {
    // Depth-first traversal from each root
    let mut order: Vec<Entity> = Vec::new();
    let mut seen: HashSet<Entity> = HashSet::new();
    for root in roots.iter() {
        let mut stack = vec![root];
        while let Some(e) = stack.pop() {
            if !seen.insert(e) {
                continue;
            }
            order.push(e);
            if let Ok((_, _, Some(children), _)) = nodes.get(e) {
                stack.extend(children.iter().rev().copied());
            }
        }
    }

    index.begin_pass();
    for &e in &order {
        let Ok((name, _, _, tf)) = nodes.get(e) else {
            continue;
        };
        let name = name.map(Name::as_str).unwrap_or_default();
        let rest = tf.map(transform_value).unwrap_or_default();
        index.upsert(e, name, rest, roots.contains(e));
    }
    for &e in &order {
        let Ok((_, Some(parent), _, _)) = nodes.get(e) else {
            continue;
        };
        if let (Some(child), Some(parent)) = (index.bone(e), index.bone(parent.get())) {
            index.link(child, parent);
        }
    }
    index.end_pass();
}

fn evaluator_for(config: &Config, po: &PoseOverride) -> BlendEvaluator {
    BlendEvaluator::from_config(&Config {
        blend_mode: po.mode,
        ..config.clone()
    })
}

/// Binds (or rebinds) evaluators for new or edited PoseOverride components
/// and drops them when the component goes away. Weight-only edits keep the
/// existing binding.
pub fn bind_overrides_system(
    mut commands: Commands,
    index: Res<BoneIndex>,
    config: Res<PoseOverrideConfig>,
    overrides: Query<(Entity, Ref<PoseOverride>, Option<&BoundPoseOverride>)>,
    mut transforms: Query<&mut Transform>,
    mut removed: RemovedComponents<PoseOverride>,
) {
    for entity in removed.read() {
        if let Some(mut ec) = commands.get_entity(entity) {
            ec.remove::<BoundPoseOverride>();
        }
    }

    for (entity, po, bound) in overrides.iter() {
        // Failed binds are retried once the component is touched again.
        let needs_bind = po.is_changed() && bound.map_or(true, |b| b.is_stale(&po));
        if !needs_bind {
            continue;
        }
        let evaluator = evaluator_for(&config.0, &po);
        let mut stream = TransformPoseStream::new(&index, &mut transforms);
        match evaluator.bind_rig(&po.rig, &mut stream) {
            Ok(units) => {
                debug!("bound {} override units on {:?}", units.len(), entity);
                commands.entity(entity).insert(BoundPoseOverride {
                    units,
                    rig: po.rig.clone(),
                    mode: po.mode,
                });
            }
            Err(err) => {
                warn!("pose override on {:?} not bound: {}", entity, err);
                commands.entity(entity).remove::<BoundPoseOverride>();
            }
        }
    }
}

/// Blends every bound override into bone transforms, each unit at its
/// stored weight times the component weight.
pub fn evaluate_overrides_system(
    index: Res<BoneIndex>,
    mut overrides: Query<(&PoseOverride, &mut BoundPoseOverride)>,
    mut transforms: Query<&mut Transform>,
) {
    for (po, mut bound) in overrides.iter_mut() {
        let mut stream = TransformPoseStream::new(&index, &mut transforms);
        for unit in bound.units.iter_mut() {
            unit.evaluate_scaled(&mut stream, po.weight);
        }
    }
}
