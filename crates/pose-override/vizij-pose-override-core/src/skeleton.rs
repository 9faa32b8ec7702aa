//! In-memory transform hierarchy.
//!
//! Reference host for tests, tools and headless pipelines. Nodes live in an
//! arena indexed by [`BoneId`]; parents own ordered child lists.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hierarchy::SkeletonHierarchy;
use crate::ids::{BoneId, IdAllocator};
use crate::value::TransformValue;

#[derive(Clone, Debug)]
struct Node {
    name: String,
    parent: Option<BoneId>,
    children: Vec<BoneId>,
    local: TransformValue,
    skeleton_root: bool,
}

/// Arena-backed hierarchy of named nodes.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    ids: IdAllocator,
    nodes: Vec<Node>,
}

/// Nested JSON description of a node and its subtree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkeletonDesc {
    pub name: String,
    #[serde(default)]
    pub position: Option<Vec3>,
    #[serde(default)]
    pub scale: Option<Vec3>,
    #[serde(default)]
    pub rotation: Option<Quat>,
    /// Marks the node as a skeleton root.
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub children: Vec<SkeletonDesc>,
}

impl SkeletonDesc {
    fn local(&self) -> TransformValue {
        TransformValue {
            position: self.position.unwrap_or(Vec3::ZERO),
            scale: self.scale.unwrap_or(Vec3::ONE),
            rotation: self.rotation.unwrap_or(Quat::IDENTITY),
        }
    }
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, parent: Option<BoneId>, local: TransformValue) -> BoneId {
        let id = self.ids.alloc_bone();
        self.nodes.push(Node {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            local,
            skeleton_root: false,
        });
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(p.index())) {
            p.children.push(id);
        }
        id
    }

    /// Add a parentless node with identity pose.
    pub fn add_root(&mut self, name: &str) -> BoneId {
        self.push(name, None, TransformValue::IDENTITY)
    }

    pub fn add_child(&mut self, parent: BoneId, name: &str, local: TransformValue) -> BoneId {
        self.push(name, Some(parent), local)
    }

    pub fn mark_skeleton_root(&mut self, bone: BoneId) {
        if let Some(n) = self.nodes.get_mut(bone.index()) {
            n.skeleton_root = true;
        }
    }

    /// Instantiate a description as a new top-level subtree; returns its root.
    pub fn add_desc(&mut self, desc: &SkeletonDesc) -> BoneId {
        self.add_desc_under(None, desc)
    }

    fn add_desc_under(&mut self, parent: Option<BoneId>, desc: &SkeletonDesc) -> BoneId {
        let id = self.push(&desc.name, parent, desc.local());
        if desc.root {
            self.mark_skeleton_root(id);
        }
        for child in &desc.children {
            self.add_desc_under(Some(id), child);
        }
        id
    }

    pub fn from_desc(desc: &SkeletonDesc) -> Self {
        let mut s = Self::new();
        s.add_desc(desc);
        s
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let desc: SkeletonDesc = serde_json::from_str(json)?;
        Ok(Self::from_desc(&desc))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn bones(&self) -> impl Iterator<Item = BoneId> + '_ {
        (0..self.nodes.len() as u32).map(BoneId)
    }

    /// First node (in creation order) with the given name.
    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| BoneId(i as u32))
    }

    /// Resolve a `/`-separated path of names starting at `from`'s children.
    pub fn find_path(&self, from: BoneId, path: &str) -> Option<BoneId> {
        let mut cur = from;
        for seg in path.split('/').filter(|s| !s.is_empty()) {
            cur = *self
                .children(cur)
                .iter()
                .find(|c| self.name(**c) == Some(seg))?;
        }
        Some(cur)
    }

    fn node(&self, bone: BoneId) -> Option<&Node> {
        self.nodes.get(bone.index())
    }
}

impl SkeletonHierarchy for Skeleton {
    fn contains(&self, bone: BoneId) -> bool {
        bone.index() < self.nodes.len()
    }

    fn name(&self, bone: BoneId) -> Option<&str> {
        self.node(bone).map(|n| n.name.as_str())
    }

    fn parent(&self, bone: BoneId) -> Option<BoneId> {
        self.node(bone).and_then(|n| n.parent)
    }

    fn children(&self, bone: BoneId) -> &[BoneId] {
        self.node(bone).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn is_skeleton_root(&self, bone: BoneId) -> bool {
        self.node(bone).is_some_and(|n| n.skeleton_root)
    }

    fn local_transform(&self, bone: BoneId) -> Option<TransformValue> {
        self.node(bone).map(|n| n.local)
    }

    fn set_local_transform(&mut self, bone: BoneId, value: TransformValue) {
        if let Some(n) = self.nodes.get_mut(bone.index()) {
            n.local = value;
        }
    }
}
