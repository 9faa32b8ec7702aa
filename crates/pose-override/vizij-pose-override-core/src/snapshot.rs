//! Baseline pose capture and restore.

use indexmap::IndexMap;

use crate::hierarchy::SkeletonHierarchy;
use crate::ids::BoneId;
use crate::value::TransformValue;

/// Local poses of a bone set, keyed in capture order.
///
/// Iteration order is the order bones were handed to [`BaselinePose::capture`],
/// which for skeleton captures is hierarchy traversal order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BaselinePose {
    values: IndexMap<BoneId, TransformValue>,
}

impl BaselinePose {
    /// Read the local pose of every bone. Bones the host does not know are skipped.
    pub fn capture<H, I>(h: &H, bones: I) -> Self
    where
        H: SkeletonHierarchy + ?Sized,
        I: IntoIterator<Item = BoneId>,
    {
        let mut values = IndexMap::new();
        for bone in bones {
            if let Some(v) = h.local_transform(bone) {
                values.entry(bone).or_insert(v);
            }
        }
        Self { values }
    }

    /// Write every captured value back. Idempotent.
    pub fn restore<H: SkeletonHierarchy + ?Sized>(&self, h: &mut H) {
        for (bone, value) in &self.values {
            h.set_local_transform(*bone, *value);
        }
    }

    pub fn get(&self, bone: BoneId) -> Option<&TransformValue> {
        self.values.get(&bone)
    }

    pub fn contains(&self, bone: BoneId) -> bool {
        self.values.contains_key(&bone)
    }

    pub fn bones(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BoneId, &TransformValue)> + '_ {
        self.values.iter().map(|(b, v)| (*b, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
