//! Deviation detection between a baseline and the live hierarchy.
//!
//! Only position and scale are compared. Rotation edits are restored on
//! cancel but never produce override data.

use serde::Serialize;

use crate::hierarchy::SkeletonHierarchy;
use crate::ids::BoneId;
use crate::override_set::MAX_ENTRIES;
use crate::snapshot::BaselinePose;
use crate::value::TransformValue;

/// True when `current`'s local position or scale is more than `threshold`
/// away from `baseline`. Unknown bones never count as deviated.
pub fn is_deviated<H: SkeletonHierarchy + ?Sized>(
    baseline: &TransformValue,
    h: &H,
    current: BoneId,
    threshold: f32,
) -> bool {
    h.local_transform(current)
        .is_some_and(|now| now.differs_from(baseline, threshold))
}

/// Deviated bones, first-found-in-hierarchy-traversal-order.
pub fn select_deviated<H: SkeletonHierarchy + ?Sized>(
    baseline: &BaselinePose,
    h: &H,
    threshold: f32,
) -> Vec<BoneId> {
    baseline
        .iter()
        .filter(|(bone, value)| is_deviated(value, h, *bone, threshold))
        .map(|(bone, _)| bone)
        .collect()
}

/// Advisory summary shown while a capture is open.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeviationReport {
    pub bones: Vec<BoneId>,
    pub names: Vec<String>,
    pub capacity: usize,
}

impl DeviationReport {
    pub fn build<H: SkeletonHierarchy + ?Sized>(h: &H, bones: Vec<BoneId>) -> Self {
        let names = bones
            .iter()
            .map(|b| h.name(*b).unwrap_or_default().to_string())
            .collect();
        Self {
            bones,
            names,
            capacity: MAX_ENTRIES,
        }
    }

    pub fn count(&self) -> usize {
        self.bones.len()
    }

    /// More deviations than one override unit can hold.
    pub fn capacity_exceeded(&self) -> bool {
        self.bones.len() > self.capacity
    }

    /// Units needed to store every deviation.
    pub fn units_needed(&self) -> usize {
        self.bones.len().div_ceil(self.capacity)
    }
}
