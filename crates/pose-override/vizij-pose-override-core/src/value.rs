//! Local transform values captured from and written back to skeleton nodes.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local position/scale/rotation of one node.
///
/// Rotation is carried so that a restore puts the node back exactly; it is
/// never diffed or blended.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformValue {
    pub position: Vec3,
    pub scale: Vec3,
    #[serde(default = "identity_rotation")]
    pub rotation: Quat,
}

fn identity_rotation() -> Quat {
    Quat::IDENTITY
}

impl Default for TransformValue {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TransformValue {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, scale: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            scale,
            rotation,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// True when position or scale differ from `other` by more than `threshold`
    /// (Euclidean distance, strict comparison).
    #[inline]
    pub fn differs_from(&self, other: &TransformValue, threshold: f32) -> bool {
        self.position.distance(other.position) > threshold
            || self.scale.distance(other.scale) > threshold
    }

    /// Component-wise closeness on position, scale and rotation.
    pub fn abs_diff_eq(&self, other: &TransformValue, eps: f32) -> bool {
        self.position.abs_diff_eq(other.position, eps)
            && self.scale.abs_diff_eq(other.scale, eps)
            && self.rotation.abs_diff_eq(other.rotation, eps)
    }
}
