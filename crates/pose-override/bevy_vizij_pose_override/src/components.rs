use bevy::prelude::*;
use vizij_pose_override_core::{BlendMode, BoundEvaluator, OverrideRig};

/// Marker component designating a skeleton root (the animated object).
/// The index system walks descendants of every entity with this marker.
#[derive(Component, Debug, Default)]
pub struct PoseOverrideRoot;

/// Stored overrides applied to the indexed skeleton every frame.
///
/// `weight` is the animatable master weight; it multiplies the stored weight
/// of every unit in `rig`. `OffsetAdditive` expects bone
/// transforms to be re-posed each frame by an animation driver that runs
/// before [`crate::PoseOverrideSystems::Evaluate`].
#[derive(Component, Debug, Clone)]
pub struct PoseOverride {
    pub rig: OverrideRig,
    pub mode: BlendMode,
    pub weight: f32,
}

impl PoseOverride {
    pub fn new(rig: OverrideRig) -> Self {
        Self {
            rig,
            mode: BlendMode::default(),
            weight: 1.0,
        }
    }

    pub fn with_mode(mut self, mode: BlendMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Evaluators bound for a [`PoseOverride`]; managed by the bind system.
#[derive(Component, Debug)]
pub struct BoundPoseOverride {
    pub(crate) units: Vec<BoundEvaluator>,
    pub(crate) rig: OverrideRig,
    pub(crate) mode: BlendMode,
}

impl BoundPoseOverride {
    pub fn units(&self) -> &[BoundEvaluator] {
        &self.units
    }

    /// Bound data no longer matches `po`.
    pub fn is_stale(&self, po: &PoseOverride) -> bool {
        self.mode != po.mode || self.rig != po.rig
    }
}
