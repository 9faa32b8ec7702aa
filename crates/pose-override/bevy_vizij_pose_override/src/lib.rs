use bevy::prelude::*;

pub mod components;
pub mod resources;
pub mod systems;

pub use components::{BoundPoseOverride, PoseOverride, PoseOverrideRoot};
pub use resources::{BoneIndex, PoseOverrideConfig};
pub use systems::{with_hierarchy, TransformPoseStream, WorldHierarchy};

/// Ordering handles for the plugin's systems; all run in `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseOverrideSystems {
    Index,
    Bind,
    Evaluate,
}

#[derive(Default)]
pub struct VizijPoseOverridePlugin {
    pub config: vizij_pose_override_core::Config,
}

impl Plugin for VizijPoseOverridePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PoseOverrideConfig(self.config.clone()))
            .init_resource::<BoneIndex>()
            .configure_sets(
                Update,
                (
                    PoseOverrideSystems::Index,
                    PoseOverrideSystems::Bind,
                    PoseOverrideSystems::Evaluate,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    systems::build_bone_index_system.in_set(PoseOverrideSystems::Index),
                    systems::bind_overrides_system.in_set(PoseOverrideSystems::Bind),
                    systems::evaluate_overrides_system.in_set(PoseOverrideSystems::Evaluate),
                ),
            );
    }
}
