//! Vizij Pose Override Core (engine-agnostic)
//!
//! Captures hand-made edits to a skeleton as a small set of per-bone
//! overrides and blends them back over an animated pose stream at runtime.
//! Hosts plug in through [`SkeletonHierarchy`] for editor-time access and
//! [`StreamBinder`]/[`PoseStream`] for the per-frame pass.

pub mod binding;
pub mod blend;
pub mod config;
pub mod deviation;
pub mod editor;
pub mod error;
pub mod events;
pub mod hierarchy;
pub mod ids;
pub mod matcher;
pub mod override_set;
pub mod session;
pub mod skeleton;
pub mod snapshot;
pub mod splitter;
pub mod stream;
pub mod value;

// Re-exports for consumers (adapters)
pub use binding::{PoseStream, StreamBinder};
pub use blend::{blend_absolute, blend_offset, BlendEvaluator, BlendMode, BoundEvaluator};
pub use config::{Config, OverflowPolicy, DEFAULT_DEVIATION_THRESHOLD};
pub use deviation::{is_deviated, select_deviated, DeviationReport};
pub use editor::OverrideEditor;
pub use error::{InvalidSetReason, OverrideError, PushError, Result};
pub use events::EditorEvent;
pub use hierarchy::{all_bones, find_skeleton_root, relative_path, SkeletonHierarchy};
pub use ids::{BoneId, IdAllocator, PropertyHandle, ReadOnlyHandle, ReadWriteHandle};
pub use matcher::match_by_relative_path;
pub use override_set::{OverrideEntry, OverrideRig, OverrideSet, MAX_ENTRIES};
pub use session::{CaptureSession, CopySource, SessionKind, SessionState};
pub use skeleton::{Skeleton, SkeletonDesc};
pub use snapshot::BaselinePose;
pub use splitter::{OverflowSplitter, OverrideUnitHost, SplitReport};
pub use stream::MemoryPoseStream;
pub use value::TransformValue;
