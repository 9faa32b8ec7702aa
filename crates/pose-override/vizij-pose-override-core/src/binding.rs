//! Per-frame pose stream and the binder that resolves bones into stream handles.
//!
//! Adapters (Bevy, [`crate::MemoryPoseStream`]) implement both traits. Binding
//! happens once in [`crate::BlendEvaluator::bind`]; the hot path then only
//! touches handles.

use glam::Vec3;

use crate::ids::{BoneId, PropertyHandle, ReadOnlyHandle, ReadWriteHandle};
use crate::value::TransformValue;

/// Resolves bones and named properties to stream handles at bind time.
pub trait StreamBinder {
    fn bind_read_write(&mut self, bone: BoneId) -> Option<ReadWriteHandle>;
    fn bind_read_only(&mut self, bone: BoneId) -> Option<ReadOnlyHandle>;
    /// Float channel by name; `None` when the stream does not carry it.
    fn bind_property(&mut self, name: &str) -> Option<PropertyHandle>;
    /// Local pose of `bone` at bind time; becomes the evaluator's baseline.
    fn bind_pose(&self, bone: BoneId) -> Option<TransformValue>;
}

/// Read/write access to the pose being produced this frame.
pub trait PoseStream {
    fn read_position(&self, handle: ReadOnlyHandle) -> Vec3;
    fn read_scale(&self, handle: ReadOnlyHandle) -> Vec3;
    fn write_position(&mut self, handle: ReadWriteHandle, value: Vec3);
    fn write_scale(&mut self, handle: ReadWriteHandle, value: Vec3);
    fn read_float(&self, handle: PropertyHandle) -> f32;

    /// Bulk read into `out`, one value per handle.
    fn read_floats(&self, handles: &[PropertyHandle], out: &mut [f32]) {
        for (slot, h) in out.iter_mut().zip(handles) {
            *slot = self.read_float(*h);
        }
    }
}
