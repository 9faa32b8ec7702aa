//! Map-backed pose stream.
//!
//! Stands in for a host animation stream in tests and offline tools. Every
//! bone of the source hierarchy gets a slot; properties are named floats.

use glam::Vec3;
use hashbrown::HashMap;

use crate::binding::{PoseStream, StreamBinder};
use crate::hierarchy::SkeletonHierarchy;
use crate::ids::{BoneId, IdAllocator, PropertyHandle, ReadOnlyHandle, ReadWriteHandle};
use crate::value::TransformValue;

#[derive(Clone, Debug)]
struct Slot {
    bone: BoneId,
    bind_pose: TransformValue,
    position: Vec3,
    scale: Vec3,
}

#[derive(Debug, Default)]
pub struct MemoryPoseStream {
    ids: IdAllocator,
    slots: Vec<Slot>,
    by_bone: HashMap<BoneId, ReadWriteHandle>,
    properties: Vec<f32>,
    property_names: HashMap<String, PropertyHandle>,
}

impl MemoryPoseStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot per bone of `h` that is reachable from `bones`, seeded with its local pose.
    pub fn from_hierarchy<H, I>(h: &H, bones: I) -> Self
    where
        H: SkeletonHierarchy + ?Sized,
        I: IntoIterator<Item = BoneId>,
    {
        let mut s = Self::new();
        for bone in bones {
            if let Some(v) = h.local_transform(bone) {
                s.insert_bone(bone, v);
            }
        }
        s
    }

    pub fn insert_bone(&mut self, bone: BoneId, pose: TransformValue) -> ReadWriteHandle {
        if let Some(h) = self.by_bone.get(&bone) {
            return *h;
        }
        let handle = self.ids.alloc_handle();
        self.slots.push(Slot {
            bone,
            bind_pose: pose,
            position: pose.position,
            scale: pose.scale,
        });
        self.by_bone.insert(bone, handle);
        handle
    }

    /// Define or update a float channel.
    pub fn set_property(&mut self, name: &str, value: f32) -> PropertyHandle {
        if let Some(h) = self.property_names.get(name) {
            self.properties[h.0 as usize] = value;
            return *h;
        }
        let h = self.ids.alloc_property();
        self.properties.push(value);
        self.property_names.insert(name.to_string(), h);
        h
    }

    pub fn property(&self, name: &str) -> Option<f32> {
        self.property_names
            .get(name)
            .map(|h| self.properties[h.0 as usize])
    }

    fn slot(&self, bone: BoneId) -> Option<&Slot> {
        self.by_bone.get(&bone).map(|h| &self.slots[h.0 as usize])
    }

    fn slot_mut(&mut self, bone: BoneId) -> Option<&mut Slot> {
        let h = *self.by_bone.get(&bone)?;
        self.slots.get_mut(h.0 as usize)
    }

    pub fn position(&self, bone: BoneId) -> Option<Vec3> {
        self.slot(bone).map(|s| s.position)
    }

    pub fn scale(&self, bone: BoneId) -> Option<Vec3> {
        self.slot(bone).map(|s| s.scale)
    }

    /// Simulate an upstream animation writing this frame's position.
    pub fn animate_position(&mut self, bone: BoneId, position: Vec3) {
        if let Some(s) = self.slot_mut(bone) {
            s.position = position;
        }
    }

    pub fn animate_scale(&mut self, bone: BoneId, scale: Vec3) {
        if let Some(s) = self.slot_mut(bone) {
            s.scale = scale;
        }
    }

    /// Reset every slot to its bind pose (start of a frame with no animation).
    pub fn reset_to_bind_pose(&mut self) {
        for s in &mut self.slots {
            s.position = s.bind_pose.position;
            s.scale = s.bind_pose.scale;
        }
    }

    /// Bones with a slot, in insertion order.
    pub fn bones(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.slots.iter().map(|s| s.bone)
    }
}

impl StreamBinder for MemoryPoseStream {
    fn bind_read_write(&mut self, bone: BoneId) -> Option<ReadWriteHandle> {
        self.by_bone.get(&bone).copied()
    }

    fn bind_read_only(&mut self, bone: BoneId) -> Option<ReadOnlyHandle> {
        self.by_bone.get(&bone).map(|h| h.read_only())
    }

    fn bind_property(&mut self, name: &str) -> Option<PropertyHandle> {
        self.property_names.get(name).copied()
    }

    fn bind_pose(&self, bone: BoneId) -> Option<TransformValue> {
        self.slot(bone).map(|s| s.bind_pose)
    }
}

impl PoseStream for MemoryPoseStream {
    fn read_position(&self, handle: ReadOnlyHandle) -> Vec3 {
        self.slots
            .get(handle.0 as usize)
            .map(|s| s.position)
            .unwrap_or(Vec3::ZERO)
    }

    fn read_scale(&self, handle: ReadOnlyHandle) -> Vec3 {
        self.slots
            .get(handle.0 as usize)
            .map(|s| s.scale)
            .unwrap_or(Vec3::ONE)
    }

    fn write_position(&mut self, handle: ReadWriteHandle, value: Vec3) {
        if let Some(s) = self.slots.get_mut(handle.0 as usize) {
            s.position = value;
        }
    }

    fn write_scale(&mut self, handle: ReadWriteHandle, value: Vec3) {
        if let Some(s) = self.slots.get_mut(handle.0 as usize) {
            s.scale = value;
        }
    }

    fn read_float(&self, handle: PropertyHandle) -> f32 {
        self.properties.get(handle.0 as usize).copied().unwrap_or(0.0)
    }
}
