//! Identifiers for skeleton nodes and the per-frame stream handles bound to them.

use serde::{Deserialize, Serialize};

/// Opaque reference to a node in a host skeleton hierarchy.
///
/// The core never owns the node; it only compares ids and asks the host to
/// read or write the node's local pose.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoneId(pub u32);

impl BoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stream handle that may only be read from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ReadOnlyHandle(pub u32);

/// Stream handle that may be read and written.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ReadWriteHandle(pub u32);

impl ReadWriteHandle {
    /// View of the same slot through the read-only flavor.
    #[inline]
    pub fn read_only(self) -> ReadOnlyHandle {
        ReadOnlyHandle(self.0)
    }
}

/// Handle to a named float channel in the stream (weights).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PropertyHandle(pub u32);

/// Monotonic allocator for bone ids and stream handles.
#[derive(Clone, Default, Debug)]
pub struct IdAllocator {
    next_bone: u32,
    next_handle: u32,
    next_property: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_bone(&mut self) -> BoneId {
        let id = BoneId(self.next_bone);
        self.next_bone = self.next_bone.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_handle(&mut self) -> ReadWriteHandle {
        let id = ReadWriteHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_property(&mut self) -> PropertyHandle {
        let id = PropertyHandle(self.next_property);
        self.next_property = self.next_property.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
