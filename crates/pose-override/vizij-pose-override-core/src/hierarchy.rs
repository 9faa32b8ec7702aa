//! Host skeleton interface and traversal helpers.
//!
//! Adapters (Bevy, the in-memory [`crate::Skeleton`]) implement
//! [`SkeletonHierarchy`]; everything in the editor workflow goes through it.

use crate::error::{OverrideError, Result};
use crate::ids::BoneId;
use crate::value::TransformValue;
use glam::Vec3;

/// A transform hierarchy whose nodes expose a mutable local pose.
pub trait SkeletonHierarchy {
    fn contains(&self, bone: BoneId) -> bool;
    fn name(&self, bone: BoneId) -> Option<&str>;
    fn parent(&self, bone: BoneId) -> Option<BoneId>;
    /// Children in stable order; empty for leaves and unknown bones.
    fn children(&self, bone: BoneId) -> &[BoneId];
    /// Whether this node carries the skeleton-root marker (the animator).
    fn is_skeleton_root(&self, bone: BoneId) -> bool;

    fn local_transform(&self, bone: BoneId) -> Option<TransformValue>;
    fn set_local_transform(&mut self, bone: BoneId, value: TransformValue);

    fn set_local_position(&mut self, bone: BoneId, position: Vec3) {
        if let Some(mut v) = self.local_transform(bone) {
            v.position = position;
            self.set_local_transform(bone, v);
        }
    }

    fn set_local_scale(&mut self, bone: BoneId, scale: Vec3) {
        if let Some(mut v) = self.local_transform(bone) {
            v.scale = scale;
            self.set_local_transform(bone, v);
        }
    }
}

/// Topmost ancestor (or the bone itself) carrying the skeleton-root marker.
pub fn find_skeleton_root<H: SkeletonHierarchy + ?Sized>(h: &H, bone: BoneId) -> Option<BoneId> {
    if !h.contains(bone) {
        return None;
    }
    let mut found = None;
    let mut cur = Some(bone);
    while let Some(b) = cur {
        if h.is_skeleton_root(b) {
            found = Some(b);
        }
        cur = h.parent(b);
    }
    found
}

/// Pre-order traversal of `root` and all its descendants.
pub fn descendants<H: SkeletonHierarchy + ?Sized>(h: &H, root: BoneId) -> Vec<BoneId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(b) = stack.pop() {
        out.push(b);
        // Reverse so the first child is visited first.
        stack.extend(h.children(b).iter().rev().copied());
    }
    out
}

/// Every bone of the skeleton that `any_bone` belongs to, in hierarchy
/// traversal order starting at the skeleton root.
pub fn all_bones<H: SkeletonHierarchy + ?Sized>(h: &H, any_bone: BoneId) -> Result<Vec<BoneId>> {
    match find_skeleton_root(h, any_bone) {
        Some(root) => Ok(descendants(h, root)),
        None => {
            log::warn!("no skeleton root found above bone {:?}", any_bone);
            Err(OverrideError::NoSkeletonRoot { bone: any_bone })
        }
    }
}

/// Names from just below `ancestor` down to `bone`.
///
/// Empty when `bone == ancestor`; `None` when `bone` is not under `ancestor`.
pub fn path_segments<'h, H: SkeletonHierarchy + ?Sized>(
    h: &'h H,
    bone: BoneId,
    ancestor: BoneId,
) -> Option<Vec<&'h str>> {
    let mut names = Vec::new();
    let mut cur = bone;
    while cur != ancestor {
        names.push(h.name(cur)?);
        cur = h.parent(cur)?;
    }
    names.reverse();
    Some(names)
}

/// [`path_segments`] joined with `separator`.
pub fn relative_path<H: SkeletonHierarchy + ?Sized>(
    h: &H,
    bone: BoneId,
    ancestor: BoneId,
    separator: char,
) -> Option<String> {
    let segs = path_segments(h, bone, ancestor)?;
    let mut buf = String::new();
    for (i, s) in segs.iter().enumerate() {
        if i > 0 {
            buf.push(separator);
        }
        buf.push_str(s);
    }
    Some(buf)
}
