//! Bone matching between two structurally identical hierarchies.
//!
//! Bones are paired by their name path below the respective roots; geometry
//! is never consulted. Bones missing on either side are left out.

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::hierarchy::{descendants, path_segments, SkeletonHierarchy};
use crate::ids::BoneId;

fn has_prefix(segs: &[&str], prefix: &[&str]) -> bool {
    segs.len() >= prefix.len() && segs[..prefix.len()] == *prefix
}

/// Pair every bone under `target_root` with the source bone at the same
/// relative path, restricted to the subtree that `source_bone` occupies
/// under `source_root`.
///
/// The result maps target → source in source traversal order. An empty map
/// is returned when `source_bone` is not under `source_root`.
pub fn match_by_relative_path<H: SkeletonHierarchy + ?Sized>(
    h: &H,
    source_root: BoneId,
    source_bone: BoneId,
    target_root: BoneId,
    separator: char,
) -> IndexMap<BoneId, BoneId> {
    let mut out = IndexMap::new();
    let Some(prefix) = path_segments(h, source_bone, source_root) else {
        log::debug!(
            "source bone {:?} is not under source root {:?}",
            source_bone,
            source_root
        );
        return out;
    };

    let mut sep = [0u8; 4];
    let sep: &str = separator.encode_utf8(&mut sep);

    let mut targets: HashMap<String, BoneId> = HashMap::new();
    for bone in descendants(h, target_root) {
        if let Some(segs) = path_segments(h, bone, target_root) {
            if has_prefix(&segs, &prefix) {
                // First bone wins for duplicate sibling names.
                targets.entry(segs.join(sep)).or_insert(bone);
            }
        }
    }

    for bone in descendants(h, source_root) {
        let Some(segs) = path_segments(h, bone, source_root) else {
            continue;
        };
        if !has_prefix(&segs, &prefix) {
            continue;
        }
        if let Some(target) = targets.get(&segs.join(sep)) {
            out.entry(*target).or_insert(bone);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Skeleton;
    use crate::value::TransformValue;

    fn limb(s: &mut Skeleton, root_name: &str, with_tail: bool) -> BoneId {
        let root = s.add_root(root_name);
        s.mark_skeleton_root(root);
        let hips = s.add_child(root, "Hips", TransformValue::IDENTITY);
        let spine = s.add_child(hips, "Spine", TransformValue::IDENTITY);
        s.add_child(spine, "Neck", TransformValue::IDENTITY);
        s.add_child(hips, "Spine2", TransformValue::IDENTITY);
        if with_tail {
            s.add_child(hips, "Tail", TransformValue::IDENTITY);
        }
        root
    }

    #[test]
    fn matches_under_different_root_names() {
        let mut s = Skeleton::new();
        let src = limb(&mut s, "Source", true);
        let dst = limb(&mut s, "Target", false);
        let map = match_by_relative_path(&s, src, src, dst, '/');
        // root, Hips, Spine, Neck, Spine2 (Tail has no counterpart)
        assert_eq!(map.len(), 5);
        for (t, src_bone) in map.iter().skip(1) {
            assert_eq!(s.name(*t), s.name(*src_bone));
        }
        assert_eq!(map.get(&dst), Some(&src));
    }

    #[test]
    fn prefix_is_segment_wise() {
        let mut s = Skeleton::new();
        let src = limb(&mut s, "Source", false);
        let dst = limb(&mut s, "Target", false);
        let spine = s.find_path(src, "Hips/Spine").unwrap();
        let map = match_by_relative_path(&s, src, spine, dst, '/');
        let names: Vec<_> = map.keys().map(|b| s.name(*b).unwrap()).collect();
        assert_eq!(names, vec!["Spine", "Neck"]);
    }

    #[test]
    fn unrelated_bone_of_interest_yields_nothing() {
        let mut s = Skeleton::new();
        let src = limb(&mut s, "Source", false);
        let dst = limb(&mut s, "Target", false);
        assert!(match_by_relative_path(&s, src, dst, dst, '/').is_empty());
    }
}
