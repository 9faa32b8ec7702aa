use glam::Vec3;
use vizij_pose_override_core::{
    BlendEvaluator, BlendMode, BoneId, Config, InvalidSetReason, MemoryPoseStream, OverrideEntry,
    OverrideError, OverrideRig, OverrideSet, Skeleton, SkeletonDesc, TransformValue,
};

fn approx3(a: Vec3, b: Vec3, eps: f32) {
    assert!(a.abs_diff_eq(b, eps), "left={a} right={b} eps={eps}");
}

const BIND_POS: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const TARGET_POS: Vec3 = Vec3::new(0.0, 2.0, 0.0);

fn single_bone_stream() -> (MemoryPoseStream, OverrideSet) {
    let mut stream = MemoryPoseStream::new();
    stream.insert_bone(BoneId(0), TransformValue::from_position(BIND_POS));
    let (set, rest) = OverrideSet::fill([OverrideEntry::new(
        BoneId(0),
        TARGET_POS,
        Vec3::splat(2.0),
    )]);
    assert!(rest.is_empty());
    (stream, set)
}

#[test]
fn absolute_weight_boundaries() {
    let (mut stream, set) = single_bone_stream();
    stream.set_property("weight", 0.0);
    let mut bound = BlendEvaluator::new(BlendMode::Absolute)
        .bind(&set, &mut stream)
        .unwrap();

    bound.evaluate(&mut stream);
    assert_eq!(stream.position(BoneId(0)), Some(BIND_POS));
    assert_eq!(stream.scale(BoneId(0)), Some(Vec3::ONE));

    stream.set_property("weight", 1.0);
    bound.evaluate(&mut stream);
    assert_eq!(stream.position(BoneId(0)), Some(TARGET_POS));
    assert_eq!(stream.scale(BoneId(0)), Some(Vec3::splat(2.0)));

    stream.set_property("weight", 0.5);
    bound.evaluate(&mut stream);
    approx3(stream.position(BoneId(0)).unwrap(), Vec3::new(0.0, 1.5, 0.0), 1e-6);
}

#[test]
fn absolute_ignores_incoming_animation() {
    let (mut stream, set) = single_bone_stream();
    stream.set_property("weight", 1.0);
    let mut bound = BlendEvaluator::new(BlendMode::Absolute)
        .bind(&set, &mut stream)
        .unwrap();
    stream.animate_position(BoneId(0), Vec3::new(5.0, 5.0, 5.0));
    bound.evaluate(&mut stream);
    assert_eq!(stream.position(BoneId(0)), Some(TARGET_POS));
}

#[test]
fn offset_rides_on_animation() {
    let (mut stream, set) = single_bone_stream();
    stream.set_property("weight", 0.0);
    let mut bound = BlendEvaluator::new(BlendMode::OffsetAdditive)
        .bind(&set, &mut stream)
        .unwrap();

    let animated = Vec3::new(3.0, 4.0, 0.0);
    stream.animate_position(BoneId(0), animated);
    bound.evaluate(&mut stream);
    assert_eq!(stream.position(BoneId(0)), Some(animated));

    // The delta is `TARGET_POS - BIND_POS` = +1 on y.
    stream.set_property("weight", 1.0);
    stream.animate_position(BoneId(0), animated);
    bound.evaluate(&mut stream);
    approx3(stream.position(BoneId(0)).unwrap(), animated + Vec3::Y, 1e-6);

    // Scale stays absolute.
    assert_eq!(stream.scale(BoneId(0)), Some(Vec3::splat(2.0)));
}

#[test]
fn weights_are_clamped() {
    let (mut stream, set) = single_bone_stream();
    stream.set_property("weight", 7.0);
    let mut bound = BlendEvaluator::default().bind(&set, &mut stream).unwrap();
    bound.evaluate(&mut stream);
    assert_eq!(stream.position(BoneId(0)), Some(TARGET_POS));

    stream.set_property("weight", -3.0);
    bound.evaluate(&mut stream);
    assert_eq!(stream.position(BoneId(0)), Some(BIND_POS));
}

#[test]
fn entry_and_global_weights_multiply() {
    let mut stream = MemoryPoseStream::new();
    stream.insert_bone(BoneId(0), TransformValue::IDENTITY);
    stream.insert_bone(BoneId(1), TransformValue::IDENTITY);
    let (set, _) = OverrideSet::fill([
        OverrideEntry::new(BoneId(0), Vec3::X, Vec3::ONE),
        OverrideEntry::new(BoneId(1), Vec3::X, Vec3::ONE),
    ]);
    let cfg = Config::default();
    stream.set_property(&cfg.weight_property, 0.5);
    stream.set_property(&cfg.entry_weight_property(1), 0.5);

    let mut bound = BlendEvaluator::from_config(&cfg)
        .bind(&set, &mut stream)
        .unwrap();
    assert_eq!(bound.fixed_weight(0), Some(1.0));
    assert_eq!(bound.fixed_weight(1), None);
    bound.evaluate(&mut stream);

    approx3(stream.position(BoneId(0)).unwrap(), Vec3::X * 0.5, 1e-6);
    approx3(stream.position(BoneId(1)).unwrap(), Vec3::X * 0.25, 1e-6);
}

#[test]
fn stored_weights_apply_without_channels() {
    let desc: SkeletonDesc = vizij_test_fixtures::skeletons::load("humanoid").unwrap();
    let skeleton = Skeleton::from_desc(&desc);
    let rig: OverrideRig = vizij_test_fixtures::override_sets::load("humanoid-pose").unwrap();
    let mut stream = MemoryPoseStream::from_hierarchy(&skeleton, skeleton.bones());

    let head = skeleton.find("Head").unwrap();
    let hand = skeleton.find("L_Hand").unwrap();
    let mut bound = BlendEvaluator::default()
        .bind(&rig.primary, &mut stream)
        .unwrap();
    bound.evaluate(&mut stream);

    // Head: 0.25 -> 0.5 at 0.75; hand scale: 1 -> 1.5 at 0.75 * 0.5.
    approx3(
        stream.position(head).unwrap(),
        Vec3::new(0.0, 0.25 + 0.25 * 0.75, 0.0),
        1e-6,
    );
    approx3(
        stream.scale(hand).unwrap(),
        Vec3::splat(1.0 + 0.5 * 0.375),
        1e-6,
    );
}

#[test]
fn bind_rejects_invalid_sets() {
    let desc: SkeletonDesc = vizij_test_fixtures::skeletons::load("humanoid").unwrap();
    let skeleton = Skeleton::from_desc(&desc);
    let mut stream = MemoryPoseStream::from_hierarchy(&skeleton, skeleton.bones());

    let rig: OverrideRig = vizij_test_fixtures::override_sets::load("duplicate-target").unwrap();
    let err = BlendEvaluator::default()
        .bind(&rig.primary, &mut stream)
        .unwrap_err();
    assert!(matches!(
        err,
        OverrideError::InvalidOverrideSet(InvalidSetReason::DuplicateTarget { .. })
    ));

    let (unknown, _) =
        OverrideSet::fill([OverrideEntry::new(BoneId(999), Vec3::ZERO, Vec3::ONE)]);
    let err = BlendEvaluator::default()
        .bind(&unknown, &mut stream)
        .unwrap_err();
    assert!(matches!(
        err,
        OverrideError::InvalidOverrideSet(InvalidSetReason::UnresolvedBone { index: 0, .. })
    ));

    let json = r#"{ "weight": 1.0, "entries": [
        { "target": 1, "position": [0, 0, 0], "scale": [1, 1, 1] },
        { "target": 2, "position": [0, 0, 0], "scale": [1, 1, 1] },
        { "target": 3, "position": [0, 0, 0], "scale": [1, 1, 1] },
        { "target": 4, "position": [0, 0, 0], "scale": [1, 1, 1] },
        { "target": 5, "position": [0, 0, 0], "scale": [1, 1, 1] },
        { "target": 6, "position": [0, 0, 0], "scale": [1, 1, 1] },
        { "target": 7, "position": [0, 0, 0], "scale": [1, 1, 1] },
        { "target": 8, "position": [0, 0, 0], "scale": [1, 1, 1] },
        { "target": 9, "position": [0, 0, 0], "scale": [1, 1, 1] }
    ] }"#;
    let oversized: OverrideSet = serde_json::from_str(json).unwrap();
    let err = BlendEvaluator::default()
        .bind(&oversized, &mut stream)
        .unwrap_err();
    assert!(matches!(
        err,
        OverrideError::InvalidOverrideSet(InvalidSetReason::TooManyEntries { count: 9, max: 8 })
    ));
}

#[test]
fn rebind_after_bone_list_changes() {
    let mut stream = MemoryPoseStream::new();
    for i in 0..3 {
        stream.insert_bone(BoneId(i), TransformValue::IDENTITY);
    }
    let evaluator = BlendEvaluator::default();
    let (mut set, _) = OverrideSet::fill([OverrideEntry::new(BoneId(0), Vec3::X, Vec3::ONE)]);
    let bound = evaluator.bind(&set, &mut stream).unwrap();
    assert!(!bound.needs_rebind(&set));

    set.push(OverrideEntry::new(BoneId(2), Vec3::Y, Vec3::ONE))
        .unwrap();
    assert!(bound.needs_rebind(&set));
    let mut bound = evaluator.rebind(bound, &set, &mut stream).unwrap();
    assert_eq!(bound.targets(), &[BoneId(0), BoneId(2)]);

    bound.evaluate(&mut stream);
    assert_eq!(stream.position(BoneId(2)), Some(Vec3::Y));
    assert_eq!(stream.position(BoneId(1)), Some(Vec3::ZERO));
    evaluator.unbind(bound);
}

#[test]
fn runtime_binds_every_unit() {
    let mut stream = MemoryPoseStream::new();
    for i in 0..20 {
        stream.insert_bone(BoneId(i), TransformValue::IDENTITY);
    }
    let mut rig = OverrideRig::new();
    let mut sets = vizij_pose_override_core::OverflowSplitter::split(
        (0..20)
            .map(|i| OverrideEntry::new(BoneId(i), Vec3::Z, Vec3::ONE))
            .collect(),
    )
    .into_iter();
    rig.primary = sets.next().unwrap();
    rig.siblings.extend(sets);

    let ed = vizij_pose_override_core::OverrideEditor::with_rig(BoneId(0), Config::default(), rig);
    let mut bound = ed.bind_runtime(&mut stream).unwrap();
    assert_eq!(bound.len(), 3);
    for b in &mut bound {
        b.evaluate(&mut stream);
    }
    assert!((0..20).all(|i| stream.position(BoneId(i)) == Some(Vec3::Z)));
}

fn split_rig(n: u32, target: Vec3) -> (MemoryPoseStream, OverrideRig) {
    let mut stream = MemoryPoseStream::new();
    for i in 0..n {
        stream.insert_bone(BoneId(i), TransformValue::IDENTITY);
    }
    let mut sets = vizij_pose_override_core::OverflowSplitter::split(
        (0..n)
            .map(|i| OverrideEntry::new(BoneId(i), target, Vec3::ONE))
            .collect(),
    )
    .into_iter();
    let mut rig = OverrideRig::new();
    rig.primary = sets.next().unwrap();
    rig.siblings.extend(sets);
    (stream, rig)
}

fn evaluate_all(bound: &mut [vizij_pose_override_core::BoundEvaluator], stream: &mut MemoryPoseStream) {
    for b in bound.iter_mut() {
        b.evaluate(stream);
    }
}

/// it should drive entry weights of sibling units through their own channels
#[test]
fn sibling_entry_weights_are_independent() {
    let (mut stream, rig) = split_rig(9, Vec3::X);
    let cfg = Config::default();
    stream.set_property(&cfg.entry_weight_property(0), 0.0);

    let ed = vizij_pose_override_core::OverrideEditor::with_rig(BoneId(0), cfg.clone(), rig);
    let mut bound = ed.bind_runtime(&mut stream).unwrap();
    assert_eq!(bound.iter().map(|b| b.unit()).collect::<Vec<_>>(), vec![0, 1]);
    evaluate_all(&mut bound, &mut stream);
    assert_eq!(stream.position(BoneId(0)), Some(Vec3::ZERO));
    assert_eq!(stream.position(BoneId(8)), Some(Vec3::X));

    stream.set_property(&cfg.unit_entry_weight_property(1, 0), 0.5);
    let mut bound = ed.bind_runtime(&mut stream).unwrap();
    evaluate_all(&mut bound, &mut stream);
    approx3(stream.position(BoneId(8)).unwrap(), Vec3::X * 0.5, 1e-6);
    assert_eq!(stream.position(BoneId(0)), Some(Vec3::ZERO));
    assert_eq!(stream.position(BoneId(1)), Some(Vec3::X));
}

/// it should give each sibling unit its own global weight channel
#[test]
fn sibling_global_weight_is_independent() {
    let (mut stream, rig) = split_rig(9, Vec3::Y);
    let cfg = Config::default();
    stream.set_property(&cfg.weight_property, 1.0);
    stream.set_property(&cfg.unit_weight_property(1), 0.0);

    let mut bound = BlendEvaluator::from_config(&cfg)
        .bind_rig(&rig, &mut stream)
        .unwrap();
    evaluate_all(&mut bound, &mut stream);
    assert!((0..8).all(|i| stream.position(BoneId(i)) == Some(Vec3::Y)));
    assert_eq!(stream.position(BoneId(8)), Some(Vec3::ZERO));
}

/// it should keep a sibling's stored weight when only the primary channel is driven
#[test]
fn sibling_stored_weight_survives_primary_channel() {
    let (mut stream, mut rig) = split_rig(9, Vec3::Z);
    rig.siblings[0].set_weight(0.5);
    stream.set_property("weight", 1.0);

    let mut bound = BlendEvaluator::default()
        .bind_rig(&rig, &mut stream)
        .unwrap();
    evaluate_all(&mut bound, &mut stream);
    assert_eq!(stream.position(BoneId(0)), Some(Vec3::Z));
    approx3(stream.position(BoneId(8)).unwrap(), Vec3::Z * 0.5, 1e-6);
}

/// it should refuse a rig that targets the same bone from two units
#[test]
fn bind_rig_rejects_bone_shared_across_units() {
    let (mut stream, mut rig) = split_rig(9, Vec3::X);
    rig.siblings[0]
        .push(OverrideEntry::new(BoneId(3), Vec3::Y, Vec3::ONE))
        .unwrap();
    let err = BlendEvaluator::default()
        .bind_rig(&rig, &mut stream)
        .unwrap_err();
    assert!(matches!(
        err,
        OverrideError::InvalidOverrideSet(InvalidSetReason::DuplicateTarget { bone: BoneId(3) })
    ));
}

/// it should rebind a sibling evaluator on that sibling's channels
#[test]
fn rebind_keeps_unit_channels() {
    let (mut stream, rig) = split_rig(9, Vec3::X);
    let cfg = Config::default();
    stream.set_property(&cfg.unit_weight_property(1), 0.25);
    let evaluator = BlendEvaluator::from_config(&cfg);
    let bound = evaluator.bind_unit(&rig.siblings[0], 1, &mut stream).unwrap();

    let mut bound = evaluator
        .rebind(bound, &rig.siblings[0], &mut stream)
        .unwrap();
    assert_eq!(bound.unit(), 1);
    bound.evaluate(&mut stream);
    approx3(stream.position(BoneId(8)).unwrap(), Vec3::X * 0.25, 1e-6);
}
