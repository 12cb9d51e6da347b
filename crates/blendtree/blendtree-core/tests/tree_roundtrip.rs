//! End-to-end tests: build a tree through the public API, run it, persist
//! it, reload it, and check the reloaded tree behaves like the original.

use std::io::Cursor;

use blendtree_core::{
    check_version, write_version, BlendTree, Clip, ClipBank, ClipId, Error, JointTransform,
    NodeKind, Pose, PoseSampler, PoseSink,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// Stamps `translation = [clip id, sample time, 0]` into every joint so
/// assertions can see exactly what was sampled and how it was blended.
struct StampSampler {
    joints: usize,
}

impl PoseSampler for StampSampler {
    fn sample_pose(&self, clip: ClipId, time: f32, out: &mut Pose) {
        out.joints.clear();
        out.joints.resize(self.joints, JointTransform::IDENTITY);
        for joint in &mut out.joints {
            joint.translation = [f32::from(clip.0), time, 0.0];
        }
    }
}

struct CapturingSink {
    last: Option<Pose>,
}

impl PoseSink for CapturingSink {
    fn update_bone_matrices(&mut self, pose: &Pose) {
        self.last = Some(pose.clone());
    }
}

fn locomotion_bank() -> ClipBank {
    let mut clips = ClipBank::new();
    clips.add(Clip::new("idle", 2.0));
    clips.add(Clip::new("walk", 1.0));
    clips.add(Clip::new("run", 0.6));
    clips
}

/// Three clip leaves feeding a 3-way gait blend, blended against idle at
/// the top. Returns (tree, gait node, top node).
fn locomotion_tree(tree: &mut BlendTree) -> (blendtree_core::NodeId, blendtree_core::NodeId) {
    let idle = tree.add_clip_node(Some(ClipId(0)));
    let walk = tree.add_clip_node(Some(ClipId(1)));
    let run = tree.add_clip_node(Some(ClipId(2)));
    let gait = tree.add_blend1d_node();
    tree.connect(gait, idle);
    tree.connect(gait, walk);
    tree.connect(gait, run);
    let top = tree.add_blend_node();
    tree.connect(top, idle);
    tree.connect(top, gait);
    tree.set_exit(top);
    tree.bind_value("gait", gait).unwrap();
    tree.bind_value("alertness", top).unwrap();
    (gait, top)
}

/// it should survive a save/reload cycle with structure and behavior intact
#[test]
fn save_reload_preserves_structure_and_behavior() {
    let mut clips = locomotion_bank();
    let sampler = StampSampler { joints: 4 };

    let mut tree = BlendTree::default();
    tree.set_rest_pose(Pose::with_joint_count(4));
    locomotion_tree(&mut tree);
    tree.set_value("gait", 0.5, &mut clips);
    tree.set_value("alertness", 1.0, &mut clips);

    let mut buf = Vec::new();
    write_version(&mut buf).unwrap();
    tree.write(&mut buf).unwrap();

    let mut cursor = Cursor::new(&buf);
    check_version(&mut cursor).unwrap();
    let mut loaded = BlendTree::default();
    loaded.set_rest_pose(Pose::with_joint_count(4));
    loaded.read(&mut cursor, &clips).unwrap();

    // Same shape: five nodes, blend exit, same leaf clips, same weights.
    assert_eq!(loaded.node_count(), tree.node_count());
    let exit = loaded.exit().unwrap();
    assert_eq!(loaded.node(exit).unwrap().kind(), NodeKind::Blend);
    approx(loaded.node(exit).unwrap().weight().unwrap(), 1.0, 1e-6);
    let leaf_clips: Vec<_> = loaded
        .nodes()
        .iter()
        .filter_map(|&n| loaded.node(n).unwrap().clip())
        .collect();
    assert_eq!(leaf_clips, vec![ClipId(0), ClipId(1), ClipId(2)]);
    assert_eq!(loaded.bindings().len(), 2);

    // Same behavior: run both trees one frame from identical clip state and
    // compare output poses.
    let mut clips_a = locomotion_bank();
    let mut clips_b = locomotion_bank();
    tree.update(0.25, &mut clips_a, &sampler);
    loaded.update(0.25, &mut clips_b, &sampler);
    assert_eq!(tree.pose(), loaded.pose());
    approx(clips_b.get(ClipId(1)).unwrap().timer, 0.25, 1e-6);
}

/// it should drive a reloaded tree through its persisted bindings
#[test]
fn bindings_survive_reload() {
    let mut clips = locomotion_bank();
    let mut tree = BlendTree::default();
    tree.set_rest_pose(Pose::with_joint_count(1));
    locomotion_tree(&mut tree);

    let mut buf = Vec::new();
    tree.write(&mut buf).unwrap();
    let mut loaded = BlendTree::default();
    loaded.set_rest_pose(Pose::with_joint_count(1));
    loaded.read(&mut Cursor::new(&buf), &clips).unwrap();

    assert!(loaded.set_value("gait", -1.0, &mut clips));
    approx(loaded.get_value("gait", &clips), -1.0, 1e-6);

    // alertness 0 -> exit reproduces idle exactly; gait is ignored.
    assert!(loaded.set_value("alertness", 0.0, &mut clips));
    let sampler = StampSampler { joints: 1 };
    loaded.update(0.5, &mut clips, &sampler);
    let pose = loaded.pose().unwrap();
    approx(pose.joints[0].translation[0], 0.0, 1e-6);
    approx(pose.joints[0].translation[1], 0.5, 1e-6);
}

/// it should phase-lock synced clips after a round trip
#[test]
fn synced_clip_roundtrip() {
    let mut clips = ClipBank::new();
    let stride = clips.add(Clip::new("stride", 2.0));
    let sway = clips.add(Clip::new("sway", 4.0));

    let mut tree = BlendTree::default();
    tree.set_rest_pose(Pose::with_joint_count(1));
    let lead = tree.add_clip_node(Some(stride));
    let follow = tree.add_synced_clip_node(Some(sway), Some(stride));
    let blend = tree.add_blend_node();
    tree.connect(blend, lead);
    tree.connect(blend, follow);
    tree.set_exit(blend);

    let mut buf = Vec::new();
    tree.write(&mut buf).unwrap();
    let mut loaded = BlendTree::default();
    loaded.set_rest_pose(Pose::with_joint_count(1));
    loaded.read(&mut Cursor::new(&buf), &clips).unwrap();

    let sampler = StampSampler { joints: 1 };
    loaded.update(0.5, &mut clips, &sampler);
    // Leader at 0.5/2.0 = quarter phase; follower sits at a quarter of 4.0.
    approx(clips.get(stride).unwrap().timer, 0.5, 1e-6);
    approx(clips.get(sway).unwrap().timer, 1.0, 1e-6);
}

/// it should reject a stream whose bindings collide with live ones
#[test]
fn reload_into_bound_tree_reports_collision() {
    let clips = locomotion_bank();
    let mut tree = BlendTree::default();
    locomotion_tree(&mut tree);
    let mut buf = Vec::new();
    tree.write(&mut buf).unwrap();

    // The destination already uses one of the persisted names.
    let mut loaded = BlendTree::default();
    let blend = loaded.add_blend_node();
    loaded.bind_value("gait", blend).unwrap();
    let err = loaded.read(&mut Cursor::new(&buf), &clips).unwrap_err();
    assert!(matches!(err, Error::BindingNameTaken { name } if name == "gait"));
}

/// it should feed the exit pose to the skinning sink each frame
#[test]
fn sink_receives_frames() {
    let mut clips = locomotion_bank();
    let mut tree = BlendTree::default();
    tree.set_rest_pose(Pose::with_joint_count(2));
    locomotion_tree(&mut tree);

    let sampler = StampSampler { joints: 2 };
    let mut sink = CapturingSink { last: None };
    tree.update(0.1, &mut clips, &sampler);
    tree.apply_to(&mut sink);
    assert_eq!(sink.last.as_ref(), tree.pose());
    assert_eq!(sink.last.unwrap().joint_count(), 2);
}

/// it should rebuild cleanly after cleanup and load into the same tree
#[test]
fn cleanup_then_reload() {
    let clips = locomotion_bank();
    let mut tree = BlendTree::default();
    locomotion_tree(&mut tree);
    let mut buf = Vec::new();
    tree.write(&mut buf).unwrap();

    tree.cleanup();
    assert_eq!(tree.node_count(), 0);
    tree.read(&mut Cursor::new(&buf), &clips).unwrap();
    assert_eq!(tree.node_count(), 5);
    assert!(tree.exit().is_some());
    assert_eq!(tree.bindings().len(), 2);
}
