//! Blend-tree orchestration: node storage, per-frame evaluation, bindings.
//!
//! The tree owns the node arena, the flat all-nodes list (insertion order,
//! which the persistence format uses for indexing), the exit node and the
//! binding table. Evaluation is recursive post-order from the exit node:
//! inputs always update before their dependents, which is what lets synced
//! clips read an already-advanced leader timer.

use crate::arena::Arena;
use crate::binding::{Binding, BindingTable};
use crate::clip::{ClipBank, PoseSampler, PoseSink};
use crate::config::Config;
use crate::error::Error;
use crate::ids::{ClipId, NodeId};
use crate::node::{BoundParameter, NodeVariant, TreeNode, DEFAULT_BLEND_WEIGHT};
use crate::pose::Pose;

#[derive(Debug)]
pub struct BlendTree {
    pub(crate) arena: Arena<TreeNode>,
    /// Every live node, in allocation order. Wire indices point into this
    /// list; it is not necessarily topological.
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) exit: Option<NodeId>,
    pub(crate) bindings: BindingTable,
    rest_pose: Pose,
}

impl Default for BlendTree {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl BlendTree {
    pub fn new(cfg: Config) -> Self {
        Self {
            arena: Arena::with_chunk_capacity(cfg.arena_first_chunk),
            nodes: Vec::with_capacity(cfg.expected_nodes),
            exit: None,
            bindings: BindingTable::with_capacity(cfg.expected_bindings),
            rest_pose: Pose::default(),
        }
    }

    /// Pose cloned into every new node's output; typically the skeleton's
    /// bind pose, fetched from the host once at setup.
    pub fn set_rest_pose(&mut self, pose: Pose) {
        self.rest_pose = pose;
    }

    pub fn rest_pose(&self) -> &Pose {
        &self.rest_pose
    }

    // == construction ==================================

    fn add_node(&mut self, variant: NodeVariant) -> NodeId {
        let id = self
            .arena
            .alloc(TreeNode::new(variant, self.rest_pose.clone()));
        self.nodes.push(id);
        id
    }

    pub fn add_clip_node(&mut self, clip: Option<ClipId>) -> NodeId {
        self.add_node(NodeVariant::Clip { clip })
    }

    pub fn add_synced_clip_node(
        &mut self,
        clip: Option<ClipId>,
        leader: Option<ClipId>,
    ) -> NodeId {
        self.add_node(NodeVariant::SyncClip { clip, leader })
    }

    pub fn add_blend_node(&mut self) -> NodeId {
        self.add_node(NodeVariant::Blend {
            weight: DEFAULT_BLEND_WEIGHT,
        })
    }

    pub fn add_blend1d_node(&mut self) -> NodeId {
        self.add_node(NodeVariant::Blend1D {
            weight: DEFAULT_BLEND_WEIGHT,
        })
    }

    /// Append `input` to `parent`'s input list. Returns `false` when either
    /// handle is not a live node. Arity is enforced at evaluation, not here.
    pub fn connect(&mut self, parent: NodeId, input: NodeId) -> bool {
        if self.arena.get(input).is_none() {
            return false;
        }
        match self.arena.get_mut(parent) {
            Some(node) => {
                node.inputs.push(input);
                true
            }
            None => false,
        }
    }

    /// Make `node` the tree's root; its output pose is the tree's result.
    pub fn set_exit(&mut self, node: NodeId) -> bool {
        if self.arena.get(node).is_none() {
            return false;
        }
        self.exit = Some(node);
        true
    }

    pub fn set_blend_weight(&mut self, node: NodeId, weight: f32) -> bool {
        match self.arena.get_mut(node).and_then(TreeNode::weight_mut) {
            Some(w) => {
                *w = weight;
                true
            }
            None => false,
        }
    }

    // == inspection ====================================

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(id)
    }

    pub fn exit(&self) -> Option<NodeId> {
        self.exit
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Position of `node` in the all-nodes list (the wire index).
    pub(crate) fn node_index(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    /// Output pose of the exit node, if the tree has one.
    pub fn pose(&self) -> Option<&Pose> {
        self.exit.and_then(|e| self.arena.get(e)).map(|n| &n.output)
    }

    /// Hand the exit pose to the bone-matrix collaborator; no-op on an
    /// empty tree.
    pub fn apply_to(&self, sink: &mut dyn PoseSink) {
        if let Some(pose) = self.pose() {
            sink.update_bone_matrices(pose);
        }
    }

    // == evaluation ====================================

    /// Evaluate one frame. Returns the exit node's finished flag (only
    /// meaningful when the exit chain ends in a non-looping clip); `false`
    /// on an empty tree.
    pub fn update(&mut self, dt: f32, clips: &mut ClipBank, sampler: &dyn PoseSampler) -> bool {
        match self.exit {
            Some(exit) => self.update_node(exit, dt, clips, sampler),
            None => false,
        }
    }

    fn update_node(
        &mut self,
        id: NodeId,
        dt: f32,
        clips: &mut ClipBank,
        sampler: &dyn PoseSampler,
    ) -> bool {
        let (variant, inputs) = match self.arena.get(id) {
            Some(node) => (node.variant, node.inputs.clone()),
            None => return false,
        };

        match variant {
            NodeVariant::Clip { clip } => {
                debug_assert!(inputs.is_empty(), "clip nodes take no inputs");
                self.play_clip(id, clip, dt, clips, sampler)
            }
            NodeVariant::SyncClip { clip, leader } => {
                debug_assert!(inputs.is_empty(), "synced clip nodes take no inputs");
                let Some(clip_id) = clip else { return false };
                // A missing leader degrades to plain clip playback.
                let Some(phase) = leader.and_then(|l| clips.get(l)).map(|l| l.phase()) else {
                    return self.play_clip(id, clip, dt, clips, sampler);
                };
                let Some(own) = clips.get_mut(clip_id) else {
                    return false;
                };
                // Lock phase, not absolute time: the leader's timer already
                // reflects this frame (inputs update before dependents).
                own.timer = own.duration * phase;
                let time = own.sample_time();
                if let Some(node) = self.arena.get_mut(id) {
                    sampler.sample_pose(clip_id, time, &mut node.output);
                }
                false
            }
            NodeVariant::Blend { weight } => {
                if inputs.len() != 2 {
                    return false;
                }
                for &input in &inputs {
                    self.update_node(input, dt, clips, sampler);
                }
                self.blend_outputs(id, inputs[0], inputs[1], weight);
                false
            }
            NodeVariant::Blend1D { weight } => {
                if inputs.len() != 3 {
                    return false;
                }
                for &input in &inputs {
                    self.update_node(input, dt, clips, sampler);
                }
                // (left, centre, right); weight 0 copies the centre pose
                // outright rather than running a degenerate blend.
                if weight > 0.0 {
                    self.blend_outputs(id, inputs[1], inputs[2], weight);
                } else if weight < 0.0 {
                    self.blend_outputs(id, inputs[1], inputs[0], -weight);
                } else {
                    self.copy_output(id, inputs[1]);
                }
                false
            }
        }
    }

    /// Advance and sample a plain clip into `id`'s output.
    fn play_clip(
        &mut self,
        id: NodeId,
        clip: Option<ClipId>,
        dt: f32,
        clips: &mut ClipBank,
        sampler: &dyn PoseSampler,
    ) -> bool {
        let Some(clip_id) = clip else { return false };
        let Some(clip) = clips.get_mut(clip_id) else {
            return false;
        };
        let finished = clip.advance(dt);
        let time = clip.sample_time();
        if let Some(node) = self.arena.get_mut(id) {
            sampler.sample_pose(clip_id, time, &mut node.output);
        }
        finished
    }

    fn blend_outputs(&mut self, dst: NodeId, a: NodeId, b: NodeId, t: f32) {
        let Some(mut out) = self
            .arena
            .get_mut(dst)
            .map(|n| std::mem::take(&mut n.output))
        else {
            return;
        };
        if let (Some(na), Some(nb)) = (self.arena.get(a), self.arena.get(b)) {
            out.blend_from(&na.output, &nb.output, t);
        }
        if let Some(node) = self.arena.get_mut(dst) {
            node.output = out;
        }
    }

    fn copy_output(&mut self, dst: NodeId, src: NodeId) {
        let Some(mut out) = self
            .arena
            .get_mut(dst)
            .map(|n| std::mem::take(&mut n.output))
        else {
            return;
        };
        if let Some(source) = self.arena.get(src) {
            out.copy_from(&source.output);
        }
        if let Some(node) = self.arena.get_mut(dst) {
            node.output = out;
        }
    }

    // == bindings ======================================

    /// Register `name` against the float parameter `node` exposes. Fails
    /// without changing state when the name is taken or the node has no
    /// bindable parameter (a clip node without a clip included).
    pub fn bind_value(&mut self, name: &str, node: NodeId) -> Result<(), Error> {
        if self.bindings.contains(name) {
            log::warn!("cannot bind {name:?}: the name is already bound");
            return Err(Error::BindingNameTaken {
                name: name.to_string(),
            });
        }
        let Some(parameter) = self.arena.get(node).and_then(TreeNode::bound_parameter) else {
            log::warn!("cannot bind {name:?}: node {node:?} has no bindable parameter");
            return Err(Error::NotBindable { node });
        };
        self.bindings
            .insert(name.to_string(), Binding { node, parameter });
        Ok(())
    }

    /// Write through a binding. Silent no-op returning `false` when the
    /// name is unbound or the target has gone away.
    pub fn set_value(&mut self, name: &str, value: f32, clips: &mut ClipBank) -> bool {
        let Some(&Binding { node, parameter }) = self.bindings.get(name) else {
            return false;
        };
        match parameter {
            BoundParameter::ClipTimer(clip) => match clips.get_mut(clip) {
                Some(clip) => {
                    clip.timer = value;
                    true
                }
                None => false,
            },
            BoundParameter::BlendWeight => {
                match self.arena.get_mut(node).and_then(TreeNode::weight_mut) {
                    Some(weight) => {
                        *weight = value;
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Read through a binding; zero when unbound.
    pub fn get_value(&self, name: &str, clips: &ClipBank) -> f32 {
        let Some(&Binding { node, parameter }) = self.bindings.get(name) else {
            return 0.0;
        };
        match parameter {
            BoundParameter::ClipTimer(clip) => clips.get(clip).map(|c| c.timer).unwrap_or(0.0),
            BoundParameter::BlendWeight => self
                .arena
                .get(node)
                .and_then(TreeNode::weight)
                .unwrap_or(0.0),
        }
    }

    // == lifecycle =====================================

    /// Destroy every node at once, clear the node list and binding table,
    /// and null the exit reference. Safe before first use and idempotent.
    pub fn cleanup(&mut self) {
        self.arena.cleanup();
        self.nodes.clear();
        self.bindings.clear();
        self.exit = None;
    }
}
