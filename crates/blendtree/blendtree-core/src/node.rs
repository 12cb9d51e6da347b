//! Tree node variants.
//!
//! The variant set is closed and fully enumerated by the wire format, so
//! nodes are a tagged union rather than a trait object. Evaluation lives in
//! [`tree`](crate::tree), which owns the arena the nodes sit in.

use serde::{Deserialize, Serialize};

use crate::ids::{ClipId, NodeId};
use crate::pose::Pose;

/// Blend weight a node starts with before the host drives it.
pub const DEFAULT_BLEND_WEIGHT: f32 = 0.5;

/// Node kind as stored in the wire format. Tag 0 was the abstract base of
/// an earlier revision and is invalid on the wire.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Clip,
    SyncClip,
    Blend,
    Blend1D,
}

impl NodeKind {
    pub const fn tag(self) -> u8 {
        match self {
            NodeKind::Clip => 1,
            NodeKind::SyncClip => 2,
            NodeKind::Blend => 3,
            NodeKind::Blend1D => 4,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(NodeKind::Clip),
            2 => Some(NodeKind::SyncClip),
            3 => Some(NodeKind::Blend),
            4 => Some(NodeKind::Blend1D),
            _ => None,
        }
    }
}

/// Per-variant payload.
///
/// Clip variants reference clips owned by the host's clip bank. Blend
/// weights are conceptually [0,1] (2-way) or [-1,1] (3-way) but are not
/// clamped; graph authors keep them in range.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NodeVariant {
    /// Plays a clip. No inputs.
    Clip { clip: Option<ClipId> },
    /// Plays a clip phase-locked to a leader clip's progress. No inputs.
    SyncClip {
        clip: Option<ClipId>,
        leader: Option<ClipId>,
    },
    /// Linear blend of two inputs; 0 is fully input 0, 1 fully input 1.
    Blend { weight: f32 },
    /// Three inputs ordered (left, centre, right); negative weights blend
    /// centre toward left, positive toward right.
    Blend1D { weight: f32 },
}

/// Float parameter a node exposes for data-driven puppeting.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BoundParameter {
    /// The timer of the referenced clip.
    ClipTimer(ClipId),
    /// The node's own blend weight.
    BlendWeight,
}

/// One node of the blend tree. Inputs are handles into the same arena;
/// ownership of the node itself is the arena's.
#[derive(Clone, Debug)]
pub struct TreeNode {
    pub variant: NodeVariant,
    /// Pose computed by the last update. Starts at the tree's rest pose and
    /// keeps its previous value when an update is skipped.
    pub output: Pose,
    pub inputs: Vec<NodeId>,
}

impl TreeNode {
    pub fn new(variant: NodeVariant, output: Pose) -> Self {
        Self {
            variant,
            output,
            inputs: Vec::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.variant {
            NodeVariant::Clip { .. } => NodeKind::Clip,
            NodeVariant::SyncClip { .. } => NodeKind::SyncClip,
            NodeVariant::Blend { .. } => NodeKind::Blend,
            NodeVariant::Blend1D { .. } => NodeKind::Blend1D,
        }
    }

    /// Input count this variant needs before it evaluates.
    pub fn required_inputs(&self) -> usize {
        match self.variant {
            NodeVariant::Clip { .. } | NodeVariant::SyncClip { .. } => 0,
            NodeVariant::Blend { .. } => 2,
            NodeVariant::Blend1D { .. } => 3,
        }
    }

    /// The clip a clip-playing variant references, if any.
    pub fn clip(&self) -> Option<ClipId> {
        match self.variant {
            NodeVariant::Clip { clip } | NodeVariant::SyncClip { clip, .. } => clip,
            _ => None,
        }
    }

    pub fn weight(&self) -> Option<f32> {
        match self.variant {
            NodeVariant::Blend { weight } | NodeVariant::Blend1D { weight } => Some(weight),
            _ => None,
        }
    }

    pub fn weight_mut(&mut self) -> Option<&mut f32> {
        match &mut self.variant {
            NodeVariant::Blend { weight } | NodeVariant::Blend1D { weight } => Some(weight),
            _ => None,
        }
    }

    /// The float parameter this node exposes to the binding table: the clip
    /// timer for clip variants (only once a clip is attached), the blend
    /// weight for blend variants.
    pub fn bound_parameter(&self) -> Option<BoundParameter> {
        match self.variant {
            NodeVariant::Clip { clip } | NodeVariant::SyncClip { clip, .. } => {
                clip.map(BoundParameter::ClipTimer)
            }
            NodeVariant::Blend { .. } | NodeVariant::Blend1D { .. } => {
                Some(BoundParameter::BlendWeight)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// it should round-trip every kind through its wire tag
    #[test]
    fn kind_tags_roundtrip() {
        for kind in [
            NodeKind::Clip,
            NodeKind::SyncClip,
            NodeKind::Blend,
            NodeKind::Blend1D,
        ] {
            assert_eq!(NodeKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(NodeKind::from_tag(0), None);
        assert_eq!(NodeKind::from_tag(5), None);
    }

    /// it should classify bindable parameters per variant
    #[test]
    fn bound_parameter_classification() {
        let pose = Pose::default();
        let clipless = TreeNode::new(NodeVariant::Clip { clip: None }, pose.clone());
        assert_eq!(clipless.bound_parameter(), None);

        let clip = TreeNode::new(
            NodeVariant::Clip {
                clip: Some(ClipId(3)),
            },
            pose.clone(),
        );
        assert_eq!(
            clip.bound_parameter(),
            Some(BoundParameter::ClipTimer(ClipId(3)))
        );

        let blend = TreeNode::new(
            NodeVariant::Blend {
                weight: DEFAULT_BLEND_WEIGHT,
            },
            pose,
        );
        assert_eq!(blend.bound_parameter(), Some(BoundParameter::BlendWeight));
        assert_eq!(blend.required_inputs(), 2);
        assert_eq!(blend.weight(), Some(DEFAULT_BLEND_WEIGHT));
    }
}
