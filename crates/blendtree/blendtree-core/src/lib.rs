//! Blend-tree core (engine-agnostic)
//!
//! This crate evaluates a small directed tree of animation-blending
//! operations once per frame and produces a per-joint skeletal pose. It owns
//! the node graph (clip playback, synchronized clips, 2-way and 3-way linear
//! pose blending), the named-value binding mechanism that lets hosts drive
//! blend weights and timers, the region allocator backing every node, and the
//! tree's versioned binary persistence format.
//!
//! Keyframe sampling and bone-matrix updates stay on the host side, behind
//! the [`PoseSampler`] and [`PoseSink`] traits.

pub mod arena;
pub mod binding;
pub mod clip;
pub mod codec;
pub mod config;
pub mod error;
pub mod ids;
pub mod node;
pub mod pose;
pub mod tree;

// Re-exports for consumers (hosts/editors)
pub use arena::Arena;
pub use binding::{Binding, BindingTable};
pub use clip::{Clip, ClipBank, PoseSampler, PoseSink};
pub use codec::{check_version, write_version, FORMAT_VERSION};
pub use config::Config;
pub use error::Error;
pub use ids::{ClipId, NodeId};
pub use node::{BoundParameter, NodeKind, NodeVariant, TreeNode};
pub use pose::{JointTransform, Pose};
pub use tree::BlendTree;
