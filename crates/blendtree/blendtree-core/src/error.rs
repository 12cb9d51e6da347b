//! Error types for the blend-tree core.

use crate::ids::{ClipId, NodeId};

/// Comprehensive error type for binding and persistence operations.
///
/// Runtime evaluation never returns errors: a malformed node (wrong input
/// count, missing clip) skips its update and keeps its previous output.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The binding name is already registered
    #[error("binding name {name:?} is already taken")]
    BindingNameTaken { name: String },

    /// The node exposes no bindable float parameter
    #[error("node {node:?} has no bindable parameter")]
    NotBindable { node: NodeId },

    /// The stream was written by a different format revision
    #[error("format version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u8, expected: u8 },

    /// The stream ended before the layout was fully read
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// Unknown node type tag in the stream
    #[error("unknown node type tag {tag}")]
    UnknownNodeTag { tag: u8 },

    /// A node index in the stream is outside the node table
    #[error("node index {index} out of range (node count {count})")]
    NodeIndexOutOfRange { index: u8, count: u8 },

    /// A clip id does not resolve against the clip bank
    #[error("clip {clip:?} is not registered in the clip bank")]
    UnknownClip { clip: ClipId },

    /// A clip node has no clip attached at save time
    #[error("clip node {node:?} has no clip attached")]
    MissingClip { node: NodeId },

    /// A referenced node is not a member of the tree's node list
    #[error("node {node:?} is not a member of the tree")]
    DanglingNode { node: NodeId },

    /// A blend node carries the wrong number of inputs at save time
    #[error("node {node:?} has {found} inputs, expected {expected}")]
    BadArity {
        node: NodeId,
        expected: usize,
        found: usize,
    },

    /// The node table does not fit the one-byte wire counters
    #[error("tree has {count} nodes, the format stores at most 255")]
    TooManyNodes { count: usize },

    /// The binding table does not fit the one-byte wire counters
    #[error("tree has {count} bindings, the format stores at most 255")]
    TooManyBindings { count: usize },

    /// A binding name does not fit the one-byte length field
    #[error("binding name {name:?} exceeds 255 bytes")]
    NameTooLong { name: String },

    /// A binding name in the stream is not valid UTF-8
    #[error("binding name is not valid UTF-8")]
    MalformedName,

    /// Underlying I/O failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::BindingNameTaken { .. } | Self::NotBindable { .. } => "binding",
            Self::VersionMismatch { .. }
            | Self::UnexpectedEof
            | Self::UnknownNodeTag { .. }
            | Self::NodeIndexOutOfRange { .. }
            | Self::MalformedName => "decode",
            Self::UnknownClip { .. }
            | Self::MissingClip { .. }
            | Self::DanglingNode { .. }
            | Self::BadArity { .. }
            | Self::TooManyNodes { .. }
            | Self::TooManyBindings { .. }
            | Self::NameTooLong { .. } => "encode",
            Self::Io(_) => "io",
        }
    }
}
