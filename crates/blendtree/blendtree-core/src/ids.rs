//! Identifiers for core entities.

use serde::{Deserialize, Serialize};

/// Index of a clip inside the host's [`ClipBank`](crate::clip::ClipBank).
/// One byte wide because the wire format stores clip references as `u8`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub u8);

/// Handle to a tree node. Handles are issued in allocation order by the
/// node arena and stay valid until the tree is cleaned up.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
