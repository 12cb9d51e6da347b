//! Core configuration for blendtree-core.

use serde::{Deserialize, Serialize};

/// Sizing hints for a blend tree. Keep this minimal; expand as needed
/// without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Node slots in the arena's lazily created first chunk.
    pub arena_first_chunk: usize,
    /// Capacity hint for the all-nodes list.
    pub expected_nodes: usize,
    /// Capacity hint for the binding table.
    pub expected_bindings: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arena_first_chunk: 64,
            expected_nodes: 16,
            expected_bindings: 8,
        }
    }
}
