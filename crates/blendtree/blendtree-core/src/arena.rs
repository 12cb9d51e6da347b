//! Chunked bump arena that owns every tree node.
//!
//! Nodes in a blend tree are never freed one by one; a tree is built (or
//! loaded), evaluated for a while, and torn down whole. The arena therefore
//! only bumps forward: `alloc` hands out a stable handle, `dealloc` is a
//! documented no-op, and `cleanup` releases everything at once.
//!
//! Storage is a list of fixed-capacity chunks. A chunk's length is the bump
//! cursor and never exceeds its capacity; chunks are never moved, shrunk or
//! compacted, so handles (and reads through them) stay valid across growth.

use crate::ids::NodeId;

/// Slot count of the first chunk when none was requested explicitly.
const FIRST_CHUNK_SLOTS: usize = 64;

#[derive(Debug)]
struct Chunk<T> {
    items: Vec<T>,
}

impl<T> Chunk<T> {
    fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity.max(1)),
        }
    }

    #[inline]
    fn has_space(&self) -> bool {
        self.items.len() < self.items.capacity()
    }
}

/// Bulk-lifetime allocator for tree nodes.
///
/// Handles are issued in allocation order. Because a new chunk is only
/// created once every existing chunk is full, allocation order maps onto
/// chunk slots contiguously and lookups walk the chunk list.
#[derive(Debug)]
pub struct Arena<T> {
    chunks: Vec<Chunk<T>>,
    first_chunk: usize,
    len: u32,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::with_chunk_capacity(FIRST_CHUNK_SLOTS)
    }

    /// Arena whose first chunk holds `capacity` slots. The first chunk is
    /// still created lazily, on the first allocation.
    pub fn with_chunk_capacity(capacity: usize) -> Self {
        Self {
            chunks: Vec::new(),
            first_chunk: capacity.max(1),
            len: 0,
        }
    }

    /// Store `value` and return its handle.
    ///
    /// On exhaustion a new chunk is appended, sized at twice the largest
    /// existing chunk. Older chunks are retained as-is; the arena never
    /// shrinks until [`cleanup`](Self::cleanup).
    pub fn alloc(&mut self, value: T) -> NodeId {
        if self.chunks.is_empty() {
            self.chunks.push(Chunk::new(self.first_chunk));
        }
        if !self.chunks.iter().any(Chunk::has_space) {
            let largest = self
                .chunks
                .iter()
                .map(|c| c.items.capacity())
                .max()
                .unwrap_or(self.first_chunk);
            self.chunks.push(Chunk::new(largest.saturating_mul(2)));
        }
        let chunk = self
            .chunks
            .iter_mut()
            .find(|c| c.has_space())
            .expect("a chunk with free space exists after growth");
        chunk.items.push(value);
        let id = NodeId(self.len);
        self.len += 1;
        id
    }

    /// Individual frees are not supported by design; only whole-arena
    /// [`cleanup`](Self::cleanup) reclaims memory.
    pub fn dealloc(&mut self, _id: NodeId) {}

    /// Release every chunk. The arena is empty and usable again afterwards;
    /// safe to call repeatedly.
    pub fn cleanup(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        let mut index = id.index();
        for chunk in &self.chunks {
            if index < chunk.items.len() {
                return chunk.items.get(index);
            }
            index -= chunk.items.len();
        }
        None
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let mut index = id.index();
        for chunk in &mut self.chunks {
            if index < chunk.items.len() {
                return chunk.items.get_mut(index);
            }
            index -= chunk.items.len();
        }
        None
    }

    /// Iterate live values in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.chunks.iter().flat_map(|c| c.items.iter())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[cfg(test)]
    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// it should keep earlier values readable after growing across chunks
    #[test]
    fn growth_preserves_previous_allocations() {
        let mut arena: Arena<u64> = Arena::with_chunk_capacity(2);
        let ids: Vec<NodeId> = (0..33u64).map(|v| arena.alloc(v * 10)).collect();
        assert!(arena.chunk_count() > 1);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(arena.get(*id), Some(&(i as u64 * 10)));
        }
        assert_eq!(arena.len(), 33);
    }

    /// it should double the largest chunk on exhaustion
    #[test]
    fn chunks_double() {
        let mut arena: Arena<u8> = Arena::with_chunk_capacity(2);
        for i in 0..7 {
            arena.alloc(i);
        }
        // 2 + 4 slots filled, third chunk holds at least 8.
        assert_eq!(arena.chunk_count(), 3);
    }

    /// it should treat dealloc as a no-op and keep the slot readable
    #[test]
    fn dealloc_is_noop() {
        let mut arena: Arena<u32> = Arena::new();
        let id = arena.alloc(99);
        arena.dealloc(id);
        assert_eq!(arena.get(id), Some(&99));
        assert_eq!(arena.len(), 1);
    }

    /// it should be empty and reusable after cleanup, repeatedly
    #[test]
    fn cleanup_is_idempotent_and_reusable() {
        let mut arena: Arena<u32> = Arena::with_chunk_capacity(2);
        for i in 0..5 {
            arena.alloc(i);
        }
        arena.cleanup();
        assert!(arena.is_empty());
        arena.cleanup();
        let id = arena.alloc(7);
        assert_eq!(id, NodeId(0));
        assert_eq!(arena.get(id), Some(&7));
    }

    /// it should hand out mutable access through handles
    #[test]
    fn get_mut_writes_through() {
        let mut arena: Arena<u32> = Arena::new();
        let id = arena.alloc(1);
        *arena.get_mut(id).unwrap() = 5;
        assert_eq!(arena.get(id), Some(&5));
        assert!(arena.get(NodeId(1)).is_none());
    }
}
