/*!
 * Block Nodes
 * List nodes and the stable handles that refer to them
 */

use super::types::{Offset, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable reference to an allocated block
///
/// A handle stays valid across defragmentation (the block keeps its identity
/// while its offset changes) and dies when the block is freed. Handles are
/// generation-checked: using one after its block was freed panics instead of
/// silently touching whatever reused the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHandle {
    pub(super) index: u32,
    pub(super) generation: u32,
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.generation)
    }
}

/// One node of the block list
///
/// Every node sits in the main list (`prev`/`next`, offset order, covering
/// the whole range) and free nodes additionally sit in the free list
/// (`prev_free`/`next_free`, same order). Links are slab indices rather than
/// pointers so nodes can be recycled without invalidating anything.
#[derive(Debug, Clone)]
pub(super) struct Block {
    pub(super) offset: Offset,
    pub(super) size: Size,
    pub(super) free: bool,
    /// Bumped whenever the slot's current handle must die
    pub(super) generation: u32,
    pub(super) prev: Option<u32>,
    pub(super) next: Option<u32>,
    pub(super) prev_free: Option<u32>,
    pub(super) next_free: Option<u32>,
}

impl Block {
    /// One past the last unit covered by this block
    #[inline]
    pub(super) fn end(&self) -> Offset {
        self.offset + self.size
    }
}
