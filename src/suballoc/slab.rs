/*!
 * Block Slab
 * Backing storage for list nodes with slot recycling
 */

use super::block::{Block, BlockHandle};
use super::types::{Offset, Size};

/// Slab of block nodes
///
/// Nodes never move once pushed; released slots go on a recycle stack and are
/// handed back before the slab grows. Releasing a slot bumps its generation
/// so handles minted for the old occupant stop resolving.
#[derive(Debug, Default, Clone)]
pub(super) struct BlockSlab {
    nodes: Vec<Block>,
    recycled: Vec<u32>,
}

impl BlockSlab {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Hand out a node, reusing a recycled slot when one is available
    pub(super) fn obtain(&mut self, offset: Offset, size: Size, free: bool) -> u32 {
        if let Some(index) = self.recycled.pop() {
            let node = &mut self.nodes[index as usize];
            node.offset = offset;
            node.size = size;
            node.free = free;
            node.prev = None;
            node.next = None;
            node.prev_free = None;
            node.next_free = None;
            index
        } else {
            let index = self.nodes.len() as u32;
            debug_assert!(self.nodes.len() < u32::MAX as usize, "slab index space exhausted");
            self.nodes.push(Block {
                offset,
                size,
                free,
                generation: 0,
                prev: None,
                next: None,
                prev_free: None,
                next_free: None,
            });
            index
        }
    }

    /// Return a node to the recycle stack
    ///
    /// The caller must already have unlinked it from both lists.
    pub(super) fn release(&mut self, index: u32) {
        let node = &mut self.nodes[index as usize];
        debug_assert!(node.free, "released a node that still backs an allocation");
        node.generation = node.generation.wrapping_add(1);
        self.recycled.push(index);
    }

    #[inline]
    pub(super) fn get(&self, index: u32) -> &Block {
        &self.nodes[index as usize]
    }

    #[inline]
    pub(super) fn get_mut(&mut self, index: u32) -> &mut Block {
        &mut self.nodes[index as usize]
    }

    /// Mint a handle for the slot's current occupant
    #[inline]
    pub(super) fn handle(&self, index: u32) -> BlockHandle {
        BlockHandle {
            index,
            generation: self.nodes[index as usize].generation,
        }
    }

    /// Slot index behind `handle` if it still names a live allocation
    pub(super) fn try_resolve(&self, handle: BlockHandle) -> Option<u32> {
        let node = self.nodes.get(handle.index as usize)?;
        if node.generation == handle.generation && !node.free {
            Some(handle.index)
        } else {
            None
        }
    }

    /// Slot index behind `handle`, panicking on stale or foreign handles
    pub(super) fn resolve(&self, handle: BlockHandle) -> u32 {
        match self.try_resolve(handle) {
            Some(index) => index,
            None => panic!("handle {} does not refer to a live allocation", handle),
        }
    }

    /// Number of slots waiting on the recycle stack
    #[cfg(test)]
    pub(super) fn recycled_count(&self) -> usize {
        self.recycled.len()
    }
}
