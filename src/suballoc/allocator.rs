/*!
 * Allocation and Release
 * First-fit allocation and neighbor-merging release
 */

use super::block::BlockHandle;
use super::types::{AllocError, AllocResult, Size};
use super::SubAllocator;
use log::{debug, trace};

impl SubAllocator {
    /// Allocate `size` contiguous units and return a stable handle
    ///
    /// First fit: the free list is walked in offset order and the first gap
    /// large enough is taken. An exact-size gap converts in place; a larger
    /// gap is carved from the front, so the allocation lands at the gap's
    /// original offset.
    ///
    /// # Errors
    /// `AllocError::OutOfMemory` when no single gap fits. Total free space
    /// may still exceed `size`; `defrag` or `grow` are the ways out.
    ///
    /// # Panics
    /// If `size` is zero.
    pub fn allocate(&mut self, size: Size) -> AllocResult<BlockHandle> {
        assert!(size > 0, "allocation size must be positive");

        let mut cursor = self.free_head;
        let gap = loop {
            match cursor {
                Some(id) if self.node(id).size >= size => break Some(id),
                Some(id) => cursor = self.node(id).next_free,
                None => break None,
            }
        };

        let Some(gap) = gap else {
            debug!(
                "allocation failed: requested={} free={} across {} region(s)",
                size, self.free_size, self.free_region_count
            );
            return Err(AllocError::OutOfMemory {
                requested: size,
                available: self.free_size,
                used: self.used_size,
                capacity: self.capacity,
            });
        };

        let id = if self.node(gap).size == size {
            // Exact fit: the gap node itself becomes the allocation.
            self.remove_free(gap);
            self.node_mut(gap).free = false;
            gap
        } else {
            // Carve from the front; the shrunk gap keeps its list positions.
            let offset = self.node(gap).offset;
            let id = self.slab.obtain(offset, size, false);
            self.insert_main_before(id, gap);
            let gap_node = self.node_mut(gap);
            gap_node.offset += size;
            gap_node.size -= size;
            id
        };

        self.used_size += size;
        self.free_size -= size;
        self.allocated_count += 1;

        let handle = self.slab.handle(id);
        trace!("allocated {} at offset {} ({})", size, self.node(id).offset, handle);
        Ok(handle)
    }

    /// Release the block behind `handle`
    ///
    /// The freed region merges with whichever neighbors are free, so the free
    /// list never holds two adjacent regions. The handle is dead afterwards;
    /// passing it to any operation panics.
    ///
    /// # Panics
    /// If `handle` is stale or foreign (double free included).
    pub fn free(&mut self, handle: BlockHandle) {
        let id = self.slab.resolve(handle);
        let size = self.node(id).size;

        {
            let node = self.node_mut(id);
            node.free = true;
            // The handle dies now even if the node lives on as a free region.
            node.generation = node.generation.wrapping_add(1);
        }
        self.used_size -= size;
        self.free_size += size;
        self.allocated_count -= 1;

        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };
        let prev_free = prev.map_or(false, |p| self.node(p).free);
        let next_free = next.map_or(false, |n| self.node(n).free);

        match (prev_free, next_free, prev, next) {
            (true, true, Some(prev), Some(next)) => {
                // Left neighbor swallows this block and the right neighbor.
                let absorbed = self.node(id).size + self.node(next).size;
                self.node_mut(prev).size += absorbed;
                self.remove_free(next);
                self.remove_main(next);
                self.remove_main(id);
                self.slab.release(next);
                self.slab.release(id);
            }
            (true, false, Some(prev), _) => {
                let absorbed = self.node(id).size;
                self.node_mut(prev).size += absorbed;
                self.remove_main(id);
                self.slab.release(id);
            }
            (false, true, _, Some(next)) => {
                // Absorb the right neighbor and inherit its free-list spot,
                // which keeps offset order without a scan.
                let absorbed = self.node(next).size;
                self.node_mut(id).size += absorbed;
                self.replace_free(next, id);
                self.remove_main(next);
                self.slab.release(next);
            }
            _ => {
                // Isolated: thread into the free list behind the nearest
                // preceding free block.
                let after = self.preceding_free(id);
                self.insert_free_after(id, after);
            }
        }

        trace!(
            "freed {} ({}): free={} across {} region(s)",
            size, handle, self.free_size, self.free_region_count
        );
    }
}
