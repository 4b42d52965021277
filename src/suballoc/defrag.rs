/*!
 * Defragmentation
 * Full compaction and budgeted incremental compaction
 */

use super::types::{MovedSet, Offset};
use super::SubAllocator;
use log::{debug, info};

impl SubAllocator {
    /// Compact allocated blocks toward offset zero
    ///
    /// With `max_moves == 0` this is a full compaction: every allocated
    /// block is packed back to back from the low end, in order, and all free
    /// space collapses into at most one trailing region. Any other value
    /// bounds the pass: the first half of the budget (rounded up) retires
    /// blocks from the tail end into earlier gaps, the remainder slides
    /// blocks leftward across the free region directly before them.
    ///
    /// `moved` is cleared on entry and filled with the handle of every block
    /// whose offset changed; callers re-read those offsets afterwards.
    /// Handles themselves stay valid across any number of moves.
    pub fn defrag(&mut self, max_moves: usize, moved: &mut MovedSet) {
        moved.clear();
        if max_moves == 0 {
            self.compact(moved);
            info!(
                "full defrag: {} block(s) moved, free={} in {} region(s)",
                moved.len(),
                self.free_size,
                self.free_region_count
            );
        } else {
            let tail_budget = max_moves - max_moves / 2;
            let slide_budget = max_moves / 2;
            let mut moves = self.pack_tail(tail_budget, moved);
            moves += self.slide_left(slide_budget, moved);
            debug!(
                "incremental defrag: {}/{} moves spent, {} free region(s) left",
                moves, max_moves, self.free_region_count
            );
        }
    }

    /// Rebuild the range with zero fragmentation, preserving block order
    fn compact(&mut self, moved: &mut MovedSet) {
        // Drop every free region from both lists.
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let (next, free) = {
                let node = self.node(id);
                (node.next, node.free)
            };
            if free {
                self.remove_free(id);
                self.remove_main(id);
                self.slab.release(id);
            }
            cursor = next;
        }

        // Re-seat the survivors back to back from offset zero.
        let mut offset: Offset = 0;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let (next, size, old_offset) = {
                let node = self.node(id);
                (node.next, node.size, node.offset)
            };
            if old_offset != offset {
                self.node_mut(id).offset = offset;
                moved.insert(self.slab.handle(id));
            }
            offset += size;
            cursor = next;
        }

        // One trailing free region covers whatever capacity remains.
        if offset < self.capacity {
            let id = self.slab.obtain(offset, self.capacity - offset, true);
            self.push_main_back(id);
            self.push_free_back(id);
        }
    }

    /// Phase one: relocate the highest allocated block into the first gap
    /// (offset order) that fits it at a strictly lower offset
    fn pack_tail(&mut self, budget: usize, moved: &mut MovedSet) -> usize {
        let mut moves = 0;
        while moves < budget {
            let mut cursor = self.tail;
            let block = loop {
                match cursor {
                    Some(id) if !self.node(id).free => break Some(id),
                    Some(id) => cursor = self.node(id).prev,
                    None => break None,
                }
            };
            let Some(block) = block else { break };
            let (block_offset, block_size) = {
                let node = self.node(block);
                (node.offset, node.size)
            };

            let mut cursor = self.free_head;
            let gap = loop {
                match cursor {
                    Some(id) => {
                        let node = self.node(id);
                        // Gaps are offset-ordered; nothing past the block
                        // itself can be a lower offset.
                        if node.offset >= block_offset {
                            break None;
                        }
                        if node.size >= block_size {
                            break Some(id);
                        }
                        cursor = node.next_free;
                    }
                    None => break None,
                }
            };
            let Some(gap) = gap else { break };

            self.move_block(block, gap);
            moved.insert(self.slab.handle(block));
            moves += 1;
        }
        moves
    }

    /// Phase two: wherever a free region directly precedes an allocated
    /// block, swap the pair so the block slides left
    fn slide_left(&mut self, budget: usize, moved: &mut MovedSet) -> usize {
        let mut moves = 0;
        let mut cursor = self.head;
        while moves < budget {
            let Some(id) = cursor else { break };
            let (next, free) = {
                let node = self.node(id);
                (node.next, node.free)
            };
            if !free {
                cursor = next;
                continue;
            }
            // A free tail has nothing on its right; the scan is done.
            let Some(block) = next else { break };
            debug_assert!(!self.node(block).free, "adjacent free regions");

            // Swap in place: the block takes the gap's offset and the gap
            // slides past it. The gap keeps its free-list position, which
            // stays offset-ordered since it cannot cross another region.
            let gap_offset = self.node(id).offset;
            let block_size = self.node(block).size;
            self.node_mut(block).offset = gap_offset;
            self.node_mut(id).offset = gap_offset + block_size;
            self.remove_main(id);
            self.insert_main_after(id, block);

            moved.insert(self.slab.handle(block));
            moves += 1;

            // The gap may now touch the next free region; merging keeps
            // free regions non-adjacent.
            if let Some(right) = self.node(id).next {
                if self.node(right).free {
                    let absorbed = self.node(right).size;
                    self.node_mut(id).size += absorbed;
                    self.remove_free(right);
                    self.remove_main(right);
                    self.slab.release(right);
                }
            }
            cursor = self.node(id).next;
        }
        moves
    }

    /// Relocate `block` into `gap`, preserving the block node and with it
    /// every outstanding handle
    ///
    /// `gap` must fit the block and sit at a strictly lower offset; phase
    /// one only ever selects such gaps. A gap on the block's right would be
    /// swallowed while the vacated space merges, leaving nothing to move to.
    fn move_block(&mut self, block: u32, gap: u32) {
        debug_assert!(!self.node(block).free, "moving a free region");
        debug_assert!(self.node(gap).free, "target is not free");
        debug_assert!(self.node(gap).size >= self.node(block).size, "target too small");
        debug_assert!(
            self.node(gap).offset < self.node(block).offset,
            "moves must lower the offset"
        );

        let (block_offset, block_size, old_prev, old_next) = {
            let node = self.node(block);
            (node.offset, node.size, node.prev, node.next)
        };

        // Pull the block out and let free space reclaim its old position,
        // growing a free neighbor rather than minting a node when possible.
        self.remove_main(block);
        let prev_free = old_prev.map_or(false, |p| self.node(p).free);
        let next_free = old_next.map_or(false, |n| self.node(n).free);
        match (prev_free, next_free, old_prev, old_next) {
            (true, true, Some(prev), Some(next)) => {
                let absorbed = block_size + self.node(next).size;
                self.node_mut(prev).size += absorbed;
                self.remove_free(next);
                self.remove_main(next);
                self.slab.release(next);
            }
            (true, false, Some(prev), _) => {
                self.node_mut(prev).size += block_size;
            }
            (false, true, _, Some(next)) => {
                // Stretch the right neighbor leftward over the hole.
                let next_node = self.node_mut(next);
                next_node.offset -= block_size;
                next_node.size += block_size;
            }
            _ => {
                let hole = self.slab.obtain(block_offset, block_size, true);
                match (old_prev, old_next) {
                    (Some(prev), _) => self.insert_main_after(hole, prev),
                    (_, Some(next)) => self.insert_main_before(hole, next),
                    (None, None) => self.push_main_back(hole),
                }
                let after = self.preceding_free(hole);
                self.insert_free_after(hole, after);
            }
        }

        // Seat the block at the gap's front. Re-read the gap: if it was the
        // block's left neighbor it just grew by the vacated space.
        let (gap_offset, gap_size) = {
            let node = self.node(gap);
            (node.offset, node.size)
        };
        self.node_mut(block).offset = gap_offset;
        if gap_size == block_size {
            self.replace_main(gap, block);
            self.remove_free(gap);
            self.slab.release(gap);
        } else {
            self.insert_main_before(block, gap);
            let gap_node = self.node_mut(gap);
            gap_node.offset += block_size;
            gap_node.size -= block_size;
        }
    }
}
