/*!
 * Batch Updates
 * Combined free and allocate with grow-and-compact recovery
 */

use super::block::BlockHandle;
use super::types::{AllocSlot, MovedSet, Size};
use super::SubAllocator;
use log::{debug, info};

impl SubAllocator {
    /// Free `to_free`, then satisfy every pending slot in order
    ///
    /// Rebuilds a batch of allocations in one call: each `Pending(size)`
    /// slot is rewritten to `Ready(handle)` in place. When an allocation
    /// fails midway the allocator recovers on its own. It grows by at least
    /// its grow step when even perfectly packed space could not hold the
    /// remainder, runs a full defrag, and finishes the batch.
    ///
    /// Returns `true` when that recovery ran. Every live block may have
    /// moved at that point, including blocks allocated earlier in this same
    /// batch, so the caller must re-read all offsets.
    ///
    /// # Panics
    /// If a slot is already `Ready` or a handle in `to_free` is dead.
    pub fn update_allocations(&mut self, to_free: &[BlockHandle], slots: &mut [AllocSlot]) -> bool {
        for &handle in to_free {
            self.free(handle);
        }

        for i in 0..slots.len() {
            let size = match slots[i] {
                AllocSlot::Pending(size) => size,
                AllocSlot::Ready(handle) => {
                    panic!("slot {} already holds handle {}", i, handle)
                }
            };
            match self.allocate(size) {
                Ok(handle) => slots[i] = AllocSlot::Ready(handle),
                Err(err) => {
                    debug!("batch stalled at slot {}: {}", i, err);
                    let remaining: Size = slots[i..]
                        .iter()
                        .map(|slot| match slot {
                            AllocSlot::Pending(size) => *size,
                            AllocSlot::Ready(_) => 0,
                        })
                        .sum();
                    self.recover(remaining);
                    for (j, slot) in slots.iter_mut().enumerate().skip(i) {
                        let size = match *slot {
                            AllocSlot::Pending(size) => size,
                            AllocSlot::Ready(handle) => {
                                panic!("slot {} already holds handle {}", j, handle)
                            }
                        };
                        let handle = match self.allocate(size) {
                            Ok(handle) => handle,
                            Err(err) => {
                                unreachable!("compacted range must hold the remainder: {}", err)
                            }
                        };
                        *slot = AllocSlot::Ready(handle);
                    }
                    return true;
                }
            }
        }
        false
    }

    /// Make room for `remaining` more units, then compact everything
    fn recover(&mut self, remaining: Size) {
        if self.used_size + remaining > self.capacity {
            let shortfall = self.used_size + remaining - self.capacity;
            let target = self.capacity + shortfall.max(self.grow_size);
            self.grow(target);
        }
        let mut moved = MovedSet::default();
        self.defrag(0, &mut moved);
        info!(
            "batch recovery: capacity={} after full defrag, {} block(s) moved",
            self.capacity,
            moved.len()
        );
    }
}
