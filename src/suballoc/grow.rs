/*!
 * Range Growth
 * Extends the managed range in place
 */

use super::types::Size;
use super::SubAllocator;
use log::debug;

impl SubAllocator {
    /// Grow the managed range to `new_capacity`
    ///
    /// The added space lands at the high end: a free tail block is extended,
    /// otherwise a new free block is appended. Existing blocks and handles
    /// are untouched. Requests at or below the current capacity are ignored;
    /// shrinking is not supported.
    pub fn grow(&mut self, new_capacity: Size) {
        if new_capacity <= self.capacity {
            return;
        }
        let delta = new_capacity - self.capacity;

        match self.tail {
            Some(tail) if self.node(tail).free => {
                self.node_mut(tail).size += delta;
            }
            _ => {
                let id = self.slab.obtain(self.capacity, delta, true);
                self.push_main_back(id);
                self.push_free_back(id);
            }
        }

        self.capacity = new_capacity;
        self.free_size += delta;
        debug!("grew capacity to {} (+{})", new_capacity, delta);
    }
}
