/*!
 * List Splicing
 * Doubly-linked main-list and free-list primitives
 */

use super::block::Block;
use super::SubAllocator;

/// Splice helpers shared by allocation, release, grow, and defrag.
///
/// The main list (`prev`/`next`) holds every block in offset order; the free
/// list (`prev_free`/`next_free`) threads the free subset in the same order.
/// `free_region_count` is maintained here, at the only places nodes enter or
/// leave the free list.
impl SubAllocator {
    #[inline]
    pub(super) fn node(&self, id: u32) -> &Block {
        self.slab.get(id)
    }

    #[inline]
    pub(super) fn node_mut(&mut self, id: u32) -> &mut Block {
        self.slab.get_mut(id)
    }

    /// Append `id` at the main-list tail
    pub(super) fn push_main_back(&mut self, id: u32) {
        let old_tail = self.tail;
        {
            let node = self.node_mut(id);
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(tail) => self.node_mut(tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    /// Link `id` immediately before `before` in the main list
    pub(super) fn insert_main_before(&mut self, id: u32, before: u32) {
        let prev = self.node(before).prev;
        {
            let node = self.node_mut(id);
            node.prev = prev;
            node.next = Some(before);
        }
        self.node_mut(before).prev = Some(id);
        match prev {
            Some(prev) => self.node_mut(prev).next = Some(id),
            None => self.head = Some(id),
        }
    }

    /// Link `id` immediately after `after` in the main list
    pub(super) fn insert_main_after(&mut self, id: u32, after: u32) {
        let next = self.node(after).next;
        {
            let node = self.node_mut(id);
            node.prev = Some(after);
            node.next = next;
        }
        self.node_mut(after).next = Some(id);
        match next {
            Some(next) => self.node_mut(next).prev = Some(id),
            None => self.tail = Some(id),
        }
    }

    /// Unlink `id` from the main list
    ///
    /// `id`'s own links are left stale; the caller releases the node or
    /// relinks it immediately.
    pub(super) fn remove_main(&mut self, id: u32) {
        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.tail = prev,
        }
    }

    /// `id` takes over `old`'s exact position in the main list
    pub(super) fn replace_main(&mut self, old: u32, id: u32) {
        let (prev, next) = {
            let node = self.node(old);
            (node.prev, node.next)
        };
        {
            let node = self.node_mut(id);
            node.prev = prev;
            node.next = next;
        }
        match prev {
            Some(prev) => self.node_mut(prev).next = Some(id),
            None => self.head = Some(id),
        }
        match next {
            Some(next) => self.node_mut(next).prev = Some(id),
            None => self.tail = Some(id),
        }
    }

    /// Append `id` at the free-list tail
    pub(super) fn push_free_back(&mut self, id: u32) {
        let old_tail = self.free_tail;
        {
            let node = self.node_mut(id);
            node.prev_free = old_tail;
            node.next_free = None;
        }
        match old_tail {
            Some(tail) => self.node_mut(tail).next_free = Some(id),
            None => self.free_head = Some(id),
        }
        self.free_tail = Some(id);
        self.free_region_count += 1;
    }

    /// Link `id` into the free list after `after` (`None` makes it the head)
    ///
    /// The caller picks `after` so that offset order is preserved.
    pub(super) fn insert_free_after(&mut self, id: u32, after: Option<u32>) {
        match after {
            Some(after) => {
                let next = self.node(after).next_free;
                {
                    let node = self.node_mut(id);
                    node.prev_free = Some(after);
                    node.next_free = next;
                }
                self.node_mut(after).next_free = Some(id);
                match next {
                    Some(next) => self.node_mut(next).prev_free = Some(id),
                    None => self.free_tail = Some(id),
                }
            }
            None => {
                let old_head = self.free_head;
                {
                    let node = self.node_mut(id);
                    node.prev_free = None;
                    node.next_free = old_head;
                }
                match old_head {
                    Some(head) => self.node_mut(head).prev_free = Some(id),
                    None => self.free_tail = Some(id),
                }
                self.free_head = Some(id);
            }
        }
        self.free_region_count += 1;
    }

    /// Unlink `id` from the free list
    pub(super) fn remove_free(&mut self, id: u32) {
        let (prev, next) = {
            let node = self.node(id);
            (node.prev_free, node.next_free)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next_free = next,
            None => self.free_head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev_free = prev,
            None => self.free_tail = prev,
        }
        self.free_region_count -= 1;
    }

    /// `id` takes over `old`'s exact position in the free list
    ///
    /// Region count is unchanged; `old`'s free links are left stale.
    pub(super) fn replace_free(&mut self, old: u32, id: u32) {
        let (prev, next) = {
            let node = self.node(old);
            (node.prev_free, node.next_free)
        };
        {
            let node = self.node_mut(id);
            node.prev_free = prev;
            node.next_free = next;
        }
        match prev {
            Some(prev) => self.node_mut(prev).next_free = Some(id),
            None => self.free_head = Some(id),
        }
        match next {
            Some(next) => self.node_mut(next).prev_free = Some(id),
            None => self.free_tail = Some(id),
        }
    }

    /// Nearest free block before `id` in the main list, if any
    pub(super) fn preceding_free(&self, id: u32) -> Option<u32> {
        let mut cursor = self.node(id).prev;
        while let Some(prev) = cursor {
            if self.node(prev).free {
                return Some(prev);
            }
            cursor = self.node(prev).prev;
        }
        None
    }
}
