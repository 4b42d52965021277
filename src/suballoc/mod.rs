/*!
 * Buffer Suballocation
 * First-fit suballocation over a linear range with stable handles
 *
 * A `SubAllocator` hands out contiguous sub-ranges of `[0, capacity)` and
 * keeps two threaded lists over one slab of nodes: the main list covers the
 * whole range in offset order, the free list threads the free subset in the
 * same order. Handles stay valid while blocks relocate during
 * defragmentation, so callers re-read offsets instead of holding them.
 */

mod allocator;
mod block;
mod defrag;
mod grow;
mod list;
mod slab;
mod types;
mod update;

pub mod traits;

pub use block::BlockHandle;
pub use traits::{AllocInfo, BlockAlloc, Defragment, Suballocate};
pub use types::{
    AllocError, AllocResult, AllocSlot, AllocStats, BlockInfo, MovedSet, Offset, Size,
    DEFAULT_GROW_SIZE,
};

use log::{debug, info};
use slab::BlockSlab;

/// First-fit suballocator over a linear range
///
/// Single-threaded by design; wrap it yourself if it must be shared.
/// Cloning snapshots the whole block layout, handles included.
#[derive(Debug, Clone)]
pub struct SubAllocator {
    slab: BlockSlab,
    head: Option<u32>,
    tail: Option<u32>,
    free_head: Option<u32>,
    free_tail: Option<u32>,
    capacity: Size,
    used_size: Size,
    free_size: Size,
    free_region_count: usize,
    allocated_count: usize,
    grow_size: Size,
}

impl SubAllocator {
    /// Create an allocator managing `capacity` units
    pub fn new(capacity: Size) -> Self {
        Self::with_grow_size(capacity, DEFAULT_GROW_SIZE)
    }

    /// Create an allocator with an explicit grow step for batch recovery
    ///
    /// # Panics
    /// If `grow_size` is zero.
    pub fn with_grow_size(capacity: Size, grow_size: Size) -> Self {
        assert!(grow_size > 0, "grow size must be positive");
        let mut alloc = Self {
            slab: BlockSlab::new(),
            head: None,
            tail: None,
            free_head: None,
            free_tail: None,
            capacity,
            used_size: 0,
            free_size: capacity,
            free_region_count: 0,
            allocated_count: 0,
            grow_size,
        };
        if capacity > 0 {
            let id = alloc.slab.obtain(0, capacity, true);
            alloc.push_main_back(id);
            alloc.push_free_back(id);
        }
        info!("suballocator ready: capacity={} grow_size={}", capacity, grow_size);
        alloc
    }

    /// Total units managed
    #[inline]
    pub fn capacity(&self) -> Size {
        self.capacity
    }

    /// Units currently allocated
    #[inline]
    pub fn used_size(&self) -> Size {
        self.used_size
    }

    /// Units currently free, across all regions
    #[inline]
    pub fn free_size(&self) -> Size {
        self.free_size
    }

    /// Minimum increment used when batch recovery grows the range
    #[inline]
    pub fn grow_size(&self) -> Size {
        self.grow_size
    }

    /// Number of disjoint free regions
    #[inline]
    pub fn free_region_count(&self) -> usize {
        self.free_region_count
    }

    /// Number of live allocations
    #[inline]
    pub fn allocated_count(&self) -> usize {
        self.allocated_count
    }

    /// Fraction of free space lost to splintering
    ///
    /// 0.0 when free space is one region or absent, `1 - 1/n` for `n`
    /// regions otherwise.
    pub fn fragmentation(&self) -> f64 {
        if self.free_size == 0 {
            0.0
        } else {
            1.0 - 1.0 / self.free_region_count as f64
        }
    }

    /// Current offset of a live allocation
    ///
    /// # Panics
    /// If `handle` is stale or foreign.
    pub fn offset_of(&self, handle: BlockHandle) -> Offset {
        self.node(self.slab.resolve(handle)).offset
    }

    /// Size of a live allocation
    ///
    /// # Panics
    /// If `handle` is stale or foreign.
    pub fn size_of(&self, handle: BlockHandle) -> Size {
        self.node(self.slab.resolve(handle)).size
    }

    /// Whether `handle` still names a live allocation
    #[inline]
    pub fn contains(&self, handle: BlockHandle) -> bool {
        self.slab.try_resolve(handle).is_some()
    }

    /// Snapshot of the allocator counters
    pub fn stats(&self) -> AllocStats {
        let mut largest_free_region = 0;
        let mut cursor = self.free_head;
        while let Some(id) = cursor {
            let node = self.node(id);
            largest_free_region = largest_free_region.max(node.size);
            cursor = node.next_free;
        }
        AllocStats {
            capacity: self.capacity,
            used_size: self.used_size,
            free_size: self.free_size,
            free_region_count: self.free_region_count,
            allocated_count: self.allocated_count,
            largest_free_region,
            fragmentation: self.fragmentation(),
        }
    }

    /// Iterate every block, allocated and free, in offset order
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            alloc: self,
            cursor: self.head,
        }
    }

    /// Iterate the free regions in offset order
    pub fn free_regions(&self) -> FreeRegions<'_> {
        FreeRegions {
            alloc: self,
            cursor: self.free_head,
        }
    }

    /// Drop every allocation and return to a single free region
    ///
    /// All outstanding handles die; capacity and grow step are kept.
    pub fn clear(&mut self) {
        let mut cursor = self.head;
        while let Some(id) = cursor {
            cursor = self.node(id).next;
            self.node_mut(id).free = true;
            self.slab.release(id);
        }
        self.head = None;
        self.tail = None;
        self.free_head = None;
        self.free_tail = None;
        self.used_size = 0;
        self.free_size = self.capacity;
        self.free_region_count = 0;
        self.allocated_count = 0;
        if self.capacity > 0 {
            let id = self.slab.obtain(0, self.capacity, true);
            self.push_main_back(id);
            self.push_free_back(id);
        }
        debug!("suballocator cleared: capacity={}", self.capacity);
    }
}

/// Iterator over the whole block list in offset order
pub struct Blocks<'a> {
    alloc: &'a SubAllocator,
    cursor: Option<u32>,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let id = self.cursor?;
        let node = self.alloc.node(id);
        self.cursor = node.next;
        Some(BlockInfo {
            offset: node.offset,
            size: node.size,
            free: node.free,
        })
    }
}

/// Iterator over the free regions in offset order
pub struct FreeRegions<'a> {
    alloc: &'a SubAllocator,
    cursor: Option<u32>,
}

impl Iterator for FreeRegions<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let id = self.cursor?;
        let node = self.alloc.node(id);
        self.cursor = node.next_free;
        Some(BlockInfo {
            offset: node.offset,
            size: node.size,
            free: true,
        })
    }
}

// Trait implementations

impl BlockAlloc for SubAllocator {
    fn allocate(&mut self, size: Size) -> AllocResult<BlockHandle> {
        SubAllocator::allocate(self, size)
    }

    fn free(&mut self, handle: BlockHandle) {
        SubAllocator::free(self, handle)
    }

    fn grow(&mut self, new_capacity: Size) {
        SubAllocator::grow(self, new_capacity)
    }
}

impl AllocInfo for SubAllocator {
    fn capacity(&self) -> Size {
        self.capacity
    }

    fn used_size(&self) -> Size {
        self.used_size
    }

    fn free_size(&self) -> Size {
        self.free_size
    }

    fn free_region_count(&self) -> usize {
        self.free_region_count
    }

    fn fragmentation(&self) -> f64 {
        SubAllocator::fragmentation(self)
    }

    fn stats(&self) -> AllocStats {
        SubAllocator::stats(self)
    }
}

impl Defragment for SubAllocator {
    fn defrag(&mut self, max_moves: usize, moved: &mut MovedSet) {
        SubAllocator::defrag(self, max_moves, moved)
    }

    fn update_allocations(&mut self, to_free: &[BlockHandle], slots: &mut [AllocSlot]) -> bool {
        SubAllocator::update_allocations(self, to_free, slots)
    }
}
