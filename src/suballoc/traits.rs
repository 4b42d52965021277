/*!
 * Suballocator Traits
 * Capability seams for allocation, inspection, and compaction
 */

use super::block::BlockHandle;
use super::types::{AllocResult, AllocSlot, AllocStats, MovedSet, Size};

/// Block allocation and release
pub trait BlockAlloc {
    /// Allocate `size` contiguous units, first fit
    fn allocate(&mut self, size: Size) -> AllocResult<BlockHandle>;

    /// Release an allocated block, merging it into free neighbors
    fn free(&mut self, handle: BlockHandle);

    /// Extend the managed range; no-op at or below the current capacity
    fn grow(&mut self, new_capacity: Size);
}

/// Read-only allocator state
pub trait AllocInfo {
    fn capacity(&self) -> Size;
    fn used_size(&self) -> Size;
    fn free_size(&self) -> Size;
    fn free_region_count(&self) -> usize;

    /// 0.0 for contiguous (or no) free space, approaching 1.0 as it splinters
    fn fragmentation(&self) -> f64;

    /// Snapshot of all counters
    fn stats(&self) -> AllocStats;
}

/// Compaction control
pub trait Defragment {
    /// Compact toward offset zero; a zero budget runs a full pass
    fn defrag(&mut self, max_moves: usize, moved: &mut MovedSet);

    /// Free and reallocate as one batch; `true` means a full defrag ran
    fn update_allocations(&mut self, to_free: &[BlockHandle], slots: &mut [AllocSlot]) -> bool;
}

/// Combined trait for full suballocator capability
pub trait Suballocate: BlockAlloc + AllocInfo + Defragment {}

/// Blanket implementation
impl<T: BlockAlloc + AllocInfo + Defragment> Suballocate for T {}
