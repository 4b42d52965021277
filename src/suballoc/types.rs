/*!
 * Suballocator Types
 * Common types for buffer suballocation
 */

use super::block::BlockHandle;
use ahash::RandomState;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Offset into the managed range, in allocation units
pub type Offset = u64;

/// Size of a block or of the managed range, in allocation units
pub type Size = u64;

/// Allocation operation result
pub type AllocResult<T> = Result<T, AllocError>;

/// Handles whose offset changed during a defrag pass
///
/// Callers that defrag every frame should keep one set alive and pass it
/// back in; `defrag` clears it before filling it.
pub type MovedSet = HashSet<BlockHandle, RandomState>;

/// Minimum increment applied when `update_allocations` has to grow the range
pub const DEFAULT_GROW_SIZE: Size = 1024;

/// Allocation errors
///
/// Exhaustion is the only recoverable failure; the caller decides whether to
/// `grow`, `defrag`, or give up. Contract violations (zero-size requests,
/// dead handles) panic instead of returning an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("out of space: requested {requested} units, {available} free ({used} used / {capacity} capacity)")]
    OutOfMemory {
        requested: Size,
        available: Size,
        used: Size,
        capacity: Size,
    },
}

/// One entry of an `update_allocations` batch
///
/// Entries start out `Pending(size)` and are rewritten to `Ready(handle)` in
/// place as the batch is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocSlot {
    /// Requested size, not yet allocated
    Pending(Size),
    /// Allocation satisfied; the resulting handle
    Ready(BlockHandle),
}

impl AllocSlot {
    /// The handle if this slot has been satisfied
    #[inline]
    pub fn handle(&self) -> Option<BlockHandle> {
        match self {
            AllocSlot::Pending(_) => None,
            AllocSlot::Ready(handle) => Some(*handle),
        }
    }

    /// Whether this slot is still awaiting allocation
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, AllocSlot::Pending(_))
    }
}

/// Public view of one block in the managed range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub offset: Offset,
    pub size: Size,
    pub free: bool,
}

impl BlockInfo {
    /// One past the last unit covered by this block
    #[inline]
    pub fn end(&self) -> Offset {
        self.offset + self.size
    }
}

/// Allocator statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocStats {
    pub capacity: Size,
    pub used_size: Size,
    pub free_size: Size,
    pub free_region_count: usize,
    pub allocated_count: usize,
    pub largest_free_region: Size,
    /// 0.0 when free space is one contiguous region (or absent), approaching
    /// 1.0 as it splinters
    pub fragmentation: f64,
}
