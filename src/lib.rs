/*!
 * Bufalloc Library
 * Buffer suballocation exposed as a library
 */

pub mod suballoc;

// Re-exports
pub use suballoc::{
    AllocError, AllocInfo, AllocResult, AllocSlot, AllocStats, BlockAlloc, BlockHandle, BlockInfo,
    Defragment, MovedSet, Offset, Size, SubAllocator, Suballocate, DEFAULT_GROW_SIZE,
};
