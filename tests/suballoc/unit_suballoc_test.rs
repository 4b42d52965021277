/*!
 * Suballocator Tests
 * Comprehensive tests for allocation, release, growth, and accounting
 */

use bufalloc::suballoc::{AllocError, SubAllocator};
use pretty_assertions::assert_eq;

#[test]
fn test_suballocator_initialization() {
    let alloc = SubAllocator::new(100);

    assert_eq!(alloc.capacity(), 100);
    assert_eq!(alloc.used_size(), 0);
    assert_eq!(alloc.free_size(), 100);
    assert_eq!(alloc.free_region_count(), 1);
    assert_eq!(alloc.fragmentation(), 0.0);
}

#[test]
fn test_zero_capacity_initialization() {
    let mut alloc = SubAllocator::new(0);

    assert_eq!(alloc.capacity(), 0);
    assert_eq!(alloc.free_region_count(), 0);
    assert_eq!(alloc.fragmentation(), 0.0);
    assert!(alloc.allocate(1).is_err());

    // Becomes usable once grown
    alloc.grow(64);
    assert_eq!(alloc.capacity(), 64);
    assert!(alloc.allocate(64).is_ok());
}

#[test]
fn test_basic_allocation() {
    let mut alloc = SubAllocator::new(100);

    let handle = alloc.allocate(30).unwrap();
    assert_eq!(alloc.offset_of(handle), 0);
    assert_eq!(alloc.size_of(handle), 30);
    assert_eq!(alloc.used_size(), 30);
    assert_eq!(alloc.free_size(), 70);
}

#[test]
fn test_multiple_allocations_are_contiguous() {
    let mut alloc = SubAllocator::new(100);

    let a = alloc.allocate(10).unwrap();
    let b = alloc.allocate(20).unwrap();
    let c = alloc.allocate(30).unwrap();

    assert_ne!(a, b);
    assert_ne!(b, c);
    assert_eq!(alloc.offset_of(a), 0);
    assert_eq!(alloc.offset_of(b), 10);
    assert_eq!(alloc.offset_of(c), 30);
    assert_eq!(alloc.used_size(), 60);
    assert_eq!(alloc.allocated_count(), 3);
}

#[test]
fn test_allocate_free_round_trip() {
    let mut alloc = SubAllocator::new(100);
    alloc.allocate(10).unwrap();
    let before = alloc.stats();

    let handle = alloc.allocate(25).unwrap();
    alloc.free(handle);

    let after = alloc.stats();
    assert_eq!(after.used_size, before.used_size);
    assert_eq!(after.free_size, before.free_size);
    assert_eq!(after.free_region_count, before.free_region_count);
    assert_eq!(after.fragmentation, before.fragmentation);
}

#[test]
fn test_out_of_memory() {
    let mut alloc = SubAllocator::new(100);

    let result = alloc.allocate(200);
    assert!(result.is_err());

    match result {
        Err(AllocError::OutOfMemory {
            requested,
            available,
            used,
            capacity,
        }) => {
            assert_eq!(requested, 200);
            assert_eq!(available, 100);
            assert_eq!(used, 0);
            assert_eq!(capacity, 100);
        }
        _ => panic!("Expected OutOfMemory error"),
    }
}

#[test]
fn test_oom_from_fragmentation_alone() {
    let mut alloc = SubAllocator::new(100);

    // 25 free at offset 0 and 25 free at the tail, but no 40-unit gap.
    let a = alloc.allocate(25).unwrap();
    alloc.allocate(50).unwrap();
    alloc.free(a);

    let result = alloc.allocate(40);
    match result {
        Err(AllocError::OutOfMemory { requested, available, .. }) => {
            assert_eq!(requested, 40);
            assert_eq!(available, 50);
        }
        _ => panic!("Expected OutOfMemory error"),
    }
}

#[test]
fn test_fragmentation_after_middle_free() {
    let mut alloc = SubAllocator::new(100);

    alloc.allocate(20).unwrap();
    let b = alloc.allocate(20).unwrap();
    alloc.allocate(20).unwrap();

    // Two free regions remain: the 20-unit gap and the 40-unit tail.
    alloc.free(b);
    assert_eq!(alloc.free_region_count(), 2);
    assert_eq!(alloc.fragmentation(), 0.5);
}

#[test]
fn test_freeing_everything_leaves_one_region() {
    let mut alloc = SubAllocator::new(100);

    let a = alloc.allocate(20).unwrap();
    let b = alloc.allocate(20).unwrap();
    let c = alloc.allocate(20).unwrap();

    alloc.free(a);
    alloc.free(c);
    assert_eq!(alloc.free_region_count(), 2);

    alloc.free(b);
    assert_eq!(alloc.free_region_count(), 1);
    assert_eq!(alloc.free_size(), 100);
    assert_eq!(alloc.used_size(), 0);
    assert_eq!(alloc.fragmentation(), 0.0);
}

#[test]
fn test_fragmentation_formula() {
    let mut alloc = SubAllocator::new(120);
    let mut gaps = Vec::new();

    // Alternate 10-unit blocks; freeing every other one leaves n gaps.
    for i in 0..12 {
        let handle = alloc.allocate(10).unwrap();
        if i % 2 == 0 {
            gaps.push(handle);
        }
    }
    for (n, handle) in gaps.into_iter().enumerate() {
        alloc.free(handle);
        let regions = n + 1;
        assert_eq!(alloc.free_region_count(), regions);
        let expected = 1.0 - 1.0 / regions as f64;
        assert!((alloc.fragmentation() - expected).abs() < 1e-12);
    }
}

#[test]
fn test_grow_extends_free_tail() {
    let mut alloc = SubAllocator::new(100);
    alloc.allocate(60).unwrap();
    assert_eq!(alloc.free_region_count(), 1);

    alloc.grow(150);
    assert_eq!(alloc.capacity(), 150);
    assert_eq!(alloc.free_size(), 90);
    // Tail was free, so the region extended instead of splitting.
    assert_eq!(alloc.free_region_count(), 1);
}

#[test]
fn test_grow_appends_after_allocated_tail() {
    let mut alloc = SubAllocator::new(100);
    alloc.allocate(100).unwrap();
    assert_eq!(alloc.free_region_count(), 0);

    alloc.grow(150);
    assert_eq!(alloc.capacity(), 150);
    assert_eq!(alloc.free_size(), 50);
    assert_eq!(alloc.free_region_count(), 1);

    let regions: Vec<_> = alloc.free_regions().collect();
    assert_eq!(regions[0].offset, 100);
    assert_eq!(regions[0].size, 50);
}

#[test]
fn test_grow_at_or_below_capacity_is_ignored() {
    let mut alloc = SubAllocator::new(100);
    alloc.grow(100);
    alloc.grow(50);
    assert_eq!(alloc.capacity(), 100);
    assert_eq!(alloc.free_size(), 100);
}

#[test]
fn test_stats_snapshot() {
    let mut alloc = SubAllocator::new(100);
    let a = alloc.allocate(25).unwrap();
    alloc.allocate(30).unwrap();
    alloc.free(a);

    let stats = alloc.stats();
    assert_eq!(stats.capacity, 100);
    assert_eq!(stats.used_size, 30);
    assert_eq!(stats.free_size, 70);
    assert_eq!(stats.free_region_count, 2);
    assert_eq!(stats.allocated_count, 1);
    assert_eq!(stats.largest_free_region, 45);
    assert_eq!(stats.fragmentation, 0.5);
}

#[test]
fn test_stats_serialization() {
    let mut alloc = SubAllocator::new(100);
    alloc.allocate(40).unwrap();

    let stats = alloc.stats();
    let json = serde_json::to_string(&stats).unwrap();
    let back: bufalloc::AllocStats = serde_json::from_str(&json).unwrap();

    assert_eq!(back.capacity, stats.capacity);
    assert_eq!(back.used_size, stats.used_size);
    assert_eq!(back.free_size, stats.free_size);
    assert_eq!(back.free_region_count, stats.free_region_count);
    assert_eq!(back.largest_free_region, stats.largest_free_region);
}

#[test]
fn test_contains_tracks_liveness() {
    let mut alloc = SubAllocator::new(100);
    let handle = alloc.allocate(10).unwrap();
    assert!(alloc.contains(handle));

    alloc.free(handle);
    assert!(!alloc.contains(handle));
}

#[test]
fn test_clear_drops_all_handles() {
    let mut alloc = SubAllocator::new(100);
    let a = alloc.allocate(10).unwrap();
    let b = alloc.allocate(20).unwrap();

    alloc.clear();
    assert!(!alloc.contains(a));
    assert!(!alloc.contains(b));
    assert_eq!(alloc.used_size(), 0);
    assert_eq!(alloc.free_size(), 100);
    assert_eq!(alloc.free_region_count(), 1);
    assert_eq!(alloc.allocated_count(), 0);

    // Still fully usable afterwards.
    let c = alloc.allocate(100).unwrap();
    assert_eq!(alloc.offset_of(c), 0);
}

#[test]
fn test_block_iteration_in_offset_order() {
    let mut alloc = SubAllocator::new(100);
    let a = alloc.allocate(20).unwrap();
    alloc.allocate(30).unwrap();
    alloc.free(a);

    let blocks: Vec<_> = alloc.blocks().collect();
    assert_eq!(blocks.len(), 3);
    assert_eq!((blocks[0].offset, blocks[0].size, blocks[0].free), (0, 20, true));
    assert_eq!((blocks[1].offset, blocks[1].size, blocks[1].free), (20, 30, false));
    assert_eq!((blocks[2].offset, blocks[2].size, blocks[2].free), (50, 50, true));

    let frees: Vec<_> = alloc.free_regions().collect();
    assert_eq!(frees.len(), 2);
    assert_eq!(frees[0].end(), 20);
    assert_eq!(frees[1].end(), 100);
}

#[test]
#[should_panic(expected = "allocation size must be positive")]
fn test_zero_size_allocation_panics() {
    let mut alloc = SubAllocator::new(100);
    let _ = alloc.allocate(0);
}

#[test]
#[should_panic(expected = "does not refer to a live allocation")]
fn test_double_free_panics() {
    let mut alloc = SubAllocator::new(100);
    let handle = alloc.allocate(10).unwrap();
    alloc.free(handle);
    alloc.free(handle);
}

#[test]
#[should_panic(expected = "does not refer to a live allocation")]
fn test_stale_handle_lookup_panics() {
    let mut alloc = SubAllocator::new(100);
    let handle = alloc.allocate(10).unwrap();
    alloc.free(handle);
    let _ = alloc.offset_of(handle);
}

#[test]
#[should_panic(expected = "grow size must be positive")]
fn test_zero_grow_size_panics() {
    let _ = SubAllocator::with_grow_size(100, 0);
}
