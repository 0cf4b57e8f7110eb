//! Paged physical memory.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use smpvm_core::common::addr::{PhysAddr, page_base};
use smpvm_core::common::constants::{PAGE_SIZE, PAGES_PER_SEGMENT};
use smpvm_core::common::error::MemoryError;
use smpvm_core::soc::memory::pages_for;
use smpvm_core::soc::{Memory, MemoryBackend};

#[test]
fn size_rounds_up_to_whole_pages() {
    let memory = Memory::new(PAGE_SIZE + 1);
    assert_eq!(memory.size(), PAGE_SIZE * 2);
    assert_eq!(memory.page_count(), 2);
    assert_eq!(Memory::new(0).page_count(), 1);
}

#[rstest]
#[case(0, 1)]
#[case(PAGE_SIZE, 1)]
#[case(0xFFFF_FF00, 0xFF_FFFF)]
#[case(0xFFFF_FF01, 0xFF_FFFF)]
#[case(u32::MAX, 0xFF_FFFF)]
fn page_count_caps_at_the_address_space(#[case] size: u32, #[case] pages: u32) {
    assert_eq!(pages_for(size), pages);
    assert!(u64::from(pages_for(size)) * u64::from(PAGE_SIZE) <= u64::from(u32::MAX));
}

#[test]
fn segment_restricted_allocation_exhausts_independently() {
    let mut memory = Memory::new(PAGE_SIZE * PAGES_PER_SEGMENT * 2);
    for i in 0..PAGES_PER_SEGMENT {
        assert_eq!(memory.alloc_page(Some(1)).unwrap(), PAGES_PER_SEGMENT + i);
    }
    assert_eq!(memory.alloc_page(Some(1)), Err(MemoryError::NoFreePage));
    assert_eq!(memory.alloc_page(None).unwrap(), 0);
    assert_eq!(memory.alloc_page(Some(7)), Err(MemoryError::NoFreePage));
}

#[test]
fn page_bookkeeping_errors() {
    let mut memory = Memory::new(PAGE_SIZE * 4);
    assert_eq!(memory.free_page(1), Err(MemoryError::PageNotAllocated(1)));
    assert_eq!(memory.free_page(4), Err(MemoryError::InvalidPage(4)));
    assert_eq!(memory.get_page(9), Err(MemoryError::InvalidPage(9)));

    let info = memory.get_page(3).unwrap();
    assert_eq!(info.base, page_base(3));
    assert!(!info.allocated);
}

#[test]
fn reserve_covers_partial_pages_and_checks_bounds() {
    let mut memory = Memory::new(PAGE_SIZE * 4);
    memory.reserve(PhysAddr(PAGE_SIZE + 10), 1).unwrap();
    assert!(memory.get_page(1).unwrap().allocated);
    assert_eq!(memory.free_page_count(), 3);

    memory.reserve(PhysAddr(0), 0).unwrap();
    assert_eq!(memory.free_page_count(), 3);

    assert_eq!(
        memory.reserve(PhysAddr(PAGE_SIZE * 3), PAGE_SIZE + 1),
        Err(MemoryError::OutOfBounds {
            addr: PAGE_SIZE * 3,
            size: PAGE_SIZE + 1,
        })
    );
    assert_eq!(memory.free_page_count(), 3);
}

#[test]
fn accesses_past_the_end_are_rejected() {
    let mut memory = Memory::new(PAGE_SIZE);
    assert_eq!(
        memory.read_u8(PhysAddr(PAGE_SIZE)),
        Err(MemoryError::OutOfBounds {
            addr: PAGE_SIZE,
            size: 1,
        })
    );
    assert!(memory.load(PhysAddr(PAGE_SIZE - 2), &[0; 4]).is_err());
    assert_eq!(
        memory.write_u16(PhysAddr(3), 1),
        Err(MemoryError::Unaligned { addr: 3, size: 2 })
    );
}

#[test]
fn vector_lookup_outside_memory_fails() {
    let memory = Memory::new(PAGE_SIZE);
    assert!(matches!(
        memory.load_interrupt_vector(PhysAddr(0), 40),
        Err(MemoryError::OutOfBounds { .. })
    ));
}

proptest! {
    #[test]
    fn free_count_tracks_allocations(allocs in 0u32..16, frees in 0u32..16) {
        let mut memory = Memory::new(PAGE_SIZE * 16);
        let pages: Vec<u32> = (0..allocs)
            .map(|_| memory.alloc_page(None).unwrap())
            .collect();
        let freed = frees.min(allocs);
        for &page in pages.iter().take(freed as usize) {
            memory.free_page(page).unwrap();
        }
        prop_assert_eq!(memory.free_page_count(), 16 - allocs + freed);
    }
}
