//! Segment translation and page arithmetic.

use rstest::rstest;
use smpvm_core::common::addr::{PhysAddr, page_base, segment_addr, segment_of};

#[rstest]
#[case(0, 0, 0)]
#[case(1, 0, 0x1_0000)]
#[case(2, 0x1234, 0x2_1234)]
#[case(1, 0x1_0000, 0x2_0000)]
#[case(0xFFFF, 0xFFFF, 0xFFFF_FFFF)]
fn segment_translation(#[case] segment: u32, #[case] offset: u32, #[case] expected: u32) {
    assert_eq!(segment_addr(segment, offset), PhysAddr(expected));
}

#[test]
fn segment_translation_wraps_in_32_bits() {
    assert_eq!(segment_addr(0x1_0000, 4), PhysAddr(4));
}

#[rstest]
#[case(0x00, 0)]
#[case(0xFF, 0)]
#[case(0x100, 1)]
#[case(0x2_01FF, 0x201)]
fn page_index(#[case] addr: u32, #[case] page: u32) {
    assert_eq!(PhysAddr(addr).page(), page);
    assert_eq!(page_base(page).page(), page);
}

#[test]
fn halfword_rounds_down() {
    assert_eq!(PhysAddr(7).halfword(), PhysAddr(6));
    assert_eq!(PhysAddr(6).halfword(), PhysAddr(6));
}

#[test]
fn segment_of_inverts_translation() {
    assert_eq!(segment_of(segment_addr(3, 0xFFFE)), 3);
}
