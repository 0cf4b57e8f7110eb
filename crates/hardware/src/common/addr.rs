//! Segmented Address helpers.
//!
//! Guest code addresses memory through a segment selector (CS for code, DS for
//! data) and a 32-bit offset. This module provides:
//! 1. **Type Safety:** A `PhysAddr` newtype separating physical addresses from offsets.
//! 2. **Translation:** Segment-relative to physical address conversion.
//! 3. **Page Arithmetic:** Page index and page base helpers used by caches and memory.

use super::constants::{PAGE_SHIFT, PAGE_SIZE, SEGMENT_SIZE};

/// A physical address in the shared memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u32);

impl PhysAddr {
    /// Creates a new physical address from a raw value.
    #[inline(always)]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw address value.
    #[inline(always)]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Returns the index of the page containing this address.
    #[inline(always)]
    pub const fn page(self) -> u32 {
        self.0 >> PAGE_SHIFT
    }

    /// Returns the address rounded down to a 2-byte boundary.
    #[inline(always)]
    pub const fn halfword(self) -> Self {
        Self(self.0 & !1)
    }

    /// Returns this address advanced by `offset` bytes, wrapping in 32 bits.
    #[inline(always)]
    pub const fn offset(self, offset: u32) -> Self {
        Self(self.0.wrapping_add(offset))
    }
}

impl std::fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Translates a segment-relative offset to a physical address.
///
/// # Arguments
///
/// * `segment` - Segment selector (value of CS or DS).
/// * `offset` - Byte offset within the segment.
#[inline(always)]
pub const fn segment_addr(segment: u32, offset: u32) -> PhysAddr {
    PhysAddr(segment.wrapping_mul(SEGMENT_SIZE).wrapping_add(offset))
}

/// Returns the physical base address of a page.
#[inline(always)]
pub const fn page_base(page: u32) -> PhysAddr {
    PhysAddr(page.wrapping_mul(PAGE_SIZE))
}

/// Returns the segment selector that contains a physical address.
#[inline(always)]
pub const fn segment_of(addr: PhysAddr) -> u32 {
    addr.0 / SEGMENT_SIZE
}
