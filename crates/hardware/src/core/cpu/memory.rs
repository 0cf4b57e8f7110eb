//! Memory Access Helpers.
//!
//! This module provides the interface between a core and the memory subsystem.
//! It performs the following:
//! 1. **Segment Translation:** Turns CS- and DS-relative offsets into physical addresses.
//! 2. **Stack Access:** Pushes and pops 32-bit values at `DS:SP` through the data cache.
//! 3. **Page Services:** Allocates and frees pages with the coherency broadcasts the
//!    other cores need to stay consistent.

use super::CpuCore;
use crate::common::addr::{PhysAddr, segment_addr};
use crate::common::constants::STACK_SLOT_SIZE;
use crate::common::error::{Fault, MemoryError};
use crate::common::sync::lock;
use crate::core::units::cache::Selector;
use crate::soc::traits::MemoryBackend;

impl CpuCore {
    /// Physical address of CS-relative `offset`.
    #[inline]
    pub fn code_addr(&self, offset: u32) -> PhysAddr {
        segment_addr(self.regs.cs, offset)
    }

    /// Physical address of DS-relative `offset`.
    #[inline]
    pub fn data_addr(&self, offset: u32) -> PhysAddr {
        segment_addr(self.regs.ds, offset)
    }

    /// Pushes a word: `SP -= 4`, then stores `value` at `DS:SP`.
    ///
    /// SP is only updated once the store succeeded.
    pub fn push(&mut self, value: u32) -> Result<(), Fault> {
        let sp = self.regs.sp.wrapping_sub(STACK_SLOT_SIZE);
        self.dcache.write_u32(self.data_addr(sp), value)?;
        self.regs.sp = sp;
        Ok(())
    }

    /// Pops a word: loads from `DS:SP`, then `SP += 4`.
    pub fn pop(&mut self) -> Result<u32, Fault> {
        let value = self.dcache.read_u32(self.data_addr(self.regs.sp))?;
        self.regs.sp = self.regs.sp.wrapping_add(STACK_SLOT_SIZE);
        Ok(value)
    }

    /// Allocates a zeroed page, optionally restricted to `segment`.
    ///
    /// Every core drops cached entries of the page so none of them serves data
    /// from its previous life.
    pub fn alloc_page(&mut self, segment: Option<u32>) -> Result<u32, Fault> {
        let page = lock(&self.memory)
            .alloc_page(segment)
            .map_err(Fault::from_memory)?;
        self.controller
            .on_memory_structure_change(Selector::Page(page), false);
        Ok(page)
    }

    /// Frees `page` after every core dropped its cached entries of it.
    pub fn free_page(&mut self, page: u32) -> Result<(), Fault> {
        let info = lock(&self.memory)
            .get_page(page)
            .map_err(Fault::from_memory)?;
        if !info.allocated {
            return Err(Fault::Memory(MemoryError::PageNotAllocated(page)));
        }
        self.controller
            .on_memory_structure_change(Selector::Page(page), false);
        lock(&self.memory)
            .free_page(page)
            .map_err(Fault::from_memory)
    }

    /// Number of free pages in the backend.
    pub fn free_page_count(&self) -> u32 {
        lock(&self.memory).free_page_count()
    }
}
