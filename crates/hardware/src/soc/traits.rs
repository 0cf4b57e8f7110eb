//! Memory backend trait.
//!
//! This module defines the `MemoryBackend` interface through which cores reach the
//! shared physical memory. It provides:
//! 1. **Access:** Byte, halfword, and word read/write at physical addresses.
//! 2. **Pages:** Allocation, release, and inspection of fixed-size pages.
//! 3. **Interrupts:** Interrupt vector lookup in a vector table.
//!
//! All implementors must be `Send` so a backend can sit behind the `Mutex` shared by
//! every core of a CPU.

use crate::common::addr::PhysAddr;
use crate::common::constants::INTERRUPT_VECTOR_SIZE;
use crate::common::error::MemoryError;

/// Descriptor of a single physical page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageInfo {
    /// Page index.
    pub index: u32,
    /// Physical address of the first byte of the page.
    pub base: PhysAddr,
    /// Whether the page is currently allocated.
    pub allocated: bool,
}

/// One entry of an interrupt vector table.
///
/// A zero `sp` asks the core to allocate a fresh stack page for the handler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InterruptVector {
    /// Code segment of the handler.
    pub cs: u16,
    /// Data segment of the handler.
    pub ds: u16,
    /// Handler entry point (CS-relative).
    pub ip: u32,
    /// Handler stack pointer (DS-relative), or 0 for an allocated page.
    pub sp: u32,
}

/// Shared physical memory as seen by the cores.
pub trait MemoryBackend: Send {
    /// Returns the size of physical memory in bytes.
    fn size(&self) -> u32;

    /// Reads one byte.
    fn read_u8(&self, addr: PhysAddr) -> Result<u8, MemoryError>;
    /// Reads two bytes (little-endian); `addr` must be 2-aligned.
    fn read_u16(&self, addr: PhysAddr) -> Result<u16, MemoryError>;
    /// Reads four bytes (little-endian); `addr` must be 4-aligned.
    fn read_u32(&self, addr: PhysAddr) -> Result<u32, MemoryError>;
    /// Writes one byte.
    fn write_u8(&mut self, addr: PhysAddr, val: u8) -> Result<(), MemoryError>;
    /// Writes two bytes (little-endian); `addr` must be 2-aligned.
    fn write_u16(&mut self, addr: PhysAddr, val: u16) -> Result<(), MemoryError>;
    /// Writes four bytes (little-endian); `addr` must be 4-aligned.
    fn write_u32(&mut self, addr: PhysAddr, val: u32) -> Result<(), MemoryError>;

    /// Allocates a free page, optionally restricted to a segment, and zeroes it.
    fn alloc_page(&mut self, segment: Option<u32>) -> Result<u32, MemoryError>;
    /// Returns an allocated page to the free pool.
    fn free_page(&mut self, page: u32) -> Result<(), MemoryError>;
    /// Describes a page.
    fn get_page(&self, page: u32) -> Result<PageInfo, MemoryError>;
    /// Returns the number of pages currently free.
    fn free_page_count(&self) -> u32;

    /// Marks every page overlapping `[addr, addr + len)` as allocated so the page
    /// allocator never hands it out.
    ///
    /// Used for loaded images, interrupt tables, and pre-provisioned stacks.
    /// Backends without an allocator accept any reservation.
    fn reserve(&mut self, addr: PhysAddr, len: u32) -> Result<(), MemoryError> {
        let _ = (addr, len);
        Ok(())
    }

    /// Loads the interrupt vector `index` of the table at `table`.
    fn load_interrupt_vector(
        &self,
        table: PhysAddr,
        index: u32,
    ) -> Result<InterruptVector, MemoryError> {
        let base = table.offset(index.wrapping_mul(INTERRUPT_VECTOR_SIZE));
        Ok(InterruptVector {
            cs: self.read_u16(base)?,
            ds: self.read_u16(base.offset(2))?,
            ip: self.read_u32(base.offset(4))?,
            sp: self.read_u32(base.offset(8))?,
        })
    }

    /// Copies `data` into memory starting at `addr`.
    fn load(&mut self, addr: PhysAddr, data: &[u8]) -> Result<(), MemoryError> {
        for (i, byte) in data.iter().enumerate() {
            self.write_u8(addr.offset(i as u32), *byte)?;
        }
        Ok(())
    }
}
