//! Physical Memory.
//!
//! This module implements the shared physical memory. It provides:
//! 1. **Storage:** A flat little-endian byte array split into 256-byte pages.
//! 2. **Allocation:** A page bitmap backing `alloc_page` / `free_page`.
//! 3. **Reservation:** Marking loaded regions so the allocator never hands them out.

use crate::common::addr::{PhysAddr, page_base};
use crate::common::constants::{PAGE_SHIFT, PAGE_SIZE, PAGES_PER_SEGMENT};
use crate::common::error::MemoryError;
use crate::soc::traits::{MemoryBackend, PageInfo};

/// Paged physical memory.
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
    allocated: Vec<bool>,
}

/// Largest page count whose byte size still fits a `u32`.
const MAX_PAGES: u32 = u32::MAX / PAGE_SIZE;

/// Number of pages backing `size` bytes: rounded up to whole pages, at least one,
/// and capped at `MAX_PAGES`.
pub const fn pages_for(size: u32) -> u32 {
    let pages = size.div_ceil(PAGE_SIZE);
    if pages == 0 {
        1
    } else if pages > MAX_PAGES {
        MAX_PAGES
    } else {
        pages
    }
}

impl Memory {
    /// Creates a zero-filled memory of `size` bytes, rounded up to whole pages.
    ///
    /// Sizes past the last whole page of the address space are capped there.
    pub fn new(size: u32) -> Self {
        let pages = pages_for(size) as usize;
        Self {
            data: vec![0; pages * PAGE_SIZE as usize],
            allocated: vec![false; pages],
        }
    }

    /// Returns the number of pages.
    pub fn page_count(&self) -> u32 {
        self.allocated.len() as u32
    }

    fn range(&self, addr: PhysAddr, size: u32) -> Result<std::ops::Range<usize>, MemoryError> {
        if size > 1 && addr.val() % size != 0 {
            return Err(MemoryError::Unaligned {
                addr: addr.val(),
                size,
            });
        }
        let start = addr.val() as usize;
        let end = start + size as usize;
        if end > self.data.len() {
            return Err(MemoryError::OutOfBounds {
                addr: addr.val(),
                size,
            });
        }
        Ok(start..end)
    }

    fn check_page(&self, page: u32) -> Result<(), MemoryError> {
        if page as usize >= self.allocated.len() {
            return Err(MemoryError::InvalidPage(page));
        }
        Ok(())
    }
}

impl MemoryBackend for Memory {
    fn size(&self) -> u32 {
        self.data.len() as u32
    }

    fn read_u8(&self, addr: PhysAddr) -> Result<u8, MemoryError> {
        let r = self.range(addr, 1)?;
        Ok(self.data[r.start])
    }

    fn read_u16(&self, addr: PhysAddr) -> Result<u16, MemoryError> {
        let r = self.range(addr, 2)?;
        Ok(u16::from_le_bytes([self.data[r.start], self.data[r.start + 1]]))
    }

    fn read_u32(&self, addr: PhysAddr) -> Result<u32, MemoryError> {
        let r = self.range(addr, 4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[r]);
        Ok(u32::from_le_bytes(bytes))
    }

    fn write_u8(&mut self, addr: PhysAddr, val: u8) -> Result<(), MemoryError> {
        let r = self.range(addr, 1)?;
        self.data[r.start] = val;
        Ok(())
    }

    fn write_u16(&mut self, addr: PhysAddr, val: u16) -> Result<(), MemoryError> {
        let r = self.range(addr, 2)?;
        self.data[r].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    fn write_u32(&mut self, addr: PhysAddr, val: u32) -> Result<(), MemoryError> {
        let r = self.range(addr, 4)?;
        self.data[r].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    fn alloc_page(&mut self, segment: Option<u32>) -> Result<u32, MemoryError> {
        let (first, last) = match segment {
            Some(seg) => {
                let first = seg.saturating_mul(PAGES_PER_SEGMENT);
                (first, first.saturating_add(PAGES_PER_SEGMENT))
            }
            None => (0, self.page_count()),
        };
        let last = last.min(self.page_count());
        let page = (first..last)
            .find(|&p| !self.allocated[p as usize])
            .ok_or(MemoryError::NoFreePage)?;
        self.allocated[page as usize] = true;
        let start = page_base(page).val() as usize;
        self.data[start..start + PAGE_SIZE as usize].fill(0);
        Ok(page)
    }

    fn free_page(&mut self, page: u32) -> Result<(), MemoryError> {
        self.check_page(page)?;
        if !self.allocated[page as usize] {
            return Err(MemoryError::PageNotAllocated(page));
        }
        self.allocated[page as usize] = false;
        Ok(())
    }

    fn get_page(&self, page: u32) -> Result<PageInfo, MemoryError> {
        self.check_page(page)?;
        Ok(PageInfo {
            index: page,
            base: page_base(page),
            allocated: self.allocated[page as usize],
        })
    }

    fn reserve(&mut self, addr: PhysAddr, len: u32) -> Result<(), MemoryError> {
        if len == 0 {
            return Ok(());
        }
        let end = addr
            .val()
            .checked_add(len)
            .filter(|&end| end <= self.size())
            .ok_or(MemoryError::OutOfBounds {
                addr: addr.val(),
                size: len,
            })?;
        let first = addr.page();
        let last = (end - 1) >> PAGE_SHIFT;
        for page in first..=last {
            self.allocated[page as usize] = true;
        }
        Ok(())
    }

    fn free_page_count(&self) -> u32 {
        self.allocated.iter().filter(|a| !**a).count() as u32
    }

    fn load(&mut self, addr: PhysAddr, data: &[u8]) -> Result<(), MemoryError> {
        let start = addr.val() as usize;
        let end = start + data.len();
        if end > self.data.len() {
            return Err(MemoryError::OutOfBounds {
                addr: addr.val(),
                size: data.len() as u32,
            });
        }
        self.data[start..end].copy_from_slice(data);
        Ok(())
    }
}
