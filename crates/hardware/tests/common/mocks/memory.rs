use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mockall::mock;
use smpvm_core::common::addr::PhysAddr;
use smpvm_core::common::error::MemoryError;
use smpvm_core::soc::memory::Memory;
use smpvm_core::soc::traits::{MemoryBackend, PageInfo};

mock! {
    pub Backend {}
    impl MemoryBackend for Backend {
        fn size(&self) -> u32;
        fn read_u8(&self, addr: PhysAddr) -> Result<u8, MemoryError>;
        fn read_u16(&self, addr: PhysAddr) -> Result<u16, MemoryError>;
        fn read_u32(&self, addr: PhysAddr) -> Result<u32, MemoryError>;
        fn write_u8(&mut self, addr: PhysAddr, val: u8) -> Result<(), MemoryError>;
        fn write_u16(&mut self, addr: PhysAddr, val: u16) -> Result<(), MemoryError>;
        fn write_u32(&mut self, addr: PhysAddr, val: u32) -> Result<(), MemoryError>;
        fn alloc_page(&mut self, segment: Option<u32>) -> Result<u32, MemoryError>;
        fn free_page(&mut self, page: u32) -> Result<(), MemoryError>;
        fn get_page(&self, page: u32) -> Result<PageInfo, MemoryError>;
        fn free_page_count(&self) -> u32;
    }
}

/// Access counters shared between a `CountingMemory` and the test.
#[derive(Clone, Default)]
pub struct AccessCounts {
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl AccessCounts {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }
}

/// A real `Memory` that counts every data access reaching it.
pub struct CountingMemory {
    inner: Memory,
    counts: AccessCounts,
}

impl CountingMemory {
    pub fn new(size: u32) -> (Self, AccessCounts) {
        let counts = AccessCounts::default();
        (
            Self {
                inner: Memory::new(size),
                counts: counts.clone(),
            },
            counts,
        )
    }

    fn read(&self) {
        let _ = self.counts.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) {
        let _ = self.counts.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl MemoryBackend for CountingMemory {
    fn size(&self) -> u32 {
        self.inner.size()
    }

    fn read_u8(&self, addr: PhysAddr) -> Result<u8, MemoryError> {
        self.read();
        self.inner.read_u8(addr)
    }

    fn read_u16(&self, addr: PhysAddr) -> Result<u16, MemoryError> {
        self.read();
        self.inner.read_u16(addr)
    }

    fn read_u32(&self, addr: PhysAddr) -> Result<u32, MemoryError> {
        self.read();
        self.inner.read_u32(addr)
    }

    fn write_u8(&mut self, addr: PhysAddr, val: u8) -> Result<(), MemoryError> {
        self.write();
        self.inner.write_u8(addr, val)
    }

    fn write_u16(&mut self, addr: PhysAddr, val: u16) -> Result<(), MemoryError> {
        self.write();
        self.inner.write_u16(addr, val)
    }

    fn write_u32(&mut self, addr: PhysAddr, val: u32) -> Result<(), MemoryError> {
        self.write();
        self.inner.write_u32(addr, val)
    }

    fn alloc_page(&mut self, segment: Option<u32>) -> Result<u32, MemoryError> {
        self.inner.alloc_page(segment)
    }

    fn free_page(&mut self, page: u32) -> Result<(), MemoryError> {
        self.inner.free_page(page)
    }

    fn get_page(&self, page: u32) -> Result<PageInfo, MemoryError> {
        self.inner.get_page(page)
    }

    fn free_page_count(&self) -> u32 {
        self.inner.free_page_count()
    }

    fn reserve(&mut self, addr: PhysAddr, len: u32) -> Result<(), MemoryError> {
        self.inner.reserve(addr, len)
    }

    fn load(&mut self, addr: PhysAddr, data: &[u8]) -> Result<(), MemoryError> {
        self.inner.load(addr, data)
    }
}
