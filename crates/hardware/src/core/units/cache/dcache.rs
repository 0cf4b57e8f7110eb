//! Write-back Data Cache.
//!
//! Each core owns one `DataCache` that serves every data access the core makes. It
//! provides:
//! 1. **Storage:** An LRU map of halfword-aligned addresses to 16-bit values with a
//!    dirty bit. Entries own their values; the backend is touched only on fill and
//!    on explicit write-back.
//! 2. **Coherency:** Every write is announced to the `CacheController`, which drops
//!    sibling copies. Every miss first asks siblings to write back a dirty copy.
//! 3. **Typed Access:** Byte, halfword, and word helpers composed of halfword
//!    operations (words are little-endian: low half at `a`, high half at `a + 2`).
//!
//! The line store lives behind an `Arc<Mutex<_>>` so the controller can release
//! entries on behalf of other cores. Lock order is always controller bus, then line
//! store, then memory. Hits take only the line store lock.

use std::sync::{Arc, Mutex};

use super::coherency::CacheController;
use super::lru::LruMap;
use crate::common::addr::PhysAddr;
use crate::common::constants::PAGE_SHIFT;
use crate::common::error::{Fault, MemoryError};
use crate::common::sync::lock;
use crate::soc::SharedMemory;
use crate::soc::traits::MemoryBackend;

/// A cached halfword.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheEntry {
    /// The value differs from the backend and must be written back.
    pub dirty: bool,
    /// Cached value.
    pub value: u16,
}

/// Entries targeted by a release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
    /// The halfword containing one address.
    Address(PhysAddr),
    /// Every entry within a page.
    Page(u32),
    /// Every entry within `[start, start + len)`.
    Range {
        /// First byte of the range.
        start: PhysAddr,
        /// Length in bytes.
        len: u32,
    },
    /// Every entry.
    All,
}

impl Selector {
    /// Returns `true` if the entry keyed by `addr` falls under this selector.
    pub fn matches(&self, addr: PhysAddr) -> bool {
        match *self {
            Self::Address(a) => a.halfword() == addr,
            Self::Page(page) => addr.val() >> PAGE_SHIFT == page,
            Self::Range { start, len } => {
                let a = u64::from(addr.val());
                let s = u64::from(start.val());
                a >= s && a < s + u64::from(len)
            }
            Self::All => true,
        }
    }
}

/// Data cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DataCacheStats {
    /// Reads served from the cache.
    pub hits: u64,
    /// Reads and writes that had to fill from the backend.
    pub misses: u64,
    /// Entries evicted to make room.
    pub evictions: u64,
    /// Dirty entries written back to the backend.
    pub writebacks: u64,
}

/// The entries of one core's data cache.
#[derive(Debug)]
pub struct LineStore {
    lines: LruMap<PhysAddr, CacheEntry>,
    stats: DataCacheStats,
}

/// Line store shared between its core and the coherency controller.
pub type SharedLines = Arc<Mutex<LineStore>>;

impl LineStore {
    /// Creates an empty store holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: LruMap::new(capacity),
            stats: DataCacheStats::default(),
        }
    }

    /// Wraps a new store for sharing with the controller.
    pub fn shared(capacity: usize) -> SharedLines {
        Arc::new(Mutex::new(Self::new(capacity)))
    }

    /// Returns the cached value at `addr`, marking it most recently used.
    pub fn lookup(&mut self, addr: PhysAddr) -> Option<u16> {
        let value = self.lines.get(&addr).map(|e| e.value);
        if value.is_some() {
            self.stats.hits += 1;
        }
        value
    }

    fn insert(
        &mut self,
        addr: PhysAddr,
        entry: CacheEntry,
        memory: &mut dyn MemoryBackend,
    ) -> Result<(), MemoryError> {
        if let Some((victim, old)) = self.lines.insert(addr, entry) {
            self.stats.evictions += 1;
            if old.dirty {
                self.stats.writebacks += 1;
                memory.write_u16(victim, old.value)?;
            }
        }
        Ok(())
    }

    /// Inserts a clean value read from the backend.
    ///
    /// At capacity the LRU entry is evicted first and written back if dirty.
    pub fn fill(
        &mut self,
        addr: PhysAddr,
        value: u16,
        memory: &mut dyn MemoryBackend,
    ) -> Result<(), MemoryError> {
        self.stats.misses += 1;
        self.insert(addr, CacheEntry { dirty: false, value }, memory)
    }

    /// Stores a dirty value, evicting the LRU entry if `addr` is new and the
    /// store is full.
    pub fn store(
        &mut self,
        addr: PhysAddr,
        value: u16,
        memory: &mut dyn MemoryBackend,
    ) -> Result<(), MemoryError> {
        self.insert(addr, CacheEntry { dirty: true, value }, memory)
    }

    /// Writes back and/or drops every entry matching `selector`.
    ///
    /// # Arguments
    ///
    /// * `selector`  - Entries to release.
    /// * `writeback` - Flush dirty matching entries to `memory` first.
    /// * `remove`    - Drop matching entries (discarding dirty data unless written back).
    /// * `memory`    - Backend receiving write-backs.
    ///
    /// # Returns
    ///
    /// The number of matching entries.
    pub fn release(
        &mut self,
        selector: Selector,
        writeback: bool,
        remove: bool,
        memory: &mut dyn MemoryBackend,
    ) -> Result<usize, MemoryError> {
        let keys: Vec<PhysAddr> = match selector {
            Selector::Address(addr) => {
                let addr = addr.halfword();
                if self.lines.contains(&addr) {
                    vec![addr]
                } else {
                    Vec::new()
                }
            }
            _ => self.lines.keys().filter(|k| selector.matches(*k)).collect(),
        };

        if writeback {
            for (addr, entry) in self.lines.iter_mut() {
                if entry.dirty && selector.matches(*addr) {
                    memory.write_u16(*addr, entry.value)?;
                    entry.dirty = false;
                    self.stats.writebacks += 1;
                }
            }
        }
        if remove {
            for addr in &keys {
                let _ = self.lines.remove(addr);
            }
        }
        Ok(keys.len())
    }

    /// Returns the entry at `addr` without affecting recency.
    pub fn entry(&self, addr: PhysAddr) -> Option<CacheEntry> {
        self.lines.peek(&addr).copied()
    }

    /// Returns `true` if `addr` is cached.
    pub fn contains(&self, addr: PhysAddr) -> bool {
        self.lines.contains(&addr)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.lines.capacity()
    }

    /// Number of dirty entries.
    pub fn dirty_count(&self) -> usize {
        self.lines.iter().filter(|(_, e)| e.dirty).count()
    }

    /// Returns the counters.
    pub const fn stats(&self) -> DataCacheStats {
        self.stats
    }
}

/// A core's write-back data cache.
pub struct DataCache {
    core: usize,
    lines: SharedLines,
    memory: SharedMemory,
    controller: Arc<CacheController>,
}

impl std::fmt::Debug for DataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCache")
            .field("core", &self.core)
            .field("entries", &lock(&self.lines).len())
            .finish_non_exhaustive()
    }
}

fn check_alignment(addr: PhysAddr, size: u32) -> Result<(), Fault> {
    if addr.val() % size != 0 {
        return Err(Fault::UnalignedAccess(addr.val()));
    }
    Ok(())
}

impl DataCache {
    /// Creates the data cache of core `core`.
    ///
    /// # Arguments
    ///
    /// * `core`       - Id of the owning core, used in coherency broadcasts.
    /// * `capacity`   - Maximum number of cached halfwords.
    /// * `memory`     - Shared backend.
    /// * `controller` - Coherency controller the cache reports to.
    pub fn new(
        core: usize,
        capacity: usize,
        memory: SharedMemory,
        controller: Arc<CacheController>,
    ) -> Self {
        Self {
            core,
            lines: LineStore::shared(capacity),
            memory,
            controller,
        }
    }

    /// Returns the shared line store, as registered with the controller.
    pub fn lines(&self) -> SharedLines {
        Arc::clone(&self.lines)
    }

    /// Reads the halfword at `addr` (must be 2-aligned).
    ///
    /// A miss first has siblings write back any dirty copy, then fills a clean
    /// entry from the backend.
    pub fn get(&self, addr: PhysAddr) -> Result<u16, Fault> {
        check_alignment(addr, 2)?;
        if let Some(value) = lock(&self.lines).lookup(addr) {
            return Ok(value);
        }

        let _bus = self.controller.bus();
        self.get_locked(addr)
    }

    /// Writes the halfword at `addr` (must be 2-aligned) and invalidates sibling
    /// copies.
    pub fn write(&self, addr: PhysAddr, value: u16) -> Result<(), Fault> {
        check_alignment(addr, 2)?;
        let _bus = self.controller.bus();
        self.write_locked(addr, value)
    }

    /// `get` for a caller already holding the bus.
    fn get_locked(&self, addr: PhysAddr) -> Result<u16, Fault> {
        if let Some(value) = lock(&self.lines).lookup(addr) {
            return Ok(value);
        }
        self.controller.on_read_miss(self.core, addr);

        let mut store = lock(&self.lines);
        let mut memory = lock(&self.memory);
        let value = memory.read_u16(addr).map_err(Fault::from_memory)?;
        store
            .fill(addr, value, &mut *memory)
            .map_err(Fault::from_memory)?;
        Ok(value)
    }

    /// `write` for a caller already holding the bus.
    fn write_locked(&self, addr: PhysAddr, value: u16) -> Result<(), Fault> {
        {
            let mut store = lock(&self.lines);
            let mut memory = lock(&self.memory);
            if !store.contains(addr) {
                let current = memory.read_u16(addr).map_err(Fault::from_memory)?;
                store
                    .fill(addr, current, &mut *memory)
                    .map_err(Fault::from_memory)?;
            }
            store
                .store(addr, value, &mut *memory)
                .map_err(Fault::from_memory)?;
        }
        self.controller.on_write(self.core, addr);
        Ok(())
    }

    /// Reads one byte.
    pub fn read_u8(&self, addr: PhysAddr) -> Result<u8, Fault> {
        let half = self.get(addr.halfword())?;
        Ok((half >> ((addr.val() & 1) * 8)) as u8)
    }

    /// Reads a halfword (must be 2-aligned).
    pub fn read_u16(&self, addr: PhysAddr) -> Result<u16, Fault> {
        self.get(addr)
    }

    /// Reads a word (must be 4-aligned). Both halves are read in one bus
    /// transaction.
    pub fn read_u32(&self, addr: PhysAddr) -> Result<u32, Fault> {
        check_alignment(addr, 4)?;
        let _bus = self.controller.bus();
        let lo = self.get_locked(addr)?;
        let hi = self.get_locked(addr.offset(2))?;
        Ok(u32::from(lo) | (u32::from(hi) << 16))
    }

    /// Writes one byte by read-modify-writing its halfword under a single bus
    /// transaction.
    pub fn write_u8(&self, addr: PhysAddr, value: u8) -> Result<(), Fault> {
        let base = addr.halfword();
        let shift = (addr.val() & 1) * 8;
        let _bus = self.controller.bus();
        let half = self.get_locked(base)?;
        let merged = (half & !(0xFF << shift)) | (u16::from(value) << shift);
        self.write_locked(base, merged)
    }

    /// Writes a halfword (must be 2-aligned).
    pub fn write_u16(&self, addr: PhysAddr, value: u16) -> Result<(), Fault> {
        self.write(addr, value)
    }

    /// Writes a word (must be 4-aligned).
    pub fn write_u32(&self, addr: PhysAddr, value: u32) -> Result<(), Fault> {
        check_alignment(addr, 4)?;
        let _bus = self.controller.bus();
        self.write_locked(addr, value as u16)?;
        self.write_locked(addr.offset(2), (value >> 16) as u16)
    }

    /// Writes back and/or drops the entries matching `selector`.
    ///
    /// Returns the number of matching entries.
    pub fn release(&self, selector: Selector, writeback: bool, remove: bool) -> Result<usize, Fault> {
        let mut store = lock(&self.lines);
        let mut memory = lock(&self.memory);
        store
            .release(selector, writeback, remove, &mut *memory)
            .map_err(Fault::from_memory)
    }

    /// Writes every dirty entry back, keeping the entries cached.
    pub fn flush(&self) -> Result<usize, Fault> {
        self.release(Selector::All, true, false)
    }

    /// Returns the entry at `addr` without affecting recency.
    pub fn entry(&self, addr: PhysAddr) -> Option<CacheEntry> {
        lock(&self.lines).entry(addr)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        lock(&self.lines).len()
    }

    /// Returns `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        lock(&self.lines).is_empty()
    }

    /// Number of dirty entries.
    pub fn dirty_count(&self) -> usize {
        lock(&self.lines).dirty_count()
    }

    /// Returns the counters.
    pub fn stats(&self) -> DataCacheStats {
        lock(&self.lines).stats()
    }
}
