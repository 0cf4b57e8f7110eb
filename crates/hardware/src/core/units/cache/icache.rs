//! Instruction Cache.
//!
//! Maps physical fetch addresses to decoded instructions so hot loops are decoded
//! once. The cache is read-only: stores to code memory are not observed until the
//! cache is cleared, which happens on boot and on every instruction-set switch.

use super::lru::LruMap;
use crate::common::addr::PhysAddr;
use crate::common::error::Fault;
use crate::isa::instruction::Instruction;

/// Hit/miss counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that went through the fill path.
    pub misses: u64,
}

/// LRU cache of decoded instructions keyed by physical address.
#[derive(Debug)]
pub struct InstructionCache {
    entries: LruMap<PhysAddr, Instruction>,
    stats: CacheStats,
}

impl InstructionCache {
    /// Creates an empty cache holding at most `capacity` instructions.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruMap::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Returns the instruction at `addr`, decoding it on a miss.
    ///
    /// # Arguments
    ///
    /// * `addr` - Physical fetch address.
    /// * `fill` - Fetch-and-decode path invoked on a miss.
    ///
    /// # Returns
    ///
    /// The cached or freshly decoded instruction. A failing `fill` leaves the cache
    /// untouched and propagates its fault.
    pub fn get<F>(&mut self, addr: PhysAddr, fill: F) -> Result<Instruction, Fault>
    where
        F: FnOnce(PhysAddr) -> Result<Instruction, Fault>,
    {
        if let Some(inst) = self.entries.get(&addr) {
            self.stats.hits += 1;
            return Ok(*inst);
        }
        self.stats.misses += 1;
        let inst = fill(addr)?;
        let _ = self.entries.insert(addr, inst);
        Ok(inst)
    }

    /// Drops every cached instruction.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached instructions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `addr` is cached. Does not affect recency.
    pub fn contains(&self, addr: PhysAddr) -> bool {
        self.entries.contains(&addr)
    }

    /// Returns the hit/miss counters.
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }
}
