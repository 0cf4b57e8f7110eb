//! Per-core caches and the coherency protocol.
//!
//! This module provides the cache hierarchy sitting between a core and the shared
//! memory backend:
//! 1. **LRU Map:** The fixed-capacity least-recently-used container both caches use.
//! 2. **Instruction Cache:** Decoded instructions keyed by fetch address.
//! 3. **Data Cache:** A write-back halfword cache with dirty tracking.
//! 4. **Coherency:** The controller that keeps data caches of sibling cores in sync.

/// Cache coherency controller.
pub mod coherency;

/// Write-back data cache.
pub mod dcache;

/// Decoded-instruction cache.
pub mod icache;

/// Least-recently-used map.
pub mod lru;

pub use coherency::CacheController;
pub use dcache::{CacheEntry, DataCache, DataCacheStats, LineStore, Selector, SharedLines};
pub use icache::{CacheStats, InstructionCache};
pub use lru::LruMap;
