//! Cache Coherency Controller.
//!
//! Keeps the per-core data caches consistent with each other. The controller holds
//! a registry of line stores indexed by core id (an arena of `Option` slots) and
//! relays three kinds of broadcast:
//! 1. **Write:** A core modified an address; every other core drops its copy.
//! 2. **Read Miss:** A core is about to fill an address; every other core writes
//!    back a dirty copy so the fill observes the latest value.
//! 3. **Structure Change:** A page was freed or an area unmapped; every core,
//!    including the originator, releases the affected entries.
//!
//! Broadcasts never fail. A core absent from the registry is skipped, and a
//! backend error during a write-back is logged and otherwise ignored.
//!
//! The registry lock is released before any line store is locked, so a broadcast
//! can run while another core is inside its own cache. Cache misses and writes are
//! serialized by the bus lock: a miss holds it across its `on_read_miss` broadcast
//! and its fill, a write across its store and its `on_write` broadcast. Lock order is
//! bus, then line store, then memory.

use std::sync::{Mutex, MutexGuard};

use super::dcache::{Selector, SharedLines};
use crate::common::addr::PhysAddr;
use crate::common::sync::lock;
use crate::soc::SharedMemory;

/// Registry of data caches and coherency broadcast hub.
pub struct CacheController {
    memory: SharedMemory,
    slots: Mutex<Vec<Option<SharedLines>>>,
    bus: Mutex<()>,
}

impl std::fmt::Debug for CacheController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheController")
            .field("live_cores", &self.live_cores())
            .finish_non_exhaustive()
    }
}

impl CacheController {
    /// Creates a controller with an empty registry.
    pub fn new(memory: SharedMemory) -> Self {
        Self {
            memory,
            slots: Mutex::new(Vec::new()),
            bus: Mutex::new(()),
        }
    }

    /// Acquires the bus for one coherency transaction.
    ///
    /// `on_write` and `on_read_miss` expect the caller to hold the bus; without it
    /// a sibling's write can slip between a miss broadcast and the fill that follows.
    pub fn bus(&self) -> MutexGuard<'_, ()> {
        lock(&self.bus)
    }

    /// Registers the line store of `core`, replacing any previous registration.
    pub fn register(&self, core: usize, lines: SharedLines) {
        let mut slots = lock(&self.slots);
        if slots.len() <= core {
            slots.resize_with(core + 1, || None);
        }
        slots[core] = Some(lines);
        tracing::debug!(core, "data cache registered");
    }

    /// Removes `core` from the registry. Unknown cores are ignored.
    pub fn unregister(&self, core: usize) {
        let removed = lock(&self.slots)
            .get_mut(core)
            .and_then(Option::take)
            .is_some();
        if removed {
            tracing::debug!(core, "data cache unregistered");
        }
    }

    /// Returns `true` if `core` is registered.
    pub fn is_registered(&self, core: usize) -> bool {
        lock(&self.slots)
            .get(core)
            .is_some_and(Option::is_some)
    }

    /// Returns the ids of every registered core in ascending order.
    pub fn live_cores(&self) -> Vec<usize> {
        lock(&self.slots)
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|_| id))
            .collect()
    }

    fn targets(&self, exclude: Option<usize>) -> Vec<(usize, SharedLines)> {
        lock(&self.slots)
            .iter()
            .enumerate()
            .filter(|(id, _)| Some(*id) != exclude)
            .filter_map(|(id, slot)| slot.as_ref().map(|lines| (id, SharedLines::clone(lines))))
            .collect()
    }

    fn broadcast(&self, exclude: Option<usize>, selector: Selector, writeback: bool, remove: bool) {
        for (core, lines) in self.targets(exclude) {
            let mut store = lock(&lines);
            let mut memory = lock(&self.memory);
            if let Err(err) = store.release(selector, writeback, remove, &mut *memory) {
                tracing::warn!(core, ?selector, %err, "coherency release failed");
            }
        }
    }

    /// A core modified `addr`: every other registered core drops its copy.
    pub fn on_write(&self, originator: usize, addr: PhysAddr) {
        self.broadcast(Some(originator), Selector::Address(addr), false, true);
    }

    /// A core missed on `addr`: every other registered core writes back a dirty
    /// copy and keeps it cached.
    pub fn on_read_miss(&self, requester: usize, addr: PhysAddr) {
        self.broadcast(Some(requester), Selector::Address(addr), true, false);
    }

    /// Memory layout changed under `selector`: every registered core releases the
    /// matching entries, writing dirty ones back first when `writeback` is set.
    pub fn on_memory_structure_change(&self, selector: Selector, writeback: bool) {
        let _bus = self.bus();
        tracing::debug!(?selector, writeback, "memory structure change");
        self.broadcast(None, selector, writeback, true);
    }
}
