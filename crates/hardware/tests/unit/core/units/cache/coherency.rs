//! Coherency between sibling data caches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use pretty_assertions::assert_eq;
use smpvm_core::common::addr::PhysAddr;
use smpvm_core::common::sync::lock;
use smpvm_core::core::units::cache::{CacheController, DataCache, Selector};
use smpvm_core::soc::traits::MemoryBackend;
use smpvm_core::soc::{Memory, SharedMemory, share};

struct Bus {
    memory: SharedMemory,
    controller: Arc<CacheController>,
    caches: Vec<DataCache>,
}

impl Bus {
    fn new(cores: usize) -> Self {
        let memory = share(Memory::new(0x1000));
        let controller = Arc::new(CacheController::new(Arc::clone(&memory)));
        let caches = (0..cores)
            .map(|id| {
                let cache = DataCache::new(id, 8, Arc::clone(&memory), Arc::clone(&controller));
                controller.register(id, cache.lines());
                cache
            })
            .collect();
        Self {
            memory,
            controller,
            caches,
        }
    }

    fn backend(&self, addr: u32) -> u16 {
        lock(&self.memory).read_u16(PhysAddr(addr)).unwrap()
    }
}

#[test]
fn write_drops_every_sibling_copy() {
    let bus = Bus::new(3);
    for cache in &bus.caches {
        assert_eq!(cache.get(PhysAddr(0x40)).unwrap(), 0);
    }
    bus.caches[0].write(PhysAddr(0x40), 0xBEEF).unwrap();

    assert!(bus.caches[1].entry(PhysAddr(0x40)).is_none());
    assert!(bus.caches[2].entry(PhysAddr(0x40)).is_none());
    assert_eq!(bus.caches[0].entry(PhysAddr(0x40)).unwrap().value, 0xBEEF);
}

#[test]
fn miss_observes_a_dirty_sibling_value() {
    let bus = Bus::new(2);
    bus.caches[0].write(PhysAddr(0x80), 0x1234).unwrap();
    assert_eq!(bus.backend(0x80), 0);

    assert_eq!(bus.caches[1].get(PhysAddr(0x80)).unwrap(), 0x1234);
    assert_eq!(bus.backend(0x80), 0x1234);
    let owner = bus.caches[0].entry(PhysAddr(0x80)).unwrap();
    assert!(!owner.dirty);
    assert_eq!(owner.value, 0x1234);
}

#[test]
fn at_most_one_cache_holds_a_dirty_copy() {
    let bus = Bus::new(2);
    bus.caches[0].write(PhysAddr(0x10), 1).unwrap();
    bus.caches[1].write(PhysAddr(0x10), 2).unwrap();
    assert!(bus.caches[0].entry(PhysAddr(0x10)).is_none());
    assert_eq!(bus.caches[1].dirty_count(), 1);

    bus.caches[0].write_u8(PhysAddr(0x11), 0xFF).unwrap();
    assert!(bus.caches[1].entry(PhysAddr(0x10)).is_none());
    assert_eq!(bus.caches[0].get(PhysAddr(0x10)).unwrap(), 0xFF02);
}

#[test]
fn unregistered_cache_is_left_alone() {
    let bus = Bus::new(2);
    let _ = bus.caches[1].get(PhysAddr(0x20)).unwrap();
    bus.controller.unregister(1);
    assert_eq!(bus.controller.live_cores(), vec![0]);
    assert!(!bus.controller.is_registered(1));

    bus.caches[0].write(PhysAddr(0x20), 9).unwrap();
    assert_eq!(bus.caches[1].entry(PhysAddr(0x20)).unwrap().value, 0);

    bus.controller.unregister(1);
    bus.controller.unregister(42);
}

#[test]
fn structure_change_reaches_every_cache() {
    let bus = Bus::new(2);
    bus.caches[0].write(PhysAddr(0x100), 7).unwrap();
    let _ = bus.caches[1].get(PhysAddr(0x102)).unwrap();
    let _ = bus.caches[1].get(PhysAddr(0x002)).unwrap();

    bus.controller
        .on_memory_structure_change(Selector::Page(1), true);

    assert!(bus.caches[0].is_empty());
    assert_eq!(bus.caches[1].len(), 1);
    assert_eq!(bus.backend(0x100), 7);
}

#[test]
fn structure_change_without_writeback_discards() {
    let bus = Bus::new(1);
    bus.caches[0].write(PhysAddr(0x200), 3).unwrap();
    bus.controller.on_memory_structure_change(
        Selector::Range {
            start: PhysAddr(0x200),
            len: 4,
        },
        false,
    );
    assert!(bus.caches[0].is_empty());
    assert_eq!(bus.backend(0x200), 0);
}

#[test]
fn concurrent_writers_serialize_through_the_bus() {
    let bus = Bus::new(2);
    std::thread::scope(|s| {
        for (id, cache) in bus.caches.iter().enumerate() {
            s.spawn(move || {
                for i in 0..200u16 {
                    let addr = PhysAddr(0x300 + u32::from(i % 8) * 2);
                    cache.write(addr, ((id as u16) << 12) | i).unwrap();
                    let _ = cache.get(PhysAddr(0x300)).unwrap();
                }
            });
        }
    });

    for slot in 0..8 {
        let addr = PhysAddr(0x300 + slot * 2);
        let holders: Vec<_> = bus
            .caches
            .iter()
            .filter_map(|cache| cache.entry(addr))
            .filter(|entry| entry.dirty)
            .collect();
        assert!(holders.len() <= 1, "two dirty copies of {addr}");
    }
}

#[test]
fn byte_stores_to_one_halfword_do_not_lose_updates() {
    let bus = Bus::new(2);
    let start = Barrier::new(2);
    let lost = AtomicUsize::new(0);
    let (a, b) = (&bus.caches[0], &bus.caches[1]);

    std::thread::scope(|s| {
        s.spawn(|| {
            start.wait();
            for i in 0..20_000u32 {
                a.write_u8(PhysAddr(0x40), i as u8).unwrap();
            }
        });
        s.spawn(|| {
            start.wait();
            for i in 0..20_000u32 {
                let value = (i as u8).wrapping_mul(7) | 1;
                b.write_u8(PhysAddr(0x41), value).unwrap();
                if b.read_u8(PhysAddr(0x41)).unwrap() != value {
                    lost.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
    });

    assert_eq!(lost.load(Ordering::Relaxed), 0);
}

#[test]
fn word_accesses_are_never_torn() {
    let bus = Bus::new(2);
    let start = Barrier::new(2);
    let torn = AtomicUsize::new(0);
    let (writer, reader) = (&bus.caches[0], &bus.caches[1]);

    std::thread::scope(|s| {
        s.spawn(|| {
            start.wait();
            for i in 0..20_000u32 {
                let value = if i % 2 == 0 { 0 } else { u32::MAX };
                writer.write_u32(PhysAddr(0x80), value).unwrap();
            }
        });
        s.spawn(|| {
            start.wait();
            for _ in 0..20_000 {
                let value = reader.read_u32(PhysAddr(0x80)).unwrap();
                if value != 0 && value != u32::MAX {
                    torn.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
    });

    assert_eq!(torn.load(Ordering::Relaxed), 0);
}
