//! Shared Memory System.
//!
//! This module organizes the memory side of the machine: the `MemoryBackend`
//! interface consumed by the cores, the paged `Memory` that implements it, and the
//! builder that assembles a `Cpu` around a shared backend.

/// Machine construction from configuration.
pub mod builder;

/// Paged physical memory implementation.
pub mod memory;

/// Memory backend trait definitions.
pub mod traits;

use std::sync::{Arc, Mutex};

pub use builder::CpuBuilder;
pub use memory::Memory;
pub use traits::{InterruptVector, MemoryBackend, PageInfo};

/// Memory backend shared by every core of a CPU.
pub type SharedMemory = Arc<Mutex<dyn MemoryBackend>>;

/// Wraps a backend into a `SharedMemory` handle.
pub fn share<M: MemoryBackend + 'static>(memory: M) -> SharedMemory {
    Arc::new(Mutex::new(memory))
}
