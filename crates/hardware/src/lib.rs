//! Multi-core 32-bit virtual machine library.
//!
//! This crate implements the core of a segmented 32-bit VM with the following:
//! 1. **Core:** Register file, lifecycle state machine, stack frames, interrupts, and backtraces.
//! 2. **Memory:** A shared paged memory behind per-core write-back data caches kept
//!    coherent by a broadcast controller, plus an LRU instruction cache per core.
//! 3. **ISA:** Pluggable instruction sets; a base set and a math coprocessor set ship by default.
//! 4. **SoC:** The memory backend interface and the builder assembling a `Cpu`.
//! 5. **Simulation:** Image loading, round-robin scheduling, and timer interrupts.
//!
//! # Examples
//!
//! ```
//! use smpvm_core::common::{PhysAddr, Register};
//! use smpvm_core::core::CoreInitState;
//! use smpvm_core::isa::base::opcodes;
//! use smpvm_core::isa::encode;
//! use smpvm_core::{Config, Simulator};
//!
//! // li r0, 5 ; hlt r0
//! let r0 = Register::General(0);
//! let words = [encode::li(r0, 5), encode::reg1(opcodes::HLT, r0)];
//! let mut sim = Simulator::new(&Config::default());
//! sim.load(PhysAddr(0x1_0000), &encode::to_bytes(&words)).unwrap();
//! sim.boot(&[CoreInitState { cs: 1, ds: 1, sp: 0x8000, ip: 0, privileged: true }])
//!     .unwrap();
//! assert_eq!(sim.run(Some(100)).unwrap(), 5);
//! ```

/// Common types and constants (addresses, registers, errors, locking).
pub mod common;
/// Machine configuration (defaults and hierarchical config structures).
pub mod config;
/// CPU cores (state machine, caches, coherency, interrupts, observers).
pub mod core;
/// Instruction sets (instruction model, decode, encode, disassembly, execution).
pub mod isa;
/// Image loading and the round-robin simulator.
pub mod sim;
/// Memory backend and machine construction.
pub mod soc;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Multi-core CPU; build one with `CpuBuilder`.
pub use crate::core::Cpu;
/// A single core.
pub use crate::core::CpuCore;
/// Round-robin driver for a `Cpu`.
pub use crate::sim::Simulator;
/// Builder assembling a `Cpu` from configuration.
pub use crate::soc::CpuBuilder;
