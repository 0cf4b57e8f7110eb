//! Core processor implementation.
//!
//! This module contains everything that executes guest code. It includes:
//! 1. **Architecture:** The packed FLAGS register.
//! 2. **Cores:** `CpuCore`, its lifecycle, execution step, frames, and interrupts.
//! 3. **SMP:** `Cpu`, the set of cores sharing one memory and coherency controller.
//! 4. **Units:** The ALU and the instruction and data caches.
//! 5. **Hooks:** Virtual interrupts, execution observers, and symbol resolution.

/// Architectural register layouts.
pub mod arch;

/// Single core: state machine, execution, frames, and interrupts.
pub mod cpu;

/// Host-implemented (virtual) interrupts.
pub mod interrupts;

/// Execution event observers.
pub mod observer;

/// Multi-core CPU.
pub mod smp;

/// Symbol lookup for backtraces.
pub mod symbols;

/// Execution units (ALU, instruction cache, data cache, coherency).
pub mod units;

pub use self::cpu::{CoreInitState, CoreState, CpuCore};
pub use self::smp::Cpu;
