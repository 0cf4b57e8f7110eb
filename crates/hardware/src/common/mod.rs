//! Common utilities and types used throughout the VM.
//!
//! This module provides fundamental building blocks shared across all components. It includes:
//! 1. **Address Types:** Physical addresses and segment translation.
//! 2. **Constants:** Machine-wide constants for memory, instructions, and registers.
//! 3. **Error Handling:** Faults, memory errors, and control errors.
//! 4. **Register Management:** The per-core register file.

/// Address type definitions and segment translation.
pub mod addr;

/// Common constants used throughout the VM.
pub mod constants;

/// Error types and fault definitions.
pub mod error;

/// Register file implementation.
pub mod reg;

/// Poison-tolerant locking for shared state.
pub mod sync;

pub use addr::{PhysAddr, segment_addr};
pub use constants::{INSTRUCTION_SIZE, PAGE_SIZE};
pub use error::{CpuError, Fault, MemoryError};
pub use reg::{Register, RegisterFile};
