//! Fault and Error definitions.
//!
//! This module defines the error taxonomy of the VM. It provides:
//! 1. **Faults:** Conditions raised while a core executes an instruction. Every fault
//!    reaching the step boundary kills the core that raised it.
//! 2. **Memory Errors:** Failures reported by the memory backend (bounds, alignment,
//!    page allocation).
//! 3. **Control Errors:** Misuse of the CPU control surface (booting a running core,
//!    passing more init states than there are cores).

use thiserror::Error;

/// Errors reported by a memory backend.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The access touches bytes past the end of physical memory.
    #[error("access at {addr:#010x} ({size} bytes) is out of bounds")]
    OutOfBounds {
        /// First byte of the access.
        addr: u32,
        /// Width of the access in bytes.
        size: u32,
    },

    /// A multi-byte access is not aligned to its width.
    #[error("unaligned {size}-byte access at {addr:#010x}")]
    Unaligned {
        /// Faulting address.
        addr: u32,
        /// Width of the access in bytes.
        size: u32,
    },

    /// No free page is left (in the requested segment, if any).
    #[error("no free page available")]
    NoFreePage,

    /// The page exists but is not currently allocated.
    #[error("page {0} is not allocated")]
    PageNotAllocated(u32),

    /// The page index lies outside physical memory.
    #[error("page {0} does not exist")]
    InvalidPage(u32),
}

/// Faults raised while a core fetches, decodes, or executes an instruction.
///
/// Decode-time faults (`InvalidOpcode`, `InvalidInstructionSet`) and runtime faults
/// are all fatal: the core dies with exit code 1.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Fault {
    /// The fetched word does not encode an instruction of the active set.
    #[error("invalid opcode {opcode:#04x} in instruction {raw:#010x}")]
    InvalidOpcode {
        /// Opcode field of the word.
        opcode: u8,
        /// The full instruction word.
        raw: u32,
    },

    /// The requested instruction set is not installed.
    #[error("invalid instruction set {0}")]
    InvalidInstructionSet(u8),

    /// Protected register, privileged instruction, or other access while unprivileged.
    #[error("access violation: {0}")]
    AccessViolation(String),

    /// Integer division or modulo by zero.
    #[error("division by zero")]
    DivideByZero,

    /// Data access not aligned to its width.
    #[error("unaligned access at {0:#010x}")]
    UnalignedAccess(u32),

    /// Frame bookkeeping is unbalanced; the stack is corrupted.
    #[error("invalid frame: expected SP {expected:#010x}, found {found:#010x}")]
    InvalidFrame {
        /// SP recorded when the frame was created.
        expected: u32,
        /// SP observed when the frame was destroyed.
        found: u32,
    },

    /// Math coprocessor stack overflow or underflow.
    #[error("coprocessor stack {0}")]
    CoprocessorStack(&'static str),

    /// Error propagated from the memory backend.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

impl Fault {
    /// Maps a memory error to a fault, turning alignment errors into `UnalignedAccess`.
    pub fn from_memory(err: MemoryError) -> Self {
        match err {
            MemoryError::Unaligned { addr, .. } => Self::UnalignedAccess(addr),
            other => Self::Memory(other),
        }
    }

    /// Returns `true` for faults detected while decoding rather than executing.
    pub const fn is_decode_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidOpcode { .. } | Self::InvalidInstructionSet(_)
        )
    }
}

/// Errors raised by the CPU control surface.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CpuError {
    /// An operation was requested in a state that does not allow it.
    #[error("core {core} cannot {action} in state {state}")]
    InvalidState {
        /// Core id.
        core: usize,
        /// Requested operation.
        action: &'static str,
        /// State name at the time of the request.
        state: &'static str,
    },

    /// More init states than cores were supplied to `Cpu::boot`.
    #[error("{given} init states supplied for {cores} cores")]
    TooManyInitStates {
        /// Number of init states supplied.
        given: usize,
        /// Number of cores in the CPU.
        cores: usize,
    },

    /// A core id does not name a core of this CPU.
    #[error("no such core: {0}")]
    NoSuchCore(usize),
}
