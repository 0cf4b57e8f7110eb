//! Global Machine Constants.
//!
//! This module defines machine-wide constants used across the VM. It includes:
//! 1. **Memory Constants:** Page and segment geometry of the physical address space.
//! 2. **Instruction Constants:** Fixed instruction width.
//! 3. **Register Constants:** Register file shape and operand encodings.
//! 4. **Interrupt Constants:** Interrupt vector record layout.

/// Page size in bytes.
pub const PAGE_SIZE: u32 = 256;

/// Number of bits to shift to convert between bytes and pages.
pub const PAGE_SHIFT: u32 = 8;

/// Mask for extracting the page offset from an address.
pub const PAGE_OFFSET_MASK: u32 = PAGE_SIZE - 1;

/// Size of one segment in bytes (64 KiB).
///
/// A segment selector scales into the physical address space by this factor.
pub const SEGMENT_SIZE: u32 = 0x1_0000;

/// Number of pages covered by a single segment.
pub const PAGES_PER_SEGMENT: u32 = SEGMENT_SIZE / PAGE_SIZE;

/// Width of every instruction in bytes.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Width of a stack slot in bytes; every push and pop moves SP by this amount.
pub const STACK_SLOT_SIZE: u32 = 4;

/// Number of general-purpose registers (`r0`-`r29`).
pub const GENERAL_REGISTER_COUNT: usize = 30;

/// Operand encoding that selects the frame pointer.
pub const OPERAND_FP: u8 = 30;

/// Operand encoding that selects the stack pointer.
pub const OPERAND_SP: u8 = 31;

/// Size of one interrupt vector record in bytes: `cs:u16 ds:u16 ip:u32 sp:u32`.
pub const INTERRUPT_VECTOR_SIZE: u32 = 12;

/// Number of entries in an interrupt vector table.
pub const INTERRUPT_COUNT: u32 = 64;

/// Exit code reported by a core that died on an unhandled fault.
pub const FAULT_EXIT_CODE: u32 = 1;

/// Default data cache capacity in entries.
pub const DCACHE_ENTRIES: usize = 1024;

/// Default instruction cache capacity in entries.
pub const ICACHE_ENTRIES: usize = 256;

/// Depth of the math coprocessor register stack.
pub const MATH_STACK_DEPTH: usize = 8;
