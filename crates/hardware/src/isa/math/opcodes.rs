//! Math Coprocessor Opcodes.
//!
//! Defines the opcode field values (bits 5-0) of instruction set 1. `SIS` shares
//! its value with the base set so code can always switch back.

/// No operation.
pub const NOP: u8 = 0;

/// Push register, sign-extended.
pub const PUSHW: u8 = 1;

/// Push register, zero-extended.
pub const PUSHUW: u8 = 2;

/// Pop low 32 bits into register.
pub const POPW: u8 = 3;

/// Pop high 32 bits into register.
pub const POPUW: u8 = 4;

/// Add the two topmost values.
pub const ADDL: u8 = 5;

/// Subtract the two topmost values.
pub const SUBL: u8 = 6;

/// Multiply the two topmost values.
pub const MULL: u8 = 7;

/// Divide the two topmost values.
pub const DIVL: u8 = 8;

/// Remainder of the two topmost values.
pub const MODL: u8 = 9;

/// Switch instruction set.
pub const SIS: u8 = 10;

/// Increment the top value.
pub const INCL: u8 = 11;

/// Decrement the top value.
pub const DECL: u8 = 12;

/// Duplicate the top value.
pub const DUPL: u8 = 13;

/// Discard the top value.
pub const DROP: u8 = 14;

/// Swap the two topmost values.
pub const SWPL: u8 = 15;
