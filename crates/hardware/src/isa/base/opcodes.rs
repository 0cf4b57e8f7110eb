//! Base Instruction Set Opcodes.
//!
//! Defines the opcode field values (bits 5-0) of instruction set 0.

/// No operation.
pub const NOP: u8 = 0;

/// Halt the core (privileged).
pub const HLT: u8 = 1;

/// Suspend until the next hardware interrupt (privileged).
pub const IDLE: u8 = 2;

/// Software interrupt.
pub const INT: u8 = 3;

/// Return from interrupt (privileged).
pub const RETINT: u8 = 4;

/// Call subroutine.
pub const CALL: u8 = 5;

/// Return from subroutine.
pub const RET: u8 = 6;

/// Disable hardware interrupts (privileged).
pub const CLI: u8 = 7;

/// Enable hardware interrupts (privileged).
pub const STI: u8 = 8;

/// Leave privileged mode (privileged).
pub const LPM: u8 = 9;

/// Switch instruction set.
pub const SIS: u8 = 10;

/// Load sign-extended 21-bit immediate.
pub const LI: u8 = 11;

/// Load upper 16 bits.
pub const LIU: u8 = 12;

/// Register copy.
pub const MOV: u8 = 13;

/// Addition.
pub const ADD: u8 = 14;

/// Subtraction.
pub const SUB: u8 = 15;

/// Multiplication.
pub const MUL: u8 = 16;

/// Signed division.
pub const DIV: u8 = 17;

/// Signed remainder.
pub const MOD: u8 = 18;

/// Bitwise AND.
pub const AND: u8 = 19;

/// Bitwise OR.
pub const OR: u8 = 20;

/// Bitwise XOR.
pub const XOR: u8 = 21;

/// Logical shift left.
pub const SHL: u8 = 22;

/// Logical shift right.
pub const SHR: u8 = 23;

/// Bitwise NOT.
pub const NOT: u8 = 24;

/// Increment.
pub const INC: u8 = 25;

/// Decrement.
pub const DEC: u8 = 26;

/// Compare.
pub const CMP: u8 = 27;

/// Unconditional jump.
pub const J: u8 = 28;

/// Branch if equal.
pub const BE: u8 = 29;

/// Branch if not equal.
pub const BNE: u8 = 30;

/// Branch if zero.
pub const BZ: u8 = 31;

/// Branch if not zero.
pub const BNZ: u8 = 32;

/// Branch if sign.
pub const BS: u8 = 33;

/// Branch if not sign.
pub const BNS: u8 = 34;

/// Branch if greater.
pub const BG: u8 = 35;

/// Branch if less.
pub const BL: u8 = 36;

/// Load word.
pub const LW: u8 = 37;

/// Load short (halfword).
pub const LS: u8 = 38;

/// Load byte.
pub const LB: u8 = 39;

/// Store word.
pub const STW: u8 = 40;

/// Store short (halfword).
pub const STS: u8 = 41;

/// Store byte.
pub const STB: u8 = 42;

/// Push on stack.
pub const PUSH: u8 = 43;

/// Pop from stack.
pub const POP: u8 = 44;
