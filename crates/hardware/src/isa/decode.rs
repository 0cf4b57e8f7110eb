//! Operand extraction.
//!
//! Helpers shared by the instruction set decoders to turn instruction word fields
//! into typed operands.

use crate::common::reg::Register;
use crate::isa::instruction::{InstructionBits, Operand};

/// Register named by the first register field.
#[inline]
pub fn reg1(raw: u32) -> Register {
    Register::from_operand(raw.reg1())
}

/// Register named by the second register field.
#[inline]
pub fn reg2(raw: u32) -> Register {
    Register::from_operand(raw.reg2())
}

/// Single operand: the 15-bit immediate when the immediate flag is set, otherwise
/// the register in the first register field.
#[inline]
pub fn unary_operand(raw: u32) -> Operand {
    if raw.has_imm() {
        Operand::Imm(raw.imm15())
    } else {
        Operand::Reg(reg1(raw))
    }
}

/// Second operand of a two-operand instruction: the 15-bit immediate when the
/// immediate flag is set, otherwise the register in the second register field.
#[inline]
pub fn binary_operand(raw: u32) -> Operand {
    if raw.has_imm() {
        Operand::Imm(raw.imm15())
    } else {
        Operand::Reg(reg2(raw))
    }
}
