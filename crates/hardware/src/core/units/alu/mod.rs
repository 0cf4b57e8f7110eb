//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer ALU used by the base instruction set.
//! Every operation works on 32-bit operands and reports whether the signed
//! result overflowed, so the caller can update FLAGS.
//!
//! Operations are organized into submodules by category:
//! - [`arithmetic`]: Add, Sub, Mul, Div, Mod
//! - [`logic`]:      And, Or, Xor
//! - [`shifts`]:     Shl, Shr

/// Integer arithmetic operations (add, subtract, multiply, divide, modulo).
pub mod arithmetic;

/// Bitwise logical operations (and, or, xor).
pub mod logic;

/// Shift operations (shl, shr).
pub mod shifts;

use crate::common::error::Fault;
use crate::isa::instruction::AluOp;

/// Result of an ALU operation: the 32-bit value and the signed-overflow bit.
pub type AluResult = Result<(u32, bool), Fault>;

/// Arithmetic Logic Unit (ALU) for integer operations.
#[derive(Debug)]
pub struct Alu;

impl Alu {
    /// Executes an integer ALU operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The ALU operation to perform
    /// * `a`  - First operand (also the destination register's old value)
    /// * `b`  - Second operand (shift amount for shifts)
    ///
    /// # Returns
    ///
    /// The result and whether signed overflow occurred, or
    /// `Fault::DivideByZero` for `Div`/`Mod` with a zero divisor.
    ///
    /// # Examples
    ///
    /// ```
    /// use smpvm_core::core::units::alu::Alu;
    /// use smpvm_core::isa::instruction::AluOp;
    ///
    /// assert_eq!(Alu::execute(AluOp::Add, 42, 8).unwrap(), (50, false));
    /// assert!(Alu::execute(AluOp::Add, i32::MAX as u32, 1).unwrap().1);
    /// assert_eq!(Alu::execute(AluOp::Shl, 1, 4).unwrap(), (0x10, false));
    /// assert!(Alu::execute(AluOp::Div, 1, 0).is_err());
    /// ```
    pub fn execute(op: AluOp, a: u32, b: u32) -> AluResult {
        match op {
            AluOp::Add | AluOp::Sub | AluOp::Mul | AluOp::Div | AluOp::Mod => {
                arithmetic::execute(op, a, b)
            }
            AluOp::And | AluOp::Or | AluOp::Xor => Ok((logic::execute(op, a, b), false)),
            AluOp::Shl | AluOp::Shr => Ok((shifts::execute(op, a, b), false)),
        }
    }
}
