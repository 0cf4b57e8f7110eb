//! ALU arithmetic operations.
//!
//! Operands are interpreted as signed 32-bit integers. Results wrap on
//! overflow and the overflow bit is reported alongside the value.

use super::AluResult;
use crate::common::error::Fault;
use crate::isa::instruction::AluOp;

/// Executes an integer arithmetic operation.
///
/// # Arguments
///
/// * `op` - The ALU operation to perform (must be an arithmetic variant).
/// * `a`  - Dividend / first operand.
/// * `b`  - Divisor / second operand.
///
/// # Returns
///
/// The wrapped result and the signed-overflow bit. `Div` and `Mod` fail with
/// `Fault::DivideByZero` when `b` is zero; `i32::MIN / -1` wraps and reports
/// overflow. Non-arithmetic opcodes return `(0, false)`.
pub fn execute(op: AluOp, a: u32, b: u32) -> AluResult {
    let (a, b) = (a as i32, b as i32);
    let (value, overflow) = match op {
        AluOp::Add => a.overflowing_add(b),
        AluOp::Sub => a.overflowing_sub(b),
        AluOp::Mul => a.overflowing_mul(b),
        AluOp::Div => {
            if b == 0 {
                return Err(Fault::DivideByZero);
            }
            a.overflowing_div(b)
        }
        AluOp::Mod => {
            if b == 0 {
                return Err(Fault::DivideByZero);
            }
            a.overflowing_rem(b)
        }
        _ => (0, false),
    };
    Ok((value as u32, overflow))
}
