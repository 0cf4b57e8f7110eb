//! ALU bitwise logical operations.

use crate::isa::instruction::AluOp;

/// Executes a bitwise logical operation.
///
/// Returns `0` for non-logical opcodes.
pub fn execute(op: AluOp, a: u32, b: u32) -> u32 {
    match op {
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        _ => 0,
    }
}
