//! ALU shift operations.
//!
//! Both shifts are logical. The shift amount is masked to 5 bits (0-31).

use crate::isa::instruction::AluOp;

/// Bit mask for the shift amount (5 bits: 0-31).
const SHAMT_MASK: u32 = 0x1f;

/// Executes a shift operation.
///
/// # Arguments
///
/// * `op` - `Shl` or `Shr`.
/// * `a`  - The value to be shifted.
/// * `b`  - The shift amount (lower 5 bits used).
///
/// # Returns
///
/// The shifted value. Returns `0` for non-shift opcodes.
pub fn execute(op: AluOp, a: u32, b: u32) -> u32 {
    let sh = b & SHAMT_MASK;
    match op {
        AluOp::Shl => a << sh,
        AluOp::Shr => a >> sh,
        _ => 0,
    }
}
