//! Processor Flags.
//!
//! The FLAGS register holds the privilege bit, the hardware-interrupt enable bit and
//! the four condition flags set by arithmetic and comparison instructions. The packed
//! `u32` form is what interrupt entry pushes on the stack.

use serde::{Deserialize, Serialize};

/// Bit position of the privileged flag in the packed representation.
pub const FLAG_PRIVILEGED: u32 = 1 << 0;
/// Bit position of the hardware-interrupt enable flag.
pub const FLAG_HWINT: u32 = 1 << 1;
/// Bit position of the equal flag.
pub const FLAG_EQUAL: u32 = 1 << 2;
/// Bit position of the zero flag.
pub const FLAG_ZERO: u32 = 1 << 3;
/// Bit position of the overflow flag.
pub const FLAG_OVERFLOW: u32 = 1 << 4;
/// Bit position of the sign flag.
pub const FLAG_SIGN: u32 = 1 << 5;

/// Processor flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// Protected registers, ports, and instructions are accessible.
    pub privileged: bool,
    /// Hardware interrupts are delivered.
    pub hwint_enabled: bool,
    /// Last comparison found both operands equal.
    pub equal: bool,
    /// Last result was zero.
    pub zero: bool,
    /// Last arithmetic operation overflowed.
    pub overflow: bool,
    /// Last result was negative (signed).
    pub sign: bool,
}

impl Flags {
    /// Packs the flags into their register representation.
    pub const fn to_u32(self) -> u32 {
        let mut v = 0;
        if self.privileged {
            v |= FLAG_PRIVILEGED;
        }
        if self.hwint_enabled {
            v |= FLAG_HWINT;
        }
        if self.equal {
            v |= FLAG_EQUAL;
        }
        if self.zero {
            v |= FLAG_ZERO;
        }
        if self.overflow {
            v |= FLAG_OVERFLOW;
        }
        if self.sign {
            v |= FLAG_SIGN;
        }
        v
    }

    /// Unpacks flags from their register representation. Unknown bits are ignored.
    pub const fn from_u32(v: u32) -> Self {
        Self {
            privileged: v & FLAG_PRIVILEGED != 0,
            hwint_enabled: v & FLAG_HWINT != 0,
            equal: v & FLAG_EQUAL != 0,
            zero: v & FLAG_ZERO != 0,
            overflow: v & FLAG_OVERFLOW != 0,
            sign: v & FLAG_SIGN != 0,
        }
    }

    /// Updates zero, sign, and overflow from an arithmetic result.
    pub const fn update_arith(&mut self, result: u32, overflow: bool) {
        self.zero = result == 0;
        self.sign = (result as i32) < 0;
        self.overflow = overflow;
    }

    /// Updates the flags after a comparison of `lhs` with `rhs`.
    ///
    /// `equal` is set when the operands match, `zero` when both are zero, and
    /// `sign` when `lhs` is less than `rhs` as signed integers.
    pub const fn update_compare(&mut self, lhs: u32, rhs: u32) {
        self.equal = lhs == rhs;
        self.zero = lhs == 0 && rhs == 0;
        self.sign = (lhs as i32) < (rhs as i32);
        self.overflow = false;
    }
}
