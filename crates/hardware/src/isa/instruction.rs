//! Instruction encoding and decoded instruction types.
//!
//! Provides bit extraction helpers for the fixed 32-bit instruction word and the
//! tagged `Instruction` enum every instruction set decodes into.
//!
//! Word layout:
//!
//! ```text
//!  31             17 16 15    11 10     6 5      0
//! +-----------------+--+--------+--------+--------+
//! |     imm15       |i |  reg2  |  reg1  | opcode |
//! +-----------------+--+--------+--------+--------+
//! ```
//!
//! Memory instructions reuse bits 31-16 as a signed 16-bit offset; `LI` takes a
//! signed 21-bit immediate from bits 31-11 and `LIU` an unsigned 16-bit immediate
//! from bits 31-16.

use crate::common::reg::Register;

/// Bit mask for the opcode field (bits 0-5).
pub const OPCODE_MASK: u32 = 0x3F;
/// Bit mask for a register field (5 bits).
pub const REG_MASK: u32 = 0x1F;
/// Bit position of the first register field.
pub const REG1_SHIFT: u32 = 6;
/// Bit position of the second register field.
pub const REG2_SHIFT: u32 = 11;
/// Bit position of the immediate flag.
pub const IMM_FLAG_SHIFT: u32 = 16;
/// Bit position of the 15-bit immediate.
pub const IMM15_SHIFT: u32 = 17;
/// Bit position of the 16-bit offset / unsigned immediate.
pub const IMM16_SHIFT: u32 = 16;
/// Bit position of the 21-bit immediate used by `LI`.
pub const IMM21_SHIFT: u32 = 11;

/// Sign-extends the low `bits` bits of `value`.
#[inline(always)]
pub const fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// Field extraction on raw instruction words.
pub trait InstructionBits {
    /// Opcode field (bits 0-5).
    fn opcode(&self) -> u8;
    /// First register field (bits 6-10).
    fn reg1(&self) -> u8;
    /// Second register field (bits 11-15).
    fn reg2(&self) -> u8;
    /// Immediate flag (bit 16).
    fn has_imm(&self) -> bool;
    /// Signed 15-bit immediate (bits 17-31).
    fn imm15(&self) -> i32;
    /// Signed 16-bit memory offset (bits 16-31).
    fn offset16(&self) -> i16;
    /// Unsigned 16-bit immediate (bits 16-31).
    fn uimm16(&self) -> u16;
    /// Signed 21-bit immediate (bits 11-31).
    fn imm21(&self) -> i32;
}

impl InstructionBits for u32 {
    #[inline(always)]
    fn opcode(&self) -> u8 {
        (self & OPCODE_MASK) as u8
    }

    #[inline(always)]
    fn reg1(&self) -> u8 {
        ((self >> REG1_SHIFT) & REG_MASK) as u8
    }

    #[inline(always)]
    fn reg2(&self) -> u8 {
        ((self >> REG2_SHIFT) & REG_MASK) as u8
    }

    #[inline(always)]
    fn has_imm(&self) -> bool {
        (self >> IMM_FLAG_SHIFT) & 1 != 0
    }

    #[inline(always)]
    fn imm15(&self) -> i32 {
        sign_extend(self >> IMM15_SHIFT, 15)
    }

    #[inline(always)]
    fn offset16(&self) -> i16 {
        (self >> IMM16_SHIFT) as u16 as i16
    }

    #[inline(always)]
    fn uimm16(&self) -> u16 {
        (self >> IMM16_SHIFT) as u16
    }

    #[inline(always)]
    fn imm21(&self) -> i32 {
        sign_extend(self >> IMM21_SHIFT, 21)
    }
}

/// Second operand: a register or a sign-extended immediate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Value of a register.
    Reg(Register),
    /// Immediate value.
    Imm(i32),
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reg(r) => write!(f, "{r}"),
            Self::Imm(v) if *v < 0 => write!(f, "-{:#x}", v.unsigned_abs()),
            Self::Imm(v) => write!(f, "{v:#x}"),
        }
    }
}

/// Two-operand ALU operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Wrapping multiplication.
    Mul,
    /// Signed division.
    Div,
    /// Signed remainder.
    Mod,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Logical left shift.
    Shl,
    /// Logical right shift.
    Shr,
}

/// Branch conditions evaluated against FLAGS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Unconditional.
    Always,
    /// `equal` set.
    Equal,
    /// `equal` clear.
    NotEqual,
    /// `zero` set.
    Zero,
    /// `zero` clear.
    NotZero,
    /// `sign` set.
    Sign,
    /// `sign` clear.
    NotSign,
    /// Neither `equal` nor `sign`: lhs > rhs.
    Greater,
    /// `sign` set and `equal` clear: lhs < rhs.
    Less,
}

/// Width of a memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    /// 8 bits, zero-extended on load.
    Byte,
    /// 16 bits, zero-extended on load.
    Half,
    /// 32 bits.
    Word,
}

/// Math coprocessor operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathOp {
    /// Push a register, sign-extended to 64 bits.
    PushW(Register),
    /// Push a register, zero-extended to 64 bits.
    PushUW(Register),
    /// Pop into a register, keeping the low 32 bits.
    PopW(Register),
    /// Pop into a register, keeping the high 32 bits.
    PopUW(Register),
    /// Replace the two topmost values with their sum.
    Add,
    /// Replace the two topmost values with their difference.
    Sub,
    /// Replace the two topmost values with their product.
    Mul,
    /// Replace the two topmost values with their signed quotient.
    Div,
    /// Replace the two topmost values with their signed remainder.
    Mod,
    /// Increment the top value.
    Inc,
    /// Decrement the top value.
    Dec,
    /// Duplicate the top value.
    Dup,
    /// Discard the top value.
    Drop,
    /// Swap the two topmost values.
    Swap,
}

/// A decoded instruction.
///
/// Instruction sets decode into the variants they own; the core only dispatches the
/// value back to the set that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// No operation.
    Nop,
    /// Halt the core with an exit code.
    Hlt {
        /// Exit code.
        code: Operand,
    },
    /// Suspend the core until the next hardware interrupt.
    Idle,
    /// Software interrupt.
    Int {
        /// Interrupt index.
        index: Operand,
    },
    /// Return from an interrupt handler.
    Retint,
    /// Call a subroutine; an immediate target is IP-relative.
    Call {
        /// Call target.
        target: Operand,
    },
    /// Return from a subroutine.
    Ret,
    /// Disable hardware interrupts.
    Cli,
    /// Enable hardware interrupts.
    Sti,
    /// Leave privileged mode.
    Lpm,
    /// Switch the active instruction set.
    Sis {
        /// Instruction set id.
        set: Operand,
    },
    /// Load a sign-extended immediate.
    Li {
        /// Destination.
        dst: Register,
        /// Immediate value.
        imm: i32,
    },
    /// Load an immediate into the upper half of a register.
    Liu {
        /// Destination.
        dst: Register,
        /// Upper 16 bits.
        imm: u16,
    },
    /// Copy a register.
    Mov {
        /// Destination.
        dst: Register,
        /// Source.
        src: Register,
    },
    /// Two-operand ALU operation `dst = dst op src`.
    Alu {
        /// Operation.
        op: AluOp,
        /// Destination and first operand.
        dst: Register,
        /// Second operand.
        src: Operand,
    },
    /// Bitwise NOT.
    Not {
        /// Destination.
        dst: Register,
    },
    /// Increment.
    Inc {
        /// Destination.
        dst: Register,
    },
    /// Decrement.
    Dec {
        /// Destination.
        dst: Register,
    },
    /// Compare and set flags.
    Cmp {
        /// Left-hand side.
        lhs: Register,
        /// Right-hand side.
        rhs: Operand,
    },
    /// Jump or conditional branch; an immediate target is IP-relative.
    Jump {
        /// Branch condition.
        cond: Condition,
        /// Target.
        target: Operand,
    },
    /// Load from `DS:base+offset`.
    Load {
        /// Access width.
        width: Width,
        /// Destination.
        dst: Register,
        /// Base register.
        base: Register,
        /// Signed byte offset.
        offset: i16,
    },
    /// Store to `DS:base+offset`.
    Store {
        /// Access width.
        width: Width,
        /// Source.
        src: Register,
        /// Base register.
        base: Register,
        /// Signed byte offset.
        offset: i16,
    },
    /// Push a value on the stack.
    Push {
        /// Value.
        src: Operand,
    },
    /// Pop a value from the stack.
    Pop {
        /// Destination.
        dst: Register,
    },
    /// Math coprocessor operation.
    Math(MathOp),
}
