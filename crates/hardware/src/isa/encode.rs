//! Instruction Encoder.
//!
//! Builds raw instruction words. The format helpers encode one field layout each
//! and truncate out-of-range fields; `encode` maps a decoded instruction back to its
//! word and rejects anything the format cannot represent.
//!
//! Only `r0`-`r29`, `fp`, and `sp` are addressable by instructions. The format
//! helpers encode any other register as `r0`.

use crate::common::reg::Register;
use crate::isa::instruction::{
    AluOp, Condition, IMM15_SHIFT, IMM16_SHIFT, IMM21_SHIFT, IMM_FLAG_SHIFT, Instruction, MathOp,
    OPCODE_MASK, Operand, REG1_SHIFT, REG2_SHIFT, Width,
};
use crate::isa::{base::opcodes as base, math::opcodes as math};

/// Smallest value representable by the 15-bit immediate.
pub const IMM15_MIN: i32 = -(1 << 14);
/// Largest value representable by the 15-bit immediate.
pub const IMM15_MAX: i32 = (1 << 14) - 1;
/// Smallest value representable by the `LI` immediate.
pub const IMM21_MIN: i32 = -(1 << 20);
/// Largest value representable by the `LI` immediate.
pub const IMM21_MAX: i32 = (1 << 20) - 1;

#[inline]
fn index(reg: Register) -> u32 {
    u32::from(reg.to_operand().unwrap_or(0))
}

/// Instruction without operands.
pub const fn op(opcode: u8) -> u32 {
    opcode as u32 & OPCODE_MASK
}

/// Instruction with one register operand.
pub fn reg1(opcode: u8, r1: Register) -> u32 {
    op(opcode) | (index(r1) << REG1_SHIFT)
}

/// Instruction with two register operands.
pub fn reg2(opcode: u8, r1: Register, r2: Register) -> u32 {
    reg1(opcode, r1) | (index(r2) << REG2_SHIFT)
}

/// Instruction with a single immediate operand.
pub const fn imm(opcode: u8, value: i32) -> u32 {
    op(opcode) | (1 << IMM_FLAG_SHIFT) | ((value as u32) << IMM15_SHIFT)
}

/// Instruction with a register and an immediate operand.
pub fn reg_imm(opcode: u8, r1: Register, value: i32) -> u32 {
    imm(opcode, value) | (index(r1) << REG1_SHIFT)
}

/// Load or store: data register, base register, signed byte offset.
pub fn mem(opcode: u8, data: Register, base: Register, offset: i16) -> u32 {
    reg2(opcode, data, base) | (u32::from(offset as u16) << IMM16_SHIFT)
}

/// `LI dst, value` (21-bit signed immediate).
pub fn li(dst: Register, value: i32) -> u32 {
    reg1(base::LI, dst) | ((value as u32) << IMM21_SHIFT)
}

/// `LIU dst, value`.
pub fn liu(dst: Register, value: u16) -> u32 {
    reg1(base::LIU, dst) | (u32::from(value) << IMM16_SHIFT)
}

fn fits15(value: i32) -> bool {
    (IMM15_MIN..=IMM15_MAX).contains(&value)
}

fn addressable(reg: Register) -> bool {
    reg.to_operand().is_some()
}

fn unary(opcode: u8, operand: Operand) -> Option<u32> {
    match operand {
        Operand::Reg(r) if addressable(r) => Some(reg1(opcode, r)),
        Operand::Imm(v) if fits15(v) => Some(imm(opcode, v)),
        _ => None,
    }
}

fn binary(opcode: u8, dst: Register, src: Operand) -> Option<u32> {
    if !addressable(dst) {
        return None;
    }
    match src {
        Operand::Reg(r) if addressable(r) => Some(reg2(opcode, dst, r)),
        Operand::Imm(v) if fits15(v) => Some(reg_imm(opcode, dst, v)),
        _ => None,
    }
}

fn single(opcode: u8, reg: Register) -> Option<u32> {
    addressable(reg).then(|| reg1(opcode, reg))
}

const fn alu_opcode(op: AluOp) -> u8 {
    match op {
        AluOp::Add => base::ADD,
        AluOp::Sub => base::SUB,
        AluOp::Mul => base::MUL,
        AluOp::Div => base::DIV,
        AluOp::Mod => base::MOD,
        AluOp::And => base::AND,
        AluOp::Or => base::OR,
        AluOp::Xor => base::XOR,
        AluOp::Shl => base::SHL,
        AluOp::Shr => base::SHR,
    }
}

const fn branch_opcode(cond: Condition) -> u8 {
    match cond {
        Condition::Always => base::J,
        Condition::Equal => base::BE,
        Condition::NotEqual => base::BNE,
        Condition::Zero => base::BZ,
        Condition::NotZero => base::BNZ,
        Condition::Sign => base::BS,
        Condition::NotSign => base::BNS,
        Condition::Greater => base::BG,
        Condition::Less => base::BL,
    }
}

const fn load_opcode(width: Width) -> u8 {
    match width {
        Width::Word => base::LW,
        Width::Half => base::LS,
        Width::Byte => base::LB,
    }
}

const fn store_opcode(width: Width) -> u8 {
    match width {
        Width::Word => base::STW,
        Width::Half => base::STS,
        Width::Byte => base::STB,
    }
}

fn encode_math(op: MathOp) -> Option<u32> {
    match op {
        MathOp::PushW(r) => single(math::PUSHW, r),
        MathOp::PushUW(r) => single(math::PUSHUW, r),
        MathOp::PopW(r) => single(math::POPW, r),
        MathOp::PopUW(r) => single(math::POPUW, r),
        MathOp::Add => Some(self::op(math::ADDL)),
        MathOp::Sub => Some(self::op(math::SUBL)),
        MathOp::Mul => Some(self::op(math::MULL)),
        MathOp::Div => Some(self::op(math::DIVL)),
        MathOp::Mod => Some(self::op(math::MODL)),
        MathOp::Inc => Some(self::op(math::INCL)),
        MathOp::Dec => Some(self::op(math::DECL)),
        MathOp::Dup => Some(self::op(math::DUPL)),
        MathOp::Drop => Some(self::op(math::DROP)),
        MathOp::Swap => Some(self::op(math::SWPL)),
    }
}

/// Encodes a decoded instruction.
///
/// `Math` instructions encode in the math set's opcode space; everything else in
/// the base set's. `Nop` and `Sis` share their encoding across both sets.
///
/// # Returns
///
/// `None` when an operand is out of range or names a register instructions cannot
/// address.
pub fn encode(inst: &Instruction) -> Option<u32> {
    match *inst {
        Instruction::Nop => Some(op(base::NOP)),
        Instruction::Hlt { code } => unary(base::HLT, code),
        Instruction::Idle => Some(op(base::IDLE)),
        Instruction::Int { index } => unary(base::INT, index),
        Instruction::Retint => Some(op(base::RETINT)),
        Instruction::Call { target } => unary(base::CALL, target),
        Instruction::Ret => Some(op(base::RET)),
        Instruction::Cli => Some(op(base::CLI)),
        Instruction::Sti => Some(op(base::STI)),
        Instruction::Lpm => Some(op(base::LPM)),
        Instruction::Sis { set } => unary(base::SIS, set),
        Instruction::Li { dst, imm } => {
            (addressable(dst) && (IMM21_MIN..=IMM21_MAX).contains(&imm)).then(|| li(dst, imm))
        }
        Instruction::Liu { dst, imm } => addressable(dst).then(|| liu(dst, imm)),
        Instruction::Mov { dst, src } => {
            (addressable(dst) && addressable(src)).then(|| reg2(base::MOV, dst, src))
        }
        Instruction::Alu { op, dst, src } => binary(alu_opcode(op), dst, src),
        Instruction::Not { dst } => single(base::NOT, dst),
        Instruction::Inc { dst } => single(base::INC, dst),
        Instruction::Dec { dst } => single(base::DEC, dst),
        Instruction::Cmp { lhs, rhs } => binary(base::CMP, lhs, rhs),
        Instruction::Jump { cond, target } => unary(branch_opcode(cond), target),
        Instruction::Load {
            width,
            dst,
            base,
            offset,
        } => (addressable(dst) && addressable(base)).then(|| mem(load_opcode(width), dst, base, offset)),
        Instruction::Store {
            width,
            src,
            base,
            offset,
        } => (addressable(src) && addressable(base)).then(|| mem(store_opcode(width), src, base, offset)),
        Instruction::Push { src } => unary(base::PUSH, src),
        Instruction::Pop { dst } => single(base::POP, dst),
        Instruction::Math(op) => encode_math(op),
    }
}

/// Serializes instruction words as a little-endian byte image.
pub fn to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}
