//! Instruction Disassembler.
//!
//! Converts decoded instructions into assembly text for debug tracing, logging,
//! backtraces, and the CLI `disasm` command.
//!
//! # Usage
//!
//! ```
//! use smpvm_core::common::Register;
//! use smpvm_core::isa::disasm::format;
//! use smpvm_core::isa::Instruction;
//!
//! let text = format(&Instruction::Li { dst: Register::General(0), imm: 5 });
//! assert_eq!(text, "li r0, 0x5");
//! ```

use crate::common::error::Fault;
use crate::isa::InstructionSetTable;
use crate::isa::instruction::{AluOp, Condition, Instruction, MathOp, Width};

fn alu_mnemonic(op: AluOp) -> &'static str {
    match op {
        AluOp::Add => "add",
        AluOp::Sub => "sub",
        AluOp::Mul => "mul",
        AluOp::Div => "div",
        AluOp::Mod => "mod",
        AluOp::And => "and",
        AluOp::Or => "or",
        AluOp::Xor => "xor",
        AluOp::Shl => "shl",
        AluOp::Shr => "shr",
    }
}

fn branch_mnemonic(cond: Condition) -> &'static str {
    match cond {
        Condition::Always => "j",
        Condition::Equal => "be",
        Condition::NotEqual => "bne",
        Condition::Zero => "bz",
        Condition::NotZero => "bnz",
        Condition::Sign => "bs",
        Condition::NotSign => "bns",
        Condition::Greater => "bg",
        Condition::Less => "bl",
    }
}

const fn width_suffix(width: Width) -> &'static str {
    match width {
        Width::Byte => "b",
        Width::Half => "s",
        Width::Word => "w",
    }
}

fn math(op: MathOp) -> String {
    match op {
        MathOp::PushW(r) => format!("pushw {r}"),
        MathOp::PushUW(r) => format!("pushuw {r}"),
        MathOp::PopW(r) => format!("popw {r}"),
        MathOp::PopUW(r) => format!("popuw {r}"),
        MathOp::Add => "addl".into(),
        MathOp::Sub => "subl".into(),
        MathOp::Mul => "mull".into(),
        MathOp::Div => "divl".into(),
        MathOp::Mod => "modl".into(),
        MathOp::Inc => "incl".into(),
        MathOp::Dec => "decl".into(),
        MathOp::Dup => "dupl".into(),
        MathOp::Drop => "drop".into(),
        MathOp::Swap => "swpl".into(),
    }
}

fn mem_operand(base: impl std::fmt::Display, offset: i16) -> String {
    match offset {
        0 => format!("[{base}]"),
        o if o < 0 => format!("[{base} - {:#x}]", o.unsigned_abs()),
        o => format!("[{base} + {o:#x}]"),
    }
}

/// Formats a decoded instruction as assembly text.
pub fn format(inst: &Instruction) -> String {
    match *inst {
        Instruction::Nop => "nop".into(),
        Instruction::Hlt { code } => format!("hlt {code}"),
        Instruction::Idle => "idle".into(),
        Instruction::Int { index } => format!("int {index}"),
        Instruction::Retint => "retint".into(),
        Instruction::Call { target } => format!("call {target}"),
        Instruction::Ret => "ret".into(),
        Instruction::Cli => "cli".into(),
        Instruction::Sti => "sti".into(),
        Instruction::Lpm => "lpm".into(),
        Instruction::Sis { set } => format!("sis {set}"),
        Instruction::Li { dst, imm } => {
            if imm < 0 {
                format!("li {dst}, -{:#x}", imm.unsigned_abs())
            } else {
                format!("li {dst}, {imm:#x}")
            }
        }
        Instruction::Liu { dst, imm } => format!("liu {dst}, {imm:#x}"),
        Instruction::Mov { dst, src } => format!("mov {dst}, {src}"),
        Instruction::Alu { op, dst, src } => format!("{} {dst}, {src}", alu_mnemonic(op)),
        Instruction::Not { dst } => format!("not {dst}"),
        Instruction::Inc { dst } => format!("inc {dst}"),
        Instruction::Dec { dst } => format!("dec {dst}"),
        Instruction::Cmp { lhs, rhs } => format!("cmp {lhs}, {rhs}"),
        Instruction::Jump { cond, target } => format!("{} {target}", branch_mnemonic(cond)),
        Instruction::Load {
            width,
            dst,
            base,
            offset,
        } => format!("l{} {dst}, {}", width_suffix(width), mem_operand(base, offset)),
        Instruction::Store {
            width,
            src,
            base,
            offset,
        } => format!("st{} {}, {src}", width_suffix(width), mem_operand(base, offset)),
        Instruction::Push { src } => format!("push {src}"),
        Instruction::Pop { dst } => format!("pop {dst}"),
        Instruction::Math(op) => math(op),
    }
}

/// Decodes and formats a raw word in the context of instruction set `set`.
///
/// Undecodable words render as `.word 0x...` rather than failing, so listings can
/// cover data embedded in code.
pub fn disassemble_word(table: &InstructionSetTable, set: u8, raw: u32) -> String {
    let Some(isa) = table.get(set) else {
        return format!(".word {raw:#010x}  ; {}", Fault::InvalidInstructionSet(set));
    };
    match isa.decode(raw) {
        Ok(inst) => isa.disassemble(&inst),
        Err(_) => format!(".word {raw:#010x}"),
    }
}
