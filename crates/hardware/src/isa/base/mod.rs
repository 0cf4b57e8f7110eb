//! Base Instruction Set (id 0).
//!
//! Defines the instructions every core boots with: control flow, interrupts,
//! integer arithmetic, register moves, loads, stores, and stack operations.
//!
//! # Structure
//!
//! - `opcodes`: Opcode field values.
//! - `execute`: Instruction semantics.
//!
//! # Encoding
//!
//! Single-operand instructions (`HLT`, `INT`, `CALL`, `SIS`, jumps, `PUSH`) take the
//! 15-bit immediate when the immediate flag is set and the register in the first
//! register field otherwise. Two-operand instructions take their destination from
//! the first register field and their source from the immediate or the second
//! register field. Loads and stores name the data register first and the base
//! register second, with a signed 16-bit offset.

/// Base instruction set opcodes.
pub mod opcodes;

mod execute;

use crate::common::error::Fault;
use crate::core::cpu::CpuCore;
use crate::isa::decode::{binary_operand, reg1, reg2, unary_operand};
use crate::isa::instruction::{AluOp, Condition, Instruction, InstructionBits, Width};
use crate::isa::{BASE_SET_ID, InstructionSet};

/// The base instruction set.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseSet;

fn alu(op: AluOp, raw: u32) -> Instruction {
    Instruction::Alu {
        op,
        dst: reg1(raw),
        src: binary_operand(raw),
    }
}

fn jump(cond: Condition, raw: u32) -> Instruction {
    Instruction::Jump {
        cond,
        target: unary_operand(raw),
    }
}

fn load(width: Width, raw: u32) -> Instruction {
    Instruction::Load {
        width,
        dst: reg1(raw),
        base: reg2(raw),
        offset: raw.offset16(),
    }
}

fn store(width: Width, raw: u32) -> Instruction {
    Instruction::Store {
        width,
        src: reg1(raw),
        base: reg2(raw),
        offset: raw.offset16(),
    }
}

impl InstructionSet for BaseSet {
    fn id(&self) -> u8 {
        BASE_SET_ID
    }

    fn name(&self) -> &'static str {
        "base"
    }

    fn decode(&self, raw: u32) -> Result<Instruction, Fault> {
        let inst = match raw.opcode() {
            opcodes::NOP => Instruction::Nop,
            opcodes::HLT => Instruction::Hlt {
                code: unary_operand(raw),
            },
            opcodes::IDLE => Instruction::Idle,
            opcodes::INT => Instruction::Int {
                index: unary_operand(raw),
            },
            opcodes::RETINT => Instruction::Retint,
            opcodes::CALL => Instruction::Call {
                target: unary_operand(raw),
            },
            opcodes::RET => Instruction::Ret,
            opcodes::CLI => Instruction::Cli,
            opcodes::STI => Instruction::Sti,
            opcodes::LPM => Instruction::Lpm,
            opcodes::SIS => Instruction::Sis {
                set: unary_operand(raw),
            },
            opcodes::LI => Instruction::Li {
                dst: reg1(raw),
                imm: raw.imm21(),
            },
            opcodes::LIU => Instruction::Liu {
                dst: reg1(raw),
                imm: raw.uimm16(),
            },
            opcodes::MOV => Instruction::Mov {
                dst: reg1(raw),
                src: reg2(raw),
            },
            opcodes::ADD => alu(AluOp::Add, raw),
            opcodes::SUB => alu(AluOp::Sub, raw),
            opcodes::MUL => alu(AluOp::Mul, raw),
            opcodes::DIV => alu(AluOp::Div, raw),
            opcodes::MOD => alu(AluOp::Mod, raw),
            opcodes::AND => alu(AluOp::And, raw),
            opcodes::OR => alu(AluOp::Or, raw),
            opcodes::XOR => alu(AluOp::Xor, raw),
            opcodes::SHL => alu(AluOp::Shl, raw),
            opcodes::SHR => alu(AluOp::Shr, raw),
            opcodes::NOT => Instruction::Not { dst: reg1(raw) },
            opcodes::INC => Instruction::Inc { dst: reg1(raw) },
            opcodes::DEC => Instruction::Dec { dst: reg1(raw) },
            opcodes::CMP => Instruction::Cmp {
                lhs: reg1(raw),
                rhs: binary_operand(raw),
            },
            opcodes::J => jump(Condition::Always, raw),
            opcodes::BE => jump(Condition::Equal, raw),
            opcodes::BNE => jump(Condition::NotEqual, raw),
            opcodes::BZ => jump(Condition::Zero, raw),
            opcodes::BNZ => jump(Condition::NotZero, raw),
            opcodes::BS => jump(Condition::Sign, raw),
            opcodes::BNS => jump(Condition::NotSign, raw),
            opcodes::BG => jump(Condition::Greater, raw),
            opcodes::BL => jump(Condition::Less, raw),
            opcodes::LW => load(Width::Word, raw),
            opcodes::LS => load(Width::Half, raw),
            opcodes::LB => load(Width::Byte, raw),
            opcodes::STW => store(Width::Word, raw),
            opcodes::STS => store(Width::Half, raw),
            opcodes::STB => store(Width::Byte, raw),
            opcodes::PUSH => Instruction::Push {
                src: unary_operand(raw),
            },
            opcodes::POP => Instruction::Pop { dst: reg1(raw) },
            opcode => return Err(Fault::InvalidOpcode { opcode, raw }),
        };
        Ok(inst)
    }

    fn execute(&self, core: &mut CpuCore, inst: &Instruction) -> Result<(), Fault> {
        execute::execute(core, inst)
    }

    fn is_privileged(&self, inst: &Instruction) -> bool {
        matches!(
            inst,
            Instruction::Hlt { .. }
                | Instruction::Idle
                | Instruction::Retint
                | Instruction::Cli
                | Instruction::Sti
                | Instruction::Lpm
        )
    }
}
