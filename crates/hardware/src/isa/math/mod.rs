//! Math Coprocessor Instruction Set (id 1).
//!
//! Operates on a per-core stack of up to eight 64-bit signed integers. Registers
//! move values in and out of the stack; arithmetic pops its operands and pushes the
//! result. All arithmetic wraps.
//!
//! # Structure
//!
//! - `opcodes`: Opcode field values.
//! - `stack`: The operand stack kept in each core.

/// Math coprocessor opcodes.
pub mod opcodes;

/// Coprocessor operand stack.
pub mod stack;

pub use self::stack::MathStack;

use crate::common::error::Fault;
use crate::core::cpu::CpuCore;
use crate::isa::decode::{reg1, unary_operand};
use crate::isa::instruction::{Instruction, InstructionBits, MathOp};
use crate::isa::{InstructionSet, MATH_SET_ID};

/// The math coprocessor instruction set.
#[derive(Clone, Copy, Debug, Default)]
pub struct MathSet;

fn binary(stack: &mut MathStack, op: MathOp) -> Result<(), Fault> {
    let rhs = stack.pop()?;
    let lhs = stack.pop()?;
    let value = match op {
        MathOp::Add => lhs.wrapping_add(rhs),
        MathOp::Sub => lhs.wrapping_sub(rhs),
        MathOp::Mul => lhs.wrapping_mul(rhs),
        MathOp::Div | MathOp::Mod if rhs == 0 => return Err(Fault::DivideByZero),
        MathOp::Div => lhs.wrapping_div(rhs),
        MathOp::Mod => lhs.wrapping_rem(rhs),
        _ => return Ok(()),
    };
    stack.push(value)
}

fn execute_math(core: &mut CpuCore, op: MathOp) -> Result<(), Fault> {
    match op {
        MathOp::PushW(reg) => {
            let value = i64::from(core.read(reg) as i32);
            core.math_stack_mut().push(value)
        }
        MathOp::PushUW(reg) => {
            let value = i64::from(core.read(reg));
            core.math_stack_mut().push(value)
        }
        MathOp::PopW(reg) => {
            let value = core.math_stack_mut().pop()?;
            core.write(reg, value as u32)
        }
        MathOp::PopUW(reg) => {
            let value = core.math_stack_mut().pop()?;
            core.write(reg, (value >> 32) as u32)
        }
        MathOp::Add | MathOp::Sub | MathOp::Mul | MathOp::Div | MathOp::Mod => {
            binary(core.math_stack_mut(), op)
        }
        MathOp::Inc | MathOp::Dec => {
            let stack = core.math_stack_mut();
            let top = stack.pop()?;
            let delta = if op == MathOp::Inc { 1 } else { -1 };
            stack.push(top.wrapping_add(delta))
        }
        MathOp::Dup => {
            let stack = core.math_stack_mut();
            let top = stack.peek()?;
            stack.push(top)
        }
        MathOp::Drop => core.math_stack_mut().pop().map(|_| ()),
        MathOp::Swap => {
            let stack = core.math_stack_mut();
            let a = stack.pop()?;
            let b = stack.pop()?;
            stack.push(a)?;
            stack.push(b)
        }
    }
}

impl InstructionSet for MathSet {
    fn id(&self) -> u8 {
        MATH_SET_ID
    }

    fn name(&self) -> &'static str {
        "math"
    }

    fn decode(&self, raw: u32) -> Result<Instruction, Fault> {
        let op = match raw.opcode() {
            opcodes::NOP => return Ok(Instruction::Nop),
            opcodes::SIS => {
                return Ok(Instruction::Sis {
                    set: unary_operand(raw),
                });
            }
            opcodes::PUSHW => MathOp::PushW(reg1(raw)),
            opcodes::PUSHUW => MathOp::PushUW(reg1(raw)),
            opcodes::POPW => MathOp::PopW(reg1(raw)),
            opcodes::POPUW => MathOp::PopUW(reg1(raw)),
            opcodes::ADDL => MathOp::Add,
            opcodes::SUBL => MathOp::Sub,
            opcodes::MULL => MathOp::Mul,
            opcodes::DIVL => MathOp::Div,
            opcodes::MODL => MathOp::Mod,
            opcodes::INCL => MathOp::Inc,
            opcodes::DECL => MathOp::Dec,
            opcodes::DUPL => MathOp::Dup,
            opcodes::DROP => MathOp::Drop,
            opcodes::SWPL => MathOp::Swap,
            opcode => return Err(Fault::InvalidOpcode { opcode, raw }),
        };
        Ok(Instruction::Math(op))
    }

    fn execute(&self, core: &mut CpuCore, inst: &Instruction) -> Result<(), Fault> {
        match *inst {
            Instruction::Nop => Ok(()),
            Instruction::Sis { set } => {
                let id = core.operand(set);
                let id = u8::try_from(id).unwrap_or(u8::MAX);
                core.switch_instruction_set(id)
            }
            Instruction::Math(op) => execute_math(core, op),
            _ => Err(Fault::AccessViolation(format!(
                "{} is not a math instruction",
                crate::isa::disasm::format(inst)
            ))),
        }
    }

    fn is_privileged(&self, _inst: &Instruction) -> bool {
        false
    }
}
