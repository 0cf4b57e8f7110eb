//! Base instruction semantics.
//!
//! Arithmetic goes through the ALU and updates zero/sign/overflow. Branch and call
//! targets given as immediates are relative to `IP`, which already points past the
//! instruction; register targets are absolute. Memory operands address
//! `DS:base+offset` through the core's data cache.

use crate::common::addr::PhysAddr;
use crate::common::error::Fault;
use crate::common::reg::Register;
use crate::core::arch::flags::Flags;
use crate::core::cpu::CpuCore;
use crate::core::units::alu::Alu;
use crate::isa::instruction::{AluOp, Condition, Instruction, Operand, Width};

impl Condition {
    /// Evaluates the condition against `flags`.
    pub const fn holds(self, flags: &Flags) -> bool {
        match self {
            Self::Always => true,
            Self::Equal => flags.equal,
            Self::NotEqual => !flags.equal,
            Self::Zero => flags.zero,
            Self::NotZero => !flags.zero,
            Self::Sign => flags.sign,
            Self::NotSign => !flags.sign,
            Self::Greater => !flags.equal && !flags.sign,
            Self::Less => flags.sign && !flags.equal,
        }
    }
}

fn target(core: &CpuCore, operand: Operand) -> u32 {
    match operand {
        Operand::Imm(offset) => core.regs().ip.wrapping_add(offset as u32),
        Operand::Reg(reg) => core.read(reg),
    }
}

fn effective_address(core: &CpuCore, base: Register, offset: i16) -> PhysAddr {
    core.data_addr(core.read(base).wrapping_add(i32::from(offset) as u32))
}

fn arith(core: &mut CpuCore, dst: Register, op: AluOp, rhs: u32) -> Result<(), Fault> {
    let (value, overflow) = Alu::execute(op, core.read(dst), rhs)?;
    core.write(dst, value)?;
    core.regs_mut().flags.update_arith(value, overflow);
    Ok(())
}

/// Executes one base-set instruction.
pub(super) fn execute(core: &mut CpuCore, inst: &Instruction) -> Result<(), Fault> {
    match *inst {
        Instruction::Nop => {}
        Instruction::Hlt { code } => {
            let code = core.operand(code);
            core.halt(code);
        }
        Instruction::Idle => core.suspend(),
        Instruction::Int { index } => {
            let index = core.operand(index);
            core.do_int(index)?;
        }
        Instruction::Retint => core.exit_interrupt()?,
        Instruction::Call { target: to } => {
            let to = target(core, to);
            core.create_frame()?;
            core.regs_mut().ip = to;
        }
        Instruction::Ret => core.destroy_frame()?,
        Instruction::Cli => core.regs_mut().flags.hwint_enabled = false,
        Instruction::Sti => core.regs_mut().flags.hwint_enabled = true,
        Instruction::Lpm => core.regs_mut().flags.privileged = false,
        Instruction::Sis { set } => {
            let id = core.operand(set);
            let id = u8::try_from(id).unwrap_or(u8::MAX);
            core.switch_instruction_set(id)?;
        }
        Instruction::Li { dst, imm } => {
            let value = imm as u32;
            core.write(dst, value)?;
            core.regs_mut().flags.update_arith(value, false);
        }
        Instruction::Liu { dst, imm } => {
            let value = (u32::from(imm) << 16) | (core.read(dst) & 0xFFFF);
            core.write(dst, value)?;
        }
        Instruction::Mov { dst, src } => {
            let value = core.read(src);
            core.write(dst, value)?;
        }
        Instruction::Alu { op, dst, src } => {
            let rhs = core.operand(src);
            arith(core, dst, op, rhs)?;
        }
        Instruction::Not { dst } => {
            let value = !core.read(dst);
            core.write(dst, value)?;
            core.regs_mut().flags.update_arith(value, false);
        }
        Instruction::Inc { dst } => arith(core, dst, AluOp::Add, 1)?,
        Instruction::Dec { dst } => arith(core, dst, AluOp::Sub, 1)?,
        Instruction::Cmp { lhs, rhs } => {
            let (l, r) = (core.read(lhs), core.operand(rhs));
            core.regs_mut().flags.update_compare(l, r);
        }
        Instruction::Jump { cond, target: to } => {
            if cond.holds(&core.regs().flags) {
                let to = target(core, to);
                core.regs_mut().ip = to;
            }
        }
        Instruction::Load {
            width,
            dst,
            base,
            offset,
        } => {
            let addr = effective_address(core, base, offset);
            let dcache = core.dcache();
            let value = match width {
                Width::Byte => u32::from(dcache.read_u8(addr)?),
                Width::Half => u32::from(dcache.read_u16(addr)?),
                Width::Word => dcache.read_u32(addr)?,
            };
            core.write(dst, value)?;
        }
        Instruction::Store {
            width,
            src,
            base,
            offset,
        } => {
            let addr = effective_address(core, base, offset);
            let value = core.read(src);
            let dcache = core.dcache();
            match width {
                Width::Byte => dcache.write_u8(addr, value as u8)?,
                Width::Half => dcache.write_u16(addr, value as u16)?,
                Width::Word => dcache.write_u32(addr, value)?,
            }
        }
        Instruction::Push { src } => {
            let value = core.operand(src);
            core.push(value)?;
        }
        Instruction::Pop { dst } => {
            let value = core.pop()?;
            core.write(dst, value)?;
        }
        Instruction::Math(_) => {
            return Err(Fault::AccessViolation(
                "coprocessor instruction outside the math set".into(),
            ));
        }
    }
    Ok(())
}
