//! Register File.
//!
//! This module provides the `RegisterFile` owned by every core. It provides:
//! 1. **Storage:** 30 general-purpose registers plus FP, SP, DS, CS, IP, FLAGS, and CNT.
//! 2. **Protection:** Writes to protected registers are refused while unprivileged.
//! 3. **Observability:** Register dumps for diagnostics.

use crate::common::constants::{GENERAL_REGISTER_COUNT, OPERAND_FP, OPERAND_SP};
use crate::common::error::Fault;
use crate::core::arch::flags::Flags;

/// Architectural register names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    /// General-purpose register `r0`-`r29`.
    General(u8),
    /// Frame pointer.
    Fp,
    /// Stack pointer.
    Sp,
    /// Data segment selector.
    Ds,
    /// Code segment selector.
    Cs,
    /// Instruction pointer.
    Ip,
    /// Packed processor flags.
    Flags,
    /// Retired instruction counter (low 32 bits when read as a register).
    Cnt,
}

impl Register {
    /// Decodes a 5-bit instruction operand: 0-29 are general registers, 30 is FP,
    /// 31 is SP.
    pub const fn from_operand(idx: u8) -> Self {
        match idx {
            OPERAND_FP => Self::Fp,
            OPERAND_SP => Self::Sp,
            n => Self::General(n % GENERAL_REGISTER_COUNT as u8),
        }
    }

    /// Encodes the register back into an operand index, if it is addressable by
    /// instructions.
    pub const fn to_operand(self) -> Option<u8> {
        match self {
            Self::General(n) => Some(n),
            Self::Fp => Some(OPERAND_FP),
            Self::Sp => Some(OPERAND_SP),
            _ => None,
        }
    }

    /// Returns `true` if writing this register requires privileged mode.
    pub const fn is_protected(self) -> bool {
        matches!(
            self,
            Self::Fp | Self::Ds | Self::Cs | Self::Ip | Self::Flags | Self::Cnt
        )
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::General(n) => write!(f, "r{n}"),
            Self::Fp => f.write_str("fp"),
            Self::Sp => f.write_str("sp"),
            Self::Ds => f.write_str("ds"),
            Self::Cs => f.write_str("cs"),
            Self::Ip => f.write_str("ip"),
            Self::Flags => f.write_str("flags"),
            Self::Cnt => f.write_str("cnt"),
        }
    }
}

/// Per-core register file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterFile {
    /// General-purpose registers.
    pub gpr: [u32; GENERAL_REGISTER_COUNT],
    /// Frame pointer.
    pub fp: u32,
    /// Stack pointer.
    pub sp: u32,
    /// Data segment selector.
    pub ds: u32,
    /// Code segment selector.
    pub cs: u32,
    /// Instruction pointer.
    pub ip: u32,
    /// Processor flags.
    pub flags: Flags,
    /// Retired instruction counter.
    pub cnt: u64,
}

impl RegisterFile {
    /// Creates a register file with every register zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes all registers, enables hardware interrupts, and sets `IP`.
    pub fn reset(&mut self, ip: u32) {
        *self = Self {
            ip,
            flags: Flags {
                hwint_enabled: true,
                ..Flags::default()
            },
            ..Self::default()
        };
    }

    /// Reads a register.
    pub fn read(&self, reg: Register) -> u32 {
        match reg {
            Register::General(n) => self.gpr[n as usize % GENERAL_REGISTER_COUNT],
            Register::Fp => self.fp,
            Register::Sp => self.sp,
            Register::Ds => self.ds,
            Register::Cs => self.cs,
            Register::Ip => self.ip,
            Register::Flags => self.flags.to_u32(),
            Register::Cnt => self.cnt as u32,
        }
    }

    /// Writes a register, enforcing register protection.
    ///
    /// # Errors
    ///
    /// `Fault::AccessViolation` when `reg` is protected and the privileged flag is clear.
    pub fn write(&mut self, reg: Register, value: u32) -> Result<(), Fault> {
        if reg.is_protected() && !self.flags.privileged {
            return Err(Fault::AccessViolation(format!(
                "write to protected register {reg} in unprivileged mode"
            )));
        }
        self.write_raw(reg, value);
        Ok(())
    }

    /// Writes a register without any protection check.
    ///
    /// Reserved for the core itself (boot, interrupt entry/exit, frame handling).
    pub fn write_raw(&mut self, reg: Register, value: u32) {
        match reg {
            Register::General(n) => self.gpr[n as usize % GENERAL_REGISTER_COUNT] = value,
            Register::Fp => self.fp = value,
            Register::Sp => self.sp = value,
            Register::Ds => self.ds = value,
            Register::Cs => self.cs = value,
            Register::Ip => self.ip = value,
            Register::Flags => self.flags = Flags::from_u32(value),
            Register::Cnt => self.cnt = u64::from(value),
        }
    }

    /// Returns `true` while the core runs in privileged mode.
    pub const fn privileged(&self) -> bool {
        self.flags.privileged
    }

    /// Formats the register file as a multi-line dump.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, pair) in self.gpr.chunks(2).enumerate() {
            let lo = i * 2;
            out.push_str(&format!(
                "r{:<2}={:#010x} r{:<2}={:#010x}\n",
                lo,
                pair[0],
                lo + 1,
                pair.get(1).copied().unwrap_or(0)
            ));
        }
        out.push_str(&format!(
            "fp={:#010x} sp={:#010x} ds={:#06x} cs={:#06x} ip={:#010x} flags={:#04x} cnt={}",
            self.fp,
            self.sp,
            self.ds,
            self.cs,
            self.ip,
            self.flags.to_u32(),
            self.cnt
        ));
        out
    }
}
