//! Core Snapshots.
//!
//! A `CoreSnapshot` captures the architectural state of a core (registers, flags,
//! counters, lifecycle state, coprocessor stack) in a serde-serializable form. It
//! is used for diagnostics dumps and to resume a fresh core where another left off.
//! Cache contents, frames, and active interrupt stacks are not part of a snapshot.

use serde::{Deserialize, Serialize};

use super::{CoreState, CpuCore};
use crate::common::constants::{GENERAL_REGISTER_COUNT, MATH_STACK_DEPTH};
use crate::common::error::CpuError;
use crate::core::arch::flags::Flags;

/// Serializable architectural state of a core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSnapshot {
    /// Core id.
    pub id: usize,
    /// Lifecycle state.
    pub state: CoreState,
    /// General-purpose registers `r0`-`r29`.
    pub gpr: Vec<u32>,
    /// Frame pointer.
    pub fp: u32,
    /// Stack pointer.
    pub sp: u32,
    /// Data segment.
    pub ds: u32,
    /// Code segment.
    pub cs: u32,
    /// Instruction pointer.
    pub ip: u32,
    /// Flags.
    pub flags: Flags,
    /// Retired instruction count.
    pub cnt: u64,
    /// Active instruction set id.
    pub active_set: u8,
    /// Math coprocessor stack, bottom first.
    pub math_stack: Vec<i64>,
    /// Exit code.
    pub exit_code: u32,
    /// Display form of the fault that killed the core, if any.
    pub fault: Option<String>,
}

impl CpuCore {
    /// Captures the core's architectural state.
    pub fn snapshot(&self) -> CoreSnapshot {
        CoreSnapshot {
            id: self.id,
            state: self.state,
            gpr: self.regs.gpr.to_vec(),
            fp: self.regs.fp,
            sp: self.regs.sp,
            ds: self.regs.ds,
            cs: self.regs.cs,
            ip: self.regs.ip,
            flags: self.regs.flags,
            cnt: self.regs.cnt,
            active_set: self.active_set,
            math_stack: self.math.values().to_vec(),
            exit_code: self.exit_code,
            fault: self.last_fault.as_ref().map(ToString::to_string),
        }
    }

    /// Resumes a `Reset` core from `snapshot`.
    ///
    /// The core takes the snapshot's registers, instruction set, and coprocessor
    /// stack, registers its data cache, and enters the snapshot's state.
    ///
    /// # Errors
    ///
    /// `CpuError::InvalidState` when this core is not in `Reset` or the snapshot was
    /// not taken from an alive core.
    pub fn restore(&mut self, snapshot: &CoreSnapshot) -> Result<(), CpuError> {
        if self.state != CoreState::Reset || !snapshot.state.is_alive() {
            return Err(CpuError::InvalidState {
                core: self.id,
                action: "restore",
                state: if self.state == CoreState::Reset {
                    snapshot.state.name()
                } else {
                    self.state.name()
                },
            });
        }
        for (dst, src) in self.regs.gpr.iter_mut().zip(&snapshot.gpr) {
            *dst = *src;
        }
        self.regs.gpr[snapshot.gpr.len().min(GENERAL_REGISTER_COUNT)..].fill(0);
        self.regs.fp = snapshot.fp;
        self.regs.sp = snapshot.sp;
        self.regs.ds = snapshot.ds;
        self.regs.cs = snapshot.cs;
        self.regs.ip = snapshot.ip;
        self.regs.flags = snapshot.flags;
        self.regs.cnt = snapshot.cnt;
        self.active_set = if self.sets.get(snapshot.active_set).is_some() {
            snapshot.active_set
        } else {
            crate::isa::BASE_SET_ID
        };
        self.math.clear();
        for value in snapshot.math_stack.iter().take(MATH_STACK_DEPTH) {
            let _ = self.math.push(*value);
        }
        self.icache.clear();
        self.controller.register(self.id, self.dcache.lines());
        self.set_state(snapshot.state);
        Ok(())
    }
}
