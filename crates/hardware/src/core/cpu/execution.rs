//! Main Execution Step.
//!
//! This module implements the execution quantum of a core. It performs the following:
//! 1. **Fetch:** Reads the instruction at `CS:IP` through the instruction cache,
//!    decoding with the active instruction set on a miss.
//! 2. **Privilege Check:** Rejects privileged instructions in unprivileged mode.
//! 3. **Execute:** Dispatches to the instruction set and retires the instruction.
//! 4. **Fault Funnel:** Any fault raised along the way kills the core.

use std::sync::Arc;

use super::CpuCore;
use crate::common::constants::INSTRUCTION_SIZE;
use crate::common::error::Fault;
use crate::common::sync::lock;
use crate::isa::InstructionSet;
use crate::soc::traits::MemoryBackend;

impl CpuCore {
    fn current_set(&self) -> Result<Arc<dyn InstructionSet>, Fault> {
        self.sets
            .get(self.active_set)
            .ok_or(Fault::InvalidInstructionSet(self.active_set))
    }

    /// Executes one instruction.
    ///
    /// Does nothing unless the core is `Running`. A fault raised while fetching,
    /// decoding, or executing kills the core (exit code 1, fault kept in
    /// `last_fault`).
    ///
    /// # Returns
    ///
    /// `true` if an instruction was attempted.
    pub fn step(&mut self) -> bool {
        if !self.is_runnable() {
            return false;
        }
        if let Err(fault) = self.execute_one() {
            self.die(fault);
        }
        true
    }

    fn execute_one(&mut self) -> Result<(), Fault> {
        let ip = self.regs.ip;
        let set = self.current_set()?;
        let addr = self.code_addr(ip);

        let memory = &self.memory;
        let inst = self.icache.get(addr, |addr| {
            let raw = lock(memory).read_u32(addr).map_err(Fault::from_memory)?;
            set.decode(raw)
        })?;
        self.regs.ip = ip.wrapping_add(INSTRUCTION_SIZE);

        if set.is_privileged(&inst) && !self.regs.privileged() {
            return Err(Fault::AccessViolation(format!(
                "privileged instruction `{}` in unprivileged mode",
                set.disassemble(&inst)
            )));
        }

        self.observer.on_execute(self.id, ip, set.as_ref(), &inst);
        set.execute(self, &inst)?;
        self.regs.cnt = self.regs.cnt.wrapping_add(1);
        Ok(())
    }
}
