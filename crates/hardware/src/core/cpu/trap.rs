//! Interrupt Handling.
//!
//! This module implements interrupt delivery for a core. It covers:
//! 1. **Software Interrupts:** `INT` reaches a virtual (host) handler when one is
//!    installed at the index, and the interrupt vector table otherwise.
//! 2. **Hardware Interrupts:** `irq` delivers an external interrupt when the core is
//!    alive and hardware interrupts are enabled, waking a suspended core.
//! 3. **Entry and Exit:** The full context switch onto the handler stack and back.
//!
//! Entry pushes, on the handler stack: old DS, old SP, CS, FLAGS, `r0`-`r29`, then a
//! stack frame (interrupted IP, FP). Exit pops the exact inverse.

use super::CpuCore;
use crate::common::addr::{PhysAddr, page_base, segment_addr};
use crate::common::constants::{GENERAL_REGISTER_COUNT, PAGE_SIZE};
use crate::common::error::Fault;
use crate::common::sync::lock;
use crate::core::arch::flags::Flags;
use crate::core::units::cache::Selector;
use crate::soc::traits::{InterruptVector, MemoryBackend};

impl CpuCore {
    /// Handles `INT index`.
    ///
    /// A virtual interrupt runs on the host without any state switch; any other
    /// index enters the handler from the core's interrupt vector table.
    pub fn do_int(&mut self, index: u32) -> Result<(), Fault> {
        if let Some(handler) = self.virtual_interrupts.get(index) {
            tracing::trace!(core = self.id, index, handler = handler.name(), "virtual interrupt");
            return handler.run(self);
        }
        self.enter_interrupt(self.ivt_address, index)
    }

    /// Delivers hardware interrupt `index`.
    ///
    /// # Returns
    ///
    /// `false` when the core is not alive or has hardware interrupts disabled;
    /// `true` once the interrupt was taken. A fault during entry kills the core.
    pub fn irq(&mut self, index: u32) -> bool {
        if !self.is_alive() || !self.regs.flags.hwint_enabled {
            return false;
        }
        self.wake_up();
        if let Err(fault) = self.enter_interrupt(self.ivt_address, index) {
            self.die(fault);
        }
        true
    }

    /// Enters the handler for vector `index` of the table at `table`.
    ///
    /// The handler stack is the vector's SP, or a freshly allocated page in the
    /// vector's data segment (SP at its top) when the vector's SP is zero.
    pub fn enter_interrupt(&mut self, table: PhysAddr, index: u32) -> Result<(), Fault> {
        let vector = lock(&self.memory)
            .load_interrupt_vector(table, index)
            .map_err(Fault::from_memory)?;
        let ds = u32::from(vector.ds);

        let (sp, page) = if vector.sp == 0 {
            let page = self.alloc_page(Some(ds))?;
            let top = page_base(page).val().wrapping_add(PAGE_SIZE);
            (top.wrapping_sub(segment_addr(ds, 0).val()), Some(page))
        } else {
            (vector.sp, None)
        };

        let (old_ds, old_sp) = (self.regs.ds, self.regs.sp);
        self.regs.ds = ds;
        self.regs.sp = sp;

        let saved = self.push_context(old_ds, old_sp);
        if let Err(fault) = saved {
            self.regs.ds = old_ds;
            self.regs.sp = old_sp;
            if let Some((page, Err(err))) = page.map(|page| (page, self.free_page(page))) {
                tracing::warn!(core = self.id, page, %err, "handler stack page leaked");
            }
            return Err(fault);
        }

        self.interrupt_stacks.push(page);
        self.regs.flags.privileged = true;
        self.regs.cs = u32::from(vector.cs);
        self.regs.ip = vector.ip;
        self.observer.on_interrupt(self.id, index, &vector);
        Ok(())
    }

    fn push_context(&mut self, old_ds: u32, old_sp: u32) -> Result<(), Fault> {
        self.push(old_ds)?;
        self.push(old_sp)?;
        self.push(self.regs.cs)?;
        self.push(self.regs.flags.to_u32())?;
        for i in 0..GENERAL_REGISTER_COUNT {
            self.push(self.regs.gpr[i])?;
        }
        self.create_frame()
    }

    /// Returns from the innermost interrupt handler.
    ///
    /// Restores every register saved at entry. A handler stack allocated at entry is
    /// dropped from every data cache without write-back and freed.
    ///
    /// # Errors
    ///
    /// `Fault::InvalidFrame` when no interrupt is active or the handler left the
    /// stack unbalanced.
    pub fn exit_interrupt(&mut self) -> Result<(), Fault> {
        let Some(&page) = self.interrupt_stacks.last() else {
            return Err(Fault::InvalidFrame {
                expected: 0,
                found: self.regs.sp,
            });
        };

        self.destroy_frame()?;
        for i in (0..GENERAL_REGISTER_COUNT).rev() {
            self.regs.gpr[i] = self.pop()?;
        }
        self.regs.flags = Flags::from_u32(self.pop()?);
        self.regs.cs = self.pop()?;
        let old_sp = self.pop()?;
        let old_ds = self.pop()?;
        self.regs.sp = old_sp;
        self.regs.ds = old_ds;
        let _ = self.interrupt_stacks.pop();

        if let Some(page) = page {
            let _ = self.dcache.release(Selector::Page(page), false, true)?;
            self.free_page(page)?;
        }
        self.observer.on_interrupt_exit(self.id);
        Ok(())
    }

    /// Loads vector `index` of the core's interrupt vector table.
    pub fn interrupt_vector(&self, index: u32) -> Result<InterruptVector, Fault> {
        lock(&self.memory)
            .load_interrupt_vector(self.ivt_address, index)
            .map_err(Fault::from_memory)
    }
}
