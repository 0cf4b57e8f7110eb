//! Execution Observers.
//!
//! Cores report lifecycle and execution events to an injected `Observer` instead of
//! logging through globals. It provides:
//! 1. **Interface:** The `Observer` trait with no-op defaults for every event.
//! 2. **Silence:** `NullObserver`, used when tracing is off.
//! 3. **Tracing:** `TracingObserver`, which forwards events to the `tracing` crate
//!    with the core id as a structured field.

use std::sync::Arc;

use crate::common::error::Fault;
use crate::core::cpu::{CoreInitState, CoreState};
use crate::isa::InstructionSet;
use crate::isa::instruction::Instruction;
use crate::soc::traits::InterruptVector;

/// Receiver of core events.
///
/// Every method has an empty default, so implementors only override what they need.
pub trait Observer: Send + Sync {
    /// The core booted with `init`.
    fn on_boot(&self, _core: usize, _init: &CoreInitState) {}

    /// The core is about to execute `inst`, fetched at CS-relative `ip`.
    fn on_execute(&self, _core: usize, _ip: u32, _set: &dyn InstructionSet, _inst: &Instruction) {}

    /// The core entered the handler for interrupt `index`.
    fn on_interrupt(&self, _core: usize, _index: u32, _vector: &InterruptVector) {}

    /// The core returned from an interrupt handler.
    fn on_interrupt_exit(&self, _core: usize) {}

    /// The core raised a fault and is about to die.
    fn on_fault(&self, _core: usize, _ip: u32, _fault: &Fault) {}

    /// The core halted with `exit_code`.
    fn on_halt(&self, _core: usize, _exit_code: u32) {}

    /// The core moved between lifecycle states.
    fn on_state_change(&self, _core: usize, _from: CoreState, _to: CoreState) {}
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// Observer that logs through `tracing`.
///
/// Instructions are logged at `trace`, interrupts at `debug`, lifecycle at `info`,
/// and faults at `warn`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_boot(&self, core: usize, init: &CoreInitState) {
        tracing::info!(
            core,
            cs = init.cs,
            ds = init.ds,
            ip = format_args!("{:#010x}", init.ip),
            sp = format_args!("{:#010x}", init.sp),
            privileged = init.privileged,
            "core booted"
        );
    }

    fn on_execute(&self, core: usize, ip: u32, set: &dyn InstructionSet, inst: &Instruction) {
        tracing::trace!(
            core,
            ip = format_args!("{ip:#010x}"),
            set = set.name(),
            "{}",
            set.disassemble(inst)
        );
    }

    fn on_interrupt(&self, core: usize, index: u32, vector: &InterruptVector) {
        tracing::debug!(
            core,
            index = format_args!("{index:#x}"),
            cs = vector.cs,
            ip = format_args!("{:#010x}", vector.ip),
            "interrupt entry"
        );
    }

    fn on_interrupt_exit(&self, core: usize) {
        tracing::debug!(core, "interrupt exit");
    }

    fn on_fault(&self, core: usize, ip: u32, fault: &Fault) {
        tracing::warn!(core, ip = format_args!("{ip:#010x}"), %fault, "core fault");
    }

    fn on_halt(&self, core: usize, exit_code: u32) {
        tracing::info!(core, exit_code, "core halted");
    }

    fn on_state_change(&self, core: usize, from: CoreState, to: CoreState) {
        tracing::debug!(core, from = from.name(), to = to.name(), "state change");
    }
}

/// Returns the observer matching the tracing switch.
///
/// The `always-trace` feature forces the tracing observer.
pub fn select(trace: bool) -> Arc<dyn Observer> {
    if trace || cfg!(feature = "always-trace") {
        Arc::new(TracingObserver)
    } else {
        Arc::new(NullObserver)
    }
}
