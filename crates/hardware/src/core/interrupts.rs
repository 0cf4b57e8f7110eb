//! Virtual Interrupts.
//!
//! A virtual interrupt is a host-implemented service reached through `INT` without
//! any guest state switch: no vector lookup, no stack swap, no frame. This module
//! provides:
//! 1. **Interface:** The `VirtualInterrupt` trait.
//! 2. **Table:** `VirtualInterruptTable`, consulted by `do_int` before the IVT.
//! 3. **Built-ins:** Halt (`0x20`) and page memory services (`0x21`).

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::common::error::{Fault, MemoryError};
use crate::common::reg::Register;
use crate::core::cpu::CpuCore;

/// Interrupt index of the halt service.
pub const HALT_INTERRUPT: u32 = 0x20;
/// Interrupt index of the page memory service.
pub const MEMORY_INTERRUPT: u32 = 0x21;

/// Memory service: allocate a page, index returned in `r0`.
pub const MEMORY_ALLOC: u32 = 0;
/// Memory service: free the page named by `r1`.
pub const MEMORY_FREE: u32 = 1;
/// Memory service: return the number of free pages in `r0`.
pub const MEMORY_FREE_COUNT: u32 = 2;
/// Value returned in `r0` when no page could be allocated.
pub const ALLOC_FAILED: u32 = u32::MAX;

const R0: Register = Register::General(0);
const R1: Register = Register::General(1);

/// A host-implemented interrupt handler.
pub trait VirtualInterrupt: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the handler on the interrupting core.
    fn run(&self, core: &mut CpuCore) -> Result<(), Fault>;
}

/// Virtual interrupt handlers by index.
#[derive(Clone, Default)]
pub struct VirtualInterruptTable {
    handlers: BTreeMap<u32, Arc<dyn VirtualInterrupt>>,
}

impl std::fmt::Debug for VirtualInterruptTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.handlers.iter().map(|(i, h)| (i, h.name())))
            .finish()
    }
}

impl VirtualInterruptTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the halt and memory services.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.install(HALT_INTERRUPT, Arc::new(HaltInterrupt));
        table.install(MEMORY_INTERRUPT, Arc::new(MemoryInterrupt));
        table
    }

    /// Installs `handler` at `index`, replacing any previous handler.
    pub fn install(&mut self, index: u32, handler: Arc<dyn VirtualInterrupt>) {
        let _ = self.handlers.insert(index, handler);
    }

    /// Returns the handler at `index`.
    pub fn get(&self, index: u32) -> Option<Arc<dyn VirtualInterrupt>> {
        self.handlers.get(&index).cloned()
    }

    /// Returns `true` if a handler is installed at `index`.
    pub fn contains(&self, index: u32) -> bool {
        self.handlers.contains_key(&index)
    }
}

/// Halts the core with the exit code held in `r0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HaltInterrupt;

impl VirtualInterrupt for HaltInterrupt {
    fn name(&self) -> &'static str {
        "halt"
    }

    fn run(&self, core: &mut CpuCore) -> Result<(), Fault> {
        let code = core.read(R0);
        core.halt(code);
        Ok(())
    }
}

/// Page memory services selected by `r0`.
///
/// * `0`: allocate a page in any segment; `r0` receives the page index, or
///   `ALLOC_FAILED` when memory is exhausted.
/// * `1`: free page `r1`; every core drops its cached copy first.
/// * `2`: `r0` receives the number of free pages.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryInterrupt;

impl VirtualInterrupt for MemoryInterrupt {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn run(&self, core: &mut CpuCore) -> Result<(), Fault> {
        match core.read(R0) {
            MEMORY_ALLOC => {
                let page = match core.alloc_page(None) {
                    Ok(page) => page,
                    Err(Fault::Memory(MemoryError::NoFreePage)) => ALLOC_FAILED,
                    Err(err) => return Err(err),
                };
                core.write(R0, page)
            }
            MEMORY_FREE => {
                let page = core.read(R1);
                core.free_page(page)
            }
            MEMORY_FREE_COUNT => {
                let free = core.free_page_count();
                core.write(R0, free)
            }
            other => Err(Fault::AccessViolation(format!(
                "unknown memory service {other}"
            ))),
        }
    }
}
