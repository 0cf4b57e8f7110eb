//! Machine construction.
//!
//! This module builds a complete `Cpu` from configuration. It performs:
//! 1. **Memory setup:** Creates the paged physical memory, or adopts a caller-supplied backend.
//! 2. **Shared resources:** Creates the coherency controller and the instruction set and
//!    virtual interrupt tables every core shares.
//! 3. **Hooks:** Selects the observer (tracing or silent) and installs the symbol source.
//! 4. **Cores:** Instantiates the configured number of cores with the configured caches.

use std::sync::Arc;

use crate::config::Config;
use crate::core::Cpu;
use crate::core::cpu::CoreResources;
use crate::core::interrupts::VirtualInterruptTable;
use crate::core::observer::{self, Observer};
use crate::core::symbols::SymbolResolver;
use crate::isa::InstructionSetTable;
use crate::soc::memory::Memory;
use crate::soc::{SharedMemory, share};

/// Builder for a `Cpu` and everything its cores share.
///
/// Anything not set explicitly comes from the configuration or the defaults:
/// a `Memory` of `config.memory.size` bytes, the base and math instruction sets,
/// the halt and memory virtual interrupts, and an observer chosen by
/// `config.general.trace_instructions`.
pub struct CpuBuilder {
    config: Config,
    memory: Option<SharedMemory>,
    observer: Option<Arc<dyn Observer>>,
    symbols: Option<Arc<dyn SymbolResolver>>,
    sets: Option<InstructionSetTable>,
    virtual_interrupts: Option<VirtualInterruptTable>,
}

impl std::fmt::Debug for CpuBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuBuilder")
            .field("config", &self.config)
            .field("custom_memory", &self.memory.is_some())
            .finish_non_exhaustive()
    }
}

impl CpuBuilder {
    /// Starts a builder from `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Machine configuration (core count, memory size, caches, frame checks).
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            memory: None,
            observer: None,
            symbols: None,
            sets: None,
            virtual_interrupts: None,
        }
    }

    /// Overrides the number of cores.
    pub const fn cores(mut self, cores: usize) -> Self {
        self.config.general.cores = cores;
        self
    }

    /// Uses `memory` instead of a fresh `Memory`.
    pub fn memory(mut self, memory: SharedMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Installs an execution observer.
    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Installs a symbol source for backtraces.
    pub fn symbols(mut self, symbols: Arc<dyn SymbolResolver>) -> Self {
        self.symbols = Some(symbols);
        self
    }

    /// Replaces the instruction set table.
    pub fn instruction_sets(mut self, sets: InstructionSetTable) -> Self {
        self.sets = Some(sets);
        self
    }

    /// Replaces the virtual interrupt table.
    pub fn virtual_interrupts(mut self, table: VirtualInterruptTable) -> Self {
        self.virtual_interrupts = Some(table);
        self
    }

    /// Builds the CPU.
    ///
    /// # Returns
    ///
    /// A `Cpu` with every core in `Reset`, ready for `Cpu::boot`.
    pub fn build(self) -> Cpu {
        let memory = self
            .memory
            .unwrap_or_else(|| share(Memory::new(self.config.memory.size)));

        let mut resources = CoreResources::new(memory);
        if let Some(sets) = self.sets {
            resources.sets = Arc::new(sets);
        }
        if let Some(table) = self.virtual_interrupts {
            resources.virtual_interrupts = Arc::new(table);
        }
        resources.observer = self
            .observer
            .unwrap_or_else(|| observer::select(self.config.general.trace_instructions));
        if let Some(symbols) = self.symbols {
            resources.symbols = symbols;
        }

        tracing::debug!(
            cores = self.config.general.cores,
            memory = self.config.memory.size,
            icache = self.config.cache.icache_entries,
            dcache = self.config.cache.dcache_entries,
            "building cpu"
        );
        Cpu::new(
            self.config.general.cores,
            &resources,
            self.config.core_options(),
        )
    }
}
