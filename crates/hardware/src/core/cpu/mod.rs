//! CPU Core Definition and Lifecycle.
//!
//! This module defines `CpuCore`, one processing core of the VM. It coordinates
//! the following:
//! 1. **State Management:** Registers, lifecycle state, exit code, and the last fault.
//! 2. **Instruction Supply:** The instruction cache and the active instruction set.
//! 3. **Memory Hierarchy:** The write-back data cache registered with the shared
//!    coherency controller.
//! 4. **Control Flow:** Stack frames, interrupt entry and exit, and backtraces.
//!
//! Lifecycle: `Reset` -> `Running` <-> `Suspended` -> `Halted`. `Halted` is terminal.

/// Fetch, decode, and execute of one instruction.
pub mod execution;

/// Stack frames and backtraces.
pub mod frame;

/// Segment addressing, stack access, and page services.
pub mod memory;

/// Serializable register snapshots.
pub mod snapshot;

/// Interrupt entry and exit.
pub mod trap;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use self::frame::StackFrame;
use crate::common::addr::PhysAddr;
use crate::common::constants::{DCACHE_ENTRIES, FAULT_EXIT_CODE, ICACHE_ENTRIES};
use crate::common::error::{CpuError, Fault};
use crate::common::reg::{Register, RegisterFile};
use crate::core::interrupts::VirtualInterruptTable;
use crate::core::observer::{NullObserver, Observer};
use crate::core::symbols::{NoSymbols, SymbolResolver};
use crate::core::units::cache::{CacheController, DataCache, InstructionCache};
use crate::isa::instruction::Operand;
use crate::isa::math::MathStack;
use crate::isa::{BASE_SET_ID, InstructionSetTable};
use crate::soc::SharedMemory;

/// Lifecycle state of a core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoreState {
    /// Constructed, never booted.
    #[default]
    Reset,
    /// Alive and executing.
    Running,
    /// Alive, waiting for a hardware interrupt or `wake_up`.
    Suspended,
    /// Terminated; the exit code is final.
    Halted,
}

impl CoreState {
    /// Lower-case state name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Halted => "halted",
        }
    }

    /// Returns `true` for `Running` and `Suspended`.
    pub const fn is_alive(self) -> bool {
        matches!(self, Self::Running | Self::Suspended)
    }
}

impl std::fmt::Display for CoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Initial register state passed to `CpuCore::boot`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreInitState {
    /// Code segment.
    pub cs: u16,
    /// Data segment.
    pub ds: u16,
    /// Stack pointer (DS-relative); FP starts equal to it.
    pub sp: u32,
    /// Entry point (CS-relative).
    pub ip: u32,
    /// Start in privileged mode.
    pub privileged: bool,
}

/// Shared handles every core of a CPU is built from.
#[derive(Clone)]
pub struct CoreResources {
    /// Shared physical memory.
    pub memory: SharedMemory,
    /// Coherency controller all data caches register with.
    pub controller: Arc<CacheController>,
    /// Installed instruction sets.
    pub sets: Arc<InstructionSetTable>,
    /// Host-implemented interrupts.
    pub virtual_interrupts: Arc<VirtualInterruptTable>,
    /// Event sink.
    pub observer: Arc<dyn Observer>,
    /// Backtrace symbol source.
    pub symbols: Arc<dyn SymbolResolver>,
}

impl std::fmt::Debug for CoreResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreResources")
            .field("sets", &self.sets)
            .field("virtual_interrupts", &self.virtual_interrupts)
            .finish_non_exhaustive()
    }
}

impl CoreResources {
    /// Creates resources with the default instruction sets and virtual interrupts,
    /// no observer, and no symbols.
    pub fn new(memory: SharedMemory) -> Self {
        let controller = Arc::new(CacheController::new(Arc::clone(&memory)));
        Self {
            memory,
            controller,
            sets: Arc::new(InstructionSetTable::with_defaults()),
            virtual_interrupts: Arc::new(VirtualInterruptTable::with_defaults()),
            observer: Arc::new(NullObserver),
            symbols: Arc::new(NoSymbols),
        }
    }
}

/// Per-core tunables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreOptions {
    /// Instruction cache capacity in instructions.
    pub icache_entries: usize,
    /// Data cache capacity in halfwords.
    pub dcache_entries: usize,
    /// Verify SP when frames are destroyed.
    pub check_frames: bool,
    /// Physical address of the interrupt vector table.
    pub ivt_address: PhysAddr,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            icache_entries: ICACHE_ENTRIES,
            dcache_entries: DCACHE_ENTRIES,
            check_frames: true,
            ivt_address: PhysAddr(0),
        }
    }
}

/// One processing core.
pub struct CpuCore {
    id: usize,
    regs: RegisterFile,
    state: CoreState,
    icache: InstructionCache,
    dcache: DataCache,
    memory: SharedMemory,
    controller: Arc<CacheController>,
    sets: Arc<InstructionSetTable>,
    active_set: u8,
    virtual_interrupts: Arc<VirtualInterruptTable>,
    observer: Arc<dyn Observer>,
    symbols: Arc<dyn SymbolResolver>,
    frames: Vec<StackFrame>,
    /// One slot per active interrupt; `Some(page)` when the handler stack was allocated.
    interrupt_stacks: Vec<Option<u32>>,
    ivt_address: PhysAddr,
    check_frames: bool,
    exit_code: u32,
    last_fault: Option<Fault>,
    math: MathStack,
}

impl std::fmt::Debug for CpuCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuCore")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("regs", &self.regs)
            .field("active_set", &self.active_set)
            .field("exit_code", &self.exit_code)
            .field("last_fault", &self.last_fault)
            .finish_non_exhaustive()
    }
}

impl CpuCore {
    /// Creates core `id` in the `Reset` state.
    ///
    /// # Arguments
    ///
    /// * `id` - Core id, unique within the CPU; used as the coherency registry index.
    /// * `resources` - Shared memory, controller, instruction sets, and hooks.
    /// * `options` - Cache sizes, frame checking, and the IVT address.
    pub fn new(id: usize, resources: CoreResources, options: CoreOptions) -> Self {
        let dcache = DataCache::new(
            id,
            options.dcache_entries,
            Arc::clone(&resources.memory),
            Arc::clone(&resources.controller),
        );
        Self {
            id,
            regs: RegisterFile::new(),
            state: CoreState::Reset,
            icache: InstructionCache::new(options.icache_entries),
            dcache,
            memory: resources.memory,
            controller: resources.controller,
            sets: resources.sets,
            active_set: BASE_SET_ID,
            virtual_interrupts: resources.virtual_interrupts,
            observer: resources.observer,
            symbols: resources.symbols,
            frames: Vec::new(),
            interrupt_stacks: Vec::new(),
            ivt_address: options.ivt_address,
            check_frames: options.check_frames,
            exit_code: 0,
            last_fault: None,
            math: MathStack::new(),
        }
    }

    fn set_state(&mut self, to: CoreState) {
        let from = self.state;
        if from != to {
            self.state = to;
            self.observer.on_state_change(self.id, from, to);
        }
    }

    /// Boots a `Reset` core.
    ///
    /// Resets the register file, loads CS/DS/SP/IP from `init` (FP = SP), sets the
    /// privileged flag, clears the instruction cache, selects the base instruction
    /// set, and registers the data cache with the controller.
    ///
    /// # Errors
    ///
    /// `CpuError::InvalidState` when the core is not in `Reset`.
    pub fn boot(&mut self, init: &CoreInitState) -> Result<(), CpuError> {
        if self.state != CoreState::Reset {
            return Err(CpuError::InvalidState {
                core: self.id,
                action: "boot",
                state: self.state.name(),
            });
        }
        self.regs.reset(init.ip);
        self.regs.cs = u32::from(init.cs);
        self.regs.ds = u32::from(init.ds);
        self.regs.sp = init.sp;
        self.regs.fp = init.sp;
        self.regs.flags.privileged = init.privileged;
        self.icache.clear();
        self.math.clear();
        self.frames.clear();
        self.interrupt_stacks.clear();
        self.active_set = BASE_SET_ID;
        self.exit_code = 0;
        self.last_fault = None;
        self.controller.register(self.id, self.dcache.lines());
        self.observer.on_boot(self.id, init);
        self.set_state(CoreState::Running);
        Ok(())
    }

    /// Moves a `Running` core to `Suspended`. No-op in any other state.
    pub fn suspend(&mut self) {
        if self.state == CoreState::Running {
            self.set_state(CoreState::Suspended);
        }
    }

    /// Moves a `Suspended` core back to `Running`. No-op in any other state.
    pub fn wake_up(&mut self) {
        if self.state == CoreState::Suspended {
            self.set_state(CoreState::Running);
        }
    }

    /// Halts the core with `exit_code`.
    ///
    /// Dirty data cache entries are written back and kept cached for inspection;
    /// the cache is then unregistered from the controller. Halting a halted core
    /// does nothing.
    pub fn halt(&mut self, exit_code: u32) {
        if self.state == CoreState::Halted {
            return;
        }
        self.exit_code = exit_code;
        if let Err(err) = self.dcache.flush() {
            tracing::warn!(core = self.id, %err, "data cache flush failed during halt");
        }
        self.controller.unregister(self.id);
        self.set_state(CoreState::Halted);
        self.observer.on_halt(self.id, exit_code);
    }

    /// Records `fault` and halts with the fault exit code.
    pub fn die(&mut self, fault: Fault) {
        if self.state == CoreState::Halted {
            return;
        }
        self.observer.on_fault(self.id, self.regs.ip, &fault);
        self.last_fault = Some(fault);
        self.halt(FAULT_EXIT_CODE);
    }

    /// Core id.
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Lifecycle state.
    pub const fn state(&self) -> CoreState {
        self.state
    }

    /// Returns `true` while `Running` or `Suspended`.
    pub const fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    /// Returns `true` while `Running`.
    pub fn is_runnable(&self) -> bool {
        self.state == CoreState::Running
    }

    /// Exit code; meaningful once halted.
    pub const fn exit_code(&self) -> u32 {
        self.exit_code
    }

    /// The fault that killed the core, if any.
    pub const fn last_fault(&self) -> Option<&Fault> {
        self.last_fault.as_ref()
    }

    /// Register file.
    pub const fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// Mutable register file, bypassing register protection.
    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// Reads a register.
    pub fn read(&self, reg: Register) -> u32 {
        self.regs.read(reg)
    }

    /// Writes a register, enforcing register protection.
    pub fn write(&mut self, reg: Register, value: u32) -> Result<(), Fault> {
        self.regs.write(reg, value)
    }

    /// Value of an instruction operand.
    pub fn operand(&self, operand: Operand) -> u32 {
        match operand {
            Operand::Reg(reg) => self.regs.read(reg),
            Operand::Imm(value) => value as u32,
        }
    }

    /// Instruction cache.
    pub const fn icache(&self) -> &InstructionCache {
        &self.icache
    }

    /// Data cache.
    pub const fn dcache(&self) -> &DataCache {
        &self.dcache
    }

    /// Shared memory backend.
    pub fn memory(&self) -> SharedMemory {
        Arc::clone(&self.memory)
    }

    /// Coherency controller.
    pub fn controller(&self) -> &CacheController {
        &self.controller
    }

    /// Id of the active instruction set.
    pub const fn active_set(&self) -> u8 {
        self.active_set
    }

    /// Activates instruction set `id` and clears the instruction cache.
    ///
    /// # Errors
    ///
    /// `Fault::InvalidInstructionSet` when no set with that id is installed.
    pub fn switch_instruction_set(&mut self, id: u8) -> Result<(), Fault> {
        if self.sets.get(id).is_none() {
            return Err(Fault::InvalidInstructionSet(id));
        }
        self.active_set = id;
        self.icache.clear();
        Ok(())
    }

    /// Math coprocessor stack.
    pub const fn math_stack(&self) -> &MathStack {
        &self.math
    }

    /// Mutable math coprocessor stack.
    pub fn math_stack_mut(&mut self) -> &mut MathStack {
        &mut self.math
    }

    /// Live stack frames, outermost first.
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Number of interrupt handlers currently active.
    pub fn interrupt_depth(&self) -> usize {
        self.interrupt_stacks.len()
    }
}
