//! Multi-Core CPU.
//!
//! `Cpu` owns every core of the machine together with the shared memory and the
//! coherency controller they were built from. It provides:
//! 1. **Boot:** Boots the first N cores from N init states; the rest stay in `Reset`.
//! 2. **Broadcast Control:** Suspend, wake up, halt, and IRQ delivery across all cores.
//! 3. **Scheduling Primitive:** `step_round` executes one instruction on every
//!    runnable core, in core order.
//! 4. **Exit Status:** The first non-zero core exit code once everything halted.

use std::sync::Arc;

use crate::common::error::CpuError;
use crate::core::cpu::{CoreInitState, CoreOptions, CoreResources, CoreState, CpuCore};
use crate::core::units::cache::CacheController;
use crate::soc::SharedMemory;

/// A multi-core CPU.
pub struct Cpu {
    cores: Vec<CpuCore>,
    memory: SharedMemory,
    controller: Arc<CacheController>,
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("cores", &self.cores)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl Cpu {
    /// Creates a CPU with `count` cores sharing `resources`.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of cores; core ids run from `0` to `count - 1`.
    /// * `resources` - Shared memory, controller, instruction sets, and hooks.
    /// * `options` - Per-core tunables applied to every core.
    ///
    /// # Returns
    ///
    /// A CPU with every core in `Reset`.
    pub fn new(count: usize, resources: &CoreResources, options: CoreOptions) -> Self {
        let cores = (0..count)
            .map(|id| CpuCore::new(id, resources.clone(), options))
            .collect();
        tracing::debug!(cores = count, "cpu created");
        Self {
            cores,
            memory: Arc::clone(&resources.memory),
            controller: Arc::clone(&resources.controller),
        }
    }

    /// Boots core `i` with `states[i]`.
    ///
    /// # Errors
    ///
    /// `CpuError::TooManyInitStates` when more states than cores are supplied, in
    /// which case no core is booted. Any core that is not in `Reset` reports
    /// `CpuError::InvalidState`.
    pub fn boot(&mut self, states: &[CoreInitState]) -> Result<(), CpuError> {
        if states.len() > self.cores.len() {
            return Err(CpuError::TooManyInitStates {
                given: states.len(),
                cores: self.cores.len(),
            });
        }
        for (core, state) in self.cores.iter_mut().zip(states) {
            core.boot(state)?;
        }
        tracing::info!(booted = states.len(), cores = self.cores.len(), "cpu booted");
        Ok(())
    }

    /// Suspends every running core.
    pub fn suspend(&mut self) {
        self.cores.iter_mut().for_each(CpuCore::suspend);
    }

    /// Wakes every suspended core.
    pub fn wake_up(&mut self) {
        self.cores.iter_mut().for_each(CpuCore::wake_up);
    }

    /// Halts every alive core with `exit_code`.
    pub fn halt(&mut self, exit_code: u32) {
        for core in self.cores.iter_mut().filter(|core| core.is_alive()) {
            core.halt(exit_code);
        }
    }

    /// Executes one instruction on every running core, in core order.
    ///
    /// # Returns
    ///
    /// The number of cores that executed.
    pub fn step_round(&mut self) -> usize {
        self.cores.iter_mut().map(CpuCore::step).filter(|ran| *ran).count()
    }

    /// Delivers hardware interrupt `index` to every core.
    ///
    /// # Returns
    ///
    /// The number of cores that took the interrupt.
    pub fn irq_all(&mut self, index: u32) -> usize {
        self.cores
            .iter_mut()
            .map(|core| core.irq(index))
            .filter(|taken| *taken)
            .count()
    }

    /// Core `id`.
    ///
    /// # Errors
    ///
    /// `CpuError::NoSuchCore` when `id` is out of range.
    pub fn core(&self, id: usize) -> Result<&CpuCore, CpuError> {
        self.cores.get(id).ok_or(CpuError::NoSuchCore(id))
    }

    /// Mutable core `id`.
    ///
    /// # Errors
    ///
    /// `CpuError::NoSuchCore` when `id` is out of range.
    pub fn core_mut(&mut self, id: usize) -> Result<&mut CpuCore, CpuError> {
        self.cores.get_mut(id).ok_or(CpuError::NoSuchCore(id))
    }

    /// All cores, in id order.
    pub fn cores(&self) -> &[CpuCore] {
        &self.cores
    }

    /// All cores, mutably.
    ///
    /// Cores only share the memory backend and the coherency controller, both of
    /// which synchronize internally, so disjoint cores may be driven from
    /// separate threads.
    pub fn cores_mut(&mut self) -> &mut [CpuCore] {
        &mut self.cores
    }

    /// Number of cores.
    pub fn len(&self) -> usize {
        self.cores.len()
    }

    /// Returns `true` for a CPU without cores.
    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    /// Returns `true` while any core is `Running` or `Suspended`.
    pub fn is_alive(&self) -> bool {
        self.cores.iter().any(CpuCore::is_alive)
    }

    /// Ids of the cores in `Running`.
    pub fn runnable_cores(&self) -> Vec<usize> {
        self.cores
            .iter()
            .filter(|core| core.is_runnable())
            .map(CpuCore::id)
            .collect()
    }

    /// Number of cores in `state`.
    pub fn count_in(&self, state: CoreState) -> usize {
        self.cores.iter().filter(|core| core.state() == state).count()
    }

    /// Aggregate exit code: the first non-zero exit code in core order, else 0.
    pub fn exit_code(&self) -> u32 {
        self.cores
            .iter()
            .map(CpuCore::exit_code)
            .find(|code| *code != 0)
            .unwrap_or(0)
    }

    /// Shared memory backend.
    pub fn memory(&self) -> SharedMemory {
        Arc::clone(&self.memory)
    }

    /// Coherency controller.
    pub fn controller(&self) -> &CacheController {
        &self.controller
    }
}
