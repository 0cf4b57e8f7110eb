//! Simulator: drives a `Cpu` until every core halted.
//!
//! Scheduling is cooperative. Each round executes one instruction on every runnable
//! core, in core order. With a timer configured, the timer interrupt is delivered to
//! every core each `timer_interval` rounds, which is the only thing that wakes a
//! core suspended by `IDLE`.

use crate::common::addr::PhysAddr;
use crate::common::sync::lock;
use crate::config::{Config, SchedulerConfig};
use crate::core::Cpu;
use crate::core::cpu::{CoreInitState, CoreState};
use crate::sim::SimError;
use crate::sim::loader;
use crate::soc::builder::CpuBuilder;

/// Top-level simulator: the CPU plus its scheduling policy.
#[derive(Debug)]
pub struct Simulator {
    cpu: Cpu,
    scheduler: SchedulerConfig,
    rounds: u64,
}

impl Simulator {
    /// Creates a simulator with a CPU built from `config`.
    pub fn new(config: &Config) -> Self {
        Self::with_cpu(CpuBuilder::new(config).build(), config.scheduler.clone())
    }

    /// Wraps an already built CPU.
    pub const fn with_cpu(cpu: Cpu, scheduler: SchedulerConfig) -> Self {
        Self {
            cpu,
            scheduler,
            rounds: 0,
        }
    }

    /// Copies `image` to physical address `addr` and reserves its pages.
    ///
    /// Call before `boot`; cores never observe the load through their caches.
    pub fn load(&mut self, addr: PhysAddr, image: &[u8]) -> Result<(), SimError> {
        let memory = self.cpu.memory();
        let mut backend = lock(&memory);
        loader::place_image(&mut *backend, addr, image)?;
        Ok(())
    }

    /// Boots core `i` with `states[i]`.
    pub fn boot(&mut self, states: &[CoreInitState]) -> Result<(), SimError> {
        self.cpu.boot(states)?;
        Ok(())
    }

    /// Runs until every core halted.
    ///
    /// # Arguments
    ///
    /// * `max_steps` - Round budget; falls back to the configured `max_steps`, and
    ///   runs unbounded when neither is set.
    ///
    /// # Returns
    ///
    /// The CPU exit code: the first non-zero core exit code in core order, else 0.
    ///
    /// # Errors
    ///
    /// `SimError::Deadlock` when alive cores remain but none can run and no timer
    /// is configured; `SimError::StepLimit` when the budget runs out.
    pub fn run(&mut self, max_steps: Option<u64>) -> Result<u32, SimError> {
        let limit = max_steps.or(self.scheduler.max_steps);
        let timer = self.scheduler.timer_interval.filter(|interval| *interval > 0);
        tracing::info!(
            cores = self.cpu.len(),
            limit = ?limit,
            timer = ?timer,
            "simulation started"
        );

        while self.cpu.is_alive() {
            if limit.is_some_and(|limit| self.rounds >= limit) {
                tracing::warn!(rounds = self.rounds, "step limit reached");
                return Err(SimError::StepLimit(self.rounds));
            }

            let stepped = self.cpu.step_round();
            self.rounds += 1;

            match timer {
                Some(interval) if self.rounds % interval == 0 => {
                    let taken = self.cpu.irq_all(self.scheduler.timer_irq);
                    tracing::trace!(round = self.rounds, taken, "timer tick");
                }
                None if stepped == 0 && self.cpu.is_alive() => {
                    let suspended = self.cpu.count_in(CoreState::Suspended);
                    tracing::warn!(suspended, "no runnable core left");
                    return Err(SimError::Deadlock { suspended });
                }
                _ => {}
            }
        }

        let code = self.cpu.exit_code();
        tracing::info!(rounds = self.rounds, exit_code = code, "simulation finished");
        Ok(code)
    }

    /// Number of scheduler rounds run so far.
    pub const fn rounds(&self) -> u64 {
        self.rounds
    }

    /// The simulated CPU.
    pub const fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Mutable access to the simulated CPU.
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }
}
