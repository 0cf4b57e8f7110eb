//! Simulation driver and program loading.
//!
//! This module runs a `Cpu` to completion. It provides:
//! 1. **Simulator:** Round-robin scheduling of runnable cores with an optional timer IRQ.
//! 2. **Loader:** Image reading and interrupt vector table installation.
//! 3. **Errors:** `SimError`, the failure modes of a simulation run.

/// Image loading and interrupt vector table setup.
pub mod loader;

/// The round-robin simulator.
pub mod simulator;

use thiserror::Error;

use crate::common::error::{CpuError, MemoryError};

pub use simulator::Simulator;

/// Errors that end a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// The CPU control surface rejected a request.
    #[error(transparent)]
    Cpu(#[from] CpuError),

    /// Loading into memory failed.
    #[error("memory: {0}")]
    Memory(#[from] MemoryError),

    /// Cores are alive but none is runnable and nothing can wake them.
    #[error("deadlock: {suspended} core(s) suspended with no timer to wake them")]
    Deadlock {
        /// Number of suspended cores.
        suspended: usize,
    },

    /// The step budget ran out before every core halted.
    #[error("step limit of {0} rounds reached")]
    StepLimit(u64),

    /// Reading an input file failed.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration or symbol file is malformed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
