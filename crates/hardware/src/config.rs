//! Configuration system for the VM.
//!
//! This module defines all configuration structures used to parameterize a
//! machine. It provides:
//! 1. **Defaults:** Baseline machine constants (core count, memory size, cache sizes).
//! 2. **Structures:** Hierarchical config for general, memory, cache, and scheduler settings.
//! 3. **Conversion:** The per-core options every core is built with.
//!
//! Configuration is supplied as JSON (`Config::from_json`, the CLI `--config` flag)
//! or use `Config::default()`. Every field may be omitted.

use serde::Deserialize;

use crate::common::addr::PhysAddr;
use crate::core::cpu::CoreOptions;

/// Default configuration constants for the VM.
///
/// These values define the baseline machine when not explicitly overridden in a
/// JSON configuration file.
mod defaults {
    /// Number of cores.
    pub const CORES: usize = 1;

    /// Total size of physical memory (1 MiB, sixteen segments).
    pub const MEMORY_SIZE: u32 = 0x10_0000;

    /// Instruction cache capacity in decoded instructions.
    pub const ICACHE_ENTRIES: usize = crate::common::constants::ICACHE_ENTRIES;

    /// Data cache capacity in halfword entries.
    pub const DCACHE_ENTRIES: usize = crate::common::constants::DCACHE_ENTRIES;

    /// Interrupt vector table base address.
    pub const IVT_ADDRESS: u32 = 0;
}

/// Root configuration for the VM.
///
/// # Examples
///
/// ```
/// use smpvm_core::config::Config;
///
/// let json = r#"{
///     "general": { "cores": 2, "trace_instructions": true },
///     "cache": { "dcache_entries": 64 },
///     "scheduler": { "timer_interval": 1000, "timer_irq": 3 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.general.cores, 2);
/// assert!(config.general.check_frames);
/// assert_eq!(config.cache.dcache_entries, 64);
/// assert_eq!(config.cache.icache_entries, 256);
/// assert_eq!(config.scheduler.timer_interval, Some(1000));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General machine settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Physical memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Per-core cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Simulator scheduling configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Parses a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON or mistyped fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Per-core options derived from this configuration.
    pub fn core_options(&self) -> CoreOptions {
        CoreOptions {
            icache_entries: self.cache.icache_entries,
            dcache_entries: self.cache.dcache_entries,
            check_frames: self.general.check_frames,
            ivt_address: PhysAddr::new(self.general.ivt_address),
        }
    }
}

/// General machine settings.
///
/// Contains the core count, frame checking, tracing, and the location of the
/// interrupt vector table.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Number of cores in the CPU
    #[serde(default = "GeneralConfig::default_cores")]
    pub cores: usize,

    /// Verify SP on RET and RETINT; a mismatch kills the core
    #[serde(default = "GeneralConfig::default_check_frames")]
    pub check_frames: bool,

    /// Log every executed instruction through `tracing`
    #[serde(default)]
    pub trace_instructions: bool,

    /// Physical address of the interrupt vector table
    #[serde(default = "GeneralConfig::default_ivt_address")]
    pub ivt_address: u32,
}

impl GeneralConfig {
    fn default_cores() -> usize {
        defaults::CORES
    }

    fn default_check_frames() -> bool {
        true
    }

    fn default_ivt_address() -> u32 {
        defaults::IVT_ADDRESS
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cores: defaults::CORES,
            check_frames: true,
            trace_instructions: false,
            ivt_address: defaults::IVT_ADDRESS,
        }
    }
}

/// Physical memory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Memory size in bytes, rounded up to whole pages
    #[serde(default = "MemoryConfig::default_size")]
    pub size: u32,
}

impl MemoryConfig {
    fn default_size() -> u32 {
        defaults::MEMORY_SIZE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size: defaults::MEMORY_SIZE,
        }
    }
}

/// Per-core cache sizes.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Instruction cache capacity in decoded instructions
    #[serde(default = "CacheConfig::default_icache_entries")]
    pub icache_entries: usize,

    /// Data cache capacity in halfword entries
    #[serde(default = "CacheConfig::default_dcache_entries")]
    pub dcache_entries: usize,
}

impl CacheConfig {
    fn default_icache_entries() -> usize {
        defaults::ICACHE_ENTRIES
    }

    fn default_dcache_entries() -> usize {
        defaults::DCACHE_ENTRIES
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            icache_entries: defaults::ICACHE_ENTRIES,
            dcache_entries: defaults::DCACHE_ENTRIES,
        }
    }
}

/// Simulator scheduling configuration.
///
/// Without a timer, a machine whose alive cores are all suspended can never make
/// progress again and the simulator reports a deadlock.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchedulerConfig {
    /// Deliver the timer interrupt every N scheduler rounds
    #[serde(default)]
    pub timer_interval: Option<u64>,

    /// Interrupt index of the timer
    #[serde(default)]
    pub timer_irq: u32,

    /// Stop with an error after this many scheduler rounds
    #[serde(default)]
    pub max_steps: Option<u64>,
}
