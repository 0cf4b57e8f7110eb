//! Instruction Set Architecture (ISA) Definitions.
//!
//! Contains the instruction encoding, the `InstructionSet` interface through which a
//! core decodes and executes instructions, and the two built-in instruction sets.
//!
//! # Instruction Sets
//!
//! * `base` (id 0): Control flow, interrupts, integer arithmetic, loads and stores.
//! * `math` (id 1): Coprocessor operating on a small stack of 64-bit integers.
//!
//! A core switches between sets with `SIS`; every set decodes `SIS` at the same
//! opcode so code can always switch back.

/// Base instruction set (id 0).
pub mod base;

/// Operand extraction shared by the instruction set decoders.
pub mod decode;

/// Instruction disassembler for tracing and diagnostics.
pub mod disasm;

/// Instruction encoder used to build programs.
pub mod encode;

/// Instruction encoding structures and bit extraction utilities.
pub mod instruction;

/// Math coprocessor instruction set (id 1).
pub mod math;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::common::error::Fault;
use crate::core::cpu::CpuCore;

pub use self::base::BaseSet;
pub use self::instruction::{Instruction, Operand};
pub use self::math::MathSet;

/// Id of the base instruction set, active after boot.
pub const BASE_SET_ID: u8 = 0;
/// Id of the math coprocessor instruction set.
pub const MATH_SET_ID: u8 = 1;

/// A family of instructions a core can decode and execute.
///
/// Sets are stateless and shared between cores; any per-core state (such as the
/// coprocessor stack) lives in the `CpuCore`.
pub trait InstructionSet: Send + Sync {
    /// Set id used by `SIS`.
    fn id(&self) -> u8;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    /// Decodes a raw instruction word.
    ///
    /// # Errors
    ///
    /// `Fault::InvalidOpcode` when the word does not encode an instruction of this set.
    fn decode(&self, raw: u32) -> Result<Instruction, Fault>;

    /// Executes a decoded instruction on `core`.
    ///
    /// `IP` already points past the instruction when this is called.
    fn execute(&self, core: &mut CpuCore, inst: &Instruction) -> Result<(), Fault>;

    /// Returns `true` if `inst` may only run in privileged mode.
    fn is_privileged(&self, inst: &Instruction) -> bool;

    /// Formats `inst` as assembly text.
    fn disassemble(&self, inst: &Instruction) -> String {
        disasm::format(inst)
    }
}

/// Installed instruction sets, indexed by id.
#[derive(Clone, Default)]
pub struct InstructionSetTable {
    sets: BTreeMap<u8, Arc<dyn InstructionSet>>,
}

impl std::fmt::Debug for InstructionSetTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.sets.iter().map(|(id, set)| (id, set.name())))
            .finish()
    }
}

impl InstructionSetTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the base and math sets.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.install(Arc::new(BaseSet));
        table.install(Arc::new(MathSet));
        table
    }

    /// Installs `set` under its id, replacing any set with the same id.
    pub fn install(&mut self, set: Arc<dyn InstructionSet>) {
        let _ = self.sets.insert(set.id(), set);
    }

    /// Returns the set with id `id`.
    pub fn get(&self, id: u8) -> Option<Arc<dyn InstructionSet>> {
        self.sets.get(&id).cloned()
    }

    /// Returns the ids of every installed set in ascending order.
    pub fn ids(&self) -> Vec<u8> {
        self.sets.keys().copied().collect()
    }

    /// Returns `true` if no set is installed.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
