//! Execution units and functional components.
//!
//! This module contains the integer ALU and the per-core cache system with its
//! coherency controller.

/// Arithmetic Logic Unit for integer operations.
pub mod alu;

/// Instruction and data caches plus the coherency controller.
pub mod cache;
