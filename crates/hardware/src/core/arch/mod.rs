//! Architectural register layouts.
//!
//! The general-purpose register file lives in `common::reg`; this module holds the
//! layouts that need their own packing rules, currently the FLAGS register.

/// Processor flags and their packed 32-bit form.
pub mod flags;
