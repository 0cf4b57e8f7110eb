//! Coprocessor operand stack.

use crate::common::constants::MATH_STACK_DEPTH;
use crate::common::error::Fault;

/// Per-core stack of 64-bit integers operated on by the math set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MathStack {
    values: Vec<i64>,
}

impl MathStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self {
            values: Vec::with_capacity(MATH_STACK_DEPTH),
        }
    }

    /// Pushes a value.
    ///
    /// # Errors
    ///
    /// `Fault::CoprocessorStack("overflow")` when the stack is full.
    pub fn push(&mut self, value: i64) -> Result<(), Fault> {
        if self.values.len() >= MATH_STACK_DEPTH {
            return Err(Fault::CoprocessorStack("overflow"));
        }
        self.values.push(value);
        Ok(())
    }

    /// Pops the top value.
    ///
    /// # Errors
    ///
    /// `Fault::CoprocessorStack("underflow")` when the stack is empty.
    pub fn pop(&mut self) -> Result<i64, Fault> {
        self.values.pop().ok_or(Fault::CoprocessorStack("underflow"))
    }

    /// Returns the top value without removing it.
    pub fn peek(&self) -> Result<i64, Fault> {
        self.values
            .last()
            .copied()
            .ok_or(Fault::CoprocessorStack("underflow"))
    }

    /// Number of values on the stack.
    pub fn depth(&self) -> usize {
        self.values.len()
    }

    /// Values from bottom to top.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Empties the stack.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
