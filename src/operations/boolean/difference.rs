use crate::error::Result;
use crate::math::Tolerance;

use super::engine::boolean_execute;
use super::operands::{BooleanOutput, Operands};
use super::select::BooleanOp;

/// Computes the Boolean difference of lines or regions.
pub struct Difference {
    operands: Operands,
}

impl Difference {
    /// Creates a new `Difference` operation.
    #[must_use]
    pub fn new(operands: Operands) -> Self {
        Self { operands }
    }

    /// Executes the difference.
    ///
    /// # Errors
    ///
    /// Returns an error if a region operand is not closed.
    pub fn execute(&self, tol: &Tolerance) -> Result<BooleanOutput> {
        boolean_execute(&self.operands, BooleanOp::Difference, tol)
    }
}
