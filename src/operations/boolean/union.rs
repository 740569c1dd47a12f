use crate::error::Result;
use crate::math::Tolerance;

use super::engine::boolean_execute;
use super::operands::{BooleanOutput, Operands};
use super::select::BooleanOp;

/// Computes the Boolean union of lines or regions.
pub struct Union {
    operands: Operands,
}

impl Union {
    /// Creates a new `Union` operation.
    #[must_use]
    pub fn new(operands: Operands) -> Self {
        Self { operands }
    }

    /// Executes the union.
    ///
    /// # Errors
    ///
    /// Returns an error if a region operand is not closed.
    pub fn execute(&self, tol: &Tolerance) -> Result<BooleanOutput> {
        boolean_execute(&self.operands, BooleanOp::Union, tol)
    }
}
