//! Non-local exit from a function body

use crate::ast::ExprId;

/// Control flow signal for non-local jumps.
///
/// A terminating builtin such as `return` does not produce its value in
/// place. It yields `Err(KiwiError::ControlFlow(...))`, which propagates up
/// until the enclosing function call catches it.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    /// Return from the enclosing function with a value.
    Return {
        /// Value to return from the function
        value: ExprId,
    },
}

impl ControlFlow {
    /// Create a return.
    pub fn return_value(value: ExprId) -> Self {
        ControlFlow::Return { value }
    }

    /// The value carried out of the function.
    pub fn value(&self) -> ExprId {
        match self {
            ControlFlow::Return { value } => *value,
        }
    }
}
