//! Error types for inference and evaluation

use thiserror::Error;

use crate::eval::ControlFlow;

/// Failures of the scope chain itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScopeError {
    /// Name not bound anywhere in the chain
    #[error("Undefined name: {name}")]
    NotFound {
        /// Name that was looked up
        name: String,
    },

    /// Too many nested calls
    #[error("Stack overflow: call depth {depth} exceeds maximum {max}")]
    StackOverflow {
        /// Depth reached
        depth: usize,
        /// Configured limit
        max: usize,
    },
}

/// Main error type for kiwi operations
#[derive(Error, Debug)]
pub enum KiwiError {
    /// A name or index could not be resolved anywhere in the scope chain
    #[error("Reference not found: {name}")]
    ReferenceNotFound {
        /// Unresolved name
        name: String,
    },

    /// A builtin name has no registered implementation
    #[error("Undefined builtin: {name}")]
    UndefinedBuiltin {
        /// Builtin name
        name: String,
    },

    /// Call-site argument count differs from the declared arity
    #[error("{callee} expects {expected} argument(s), got {got}")]
    ArgumentSizeMismatch {
        /// Rendered callee
        callee: String,
        /// Declared arity
        expected: usize,
        /// Arguments supplied
        got: usize,
    },

    /// A type-equality assertion failed
    #[error("Type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type, rendered
        expected: String,
        /// Actual type, rendered
        found: String,
        /// What was being checked
        context: String,
    },

    /// The callee is not a builtin, function, struct or union
    #[error("Cannot call {kind}: {callee}")]
    UnhandledCallTarget {
        /// Kind of the resolved callee
        kind: &'static str,
        /// Rendered callee
        callee: String,
    },

    /// A match exhausted its arms and has no default
    #[error("No matching branch for {target}")]
    NoMatchingBranch {
        /// Rendered match target value
        target: String,
    },

    /// Malformed union instantiation or unknown member
    #[error("Invalid constructor use: {reason}")]
    InvalidConstructorArity {
        /// What was wrong
        reason: String,
    },

    /// Inference could not determine a type
    #[error("Cannot infer the type of {what}")]
    UnknownType {
        /// What lacked a type
        what: String,
    },

    /// A builtin implementation failed
    #[error("Error in builtin {name}: {message}")]
    BuiltinError {
        /// Builtin name
        name: String,
        /// Failure reported by the builtin
        message: String,
    },

    /// Call depth limit reached
    #[error("Stack overflow: call depth {depth} exceeds maximum {max}")]
    StackOverflow {
        /// Depth reached
        depth: usize,
        /// Configured limit
        max: usize,
    },

    /// The interrupt flag was raised
    #[error("Evaluation interrupted")]
    Interrupted,

    /// Non-local exit in flight; caught before a pass returns
    #[error("Control flow escaped its function: {0:?}")]
    ControlFlow(ControlFlow),

    /// Failure annotated with the node being visited when it happened
    #[error("{source} (at depth {depth} in `{node}`)")]
    At {
        /// Recursion depth of the failing visit
        depth: usize,
        /// Rendered failing node
        node: String,
        /// The failure itself
        #[source]
        source: Box<KiwiError>,
    },
}

impl KiwiError {
    /// The failure kind with any location wrapper removed.
    pub fn root(&self) -> &KiwiError {
        match self {
            KiwiError::At { source, .. } => source.root(),
            other => other,
        }
    }

    /// Consume the error, returning the unwrapped failure kind.
    pub fn into_root(self) -> KiwiError {
        match self {
            KiwiError::At { source, .. } => source.into_root(),
            other => other,
        }
    }

    /// Already carries a location.
    pub fn is_located(&self) -> bool {
        matches!(self, KiwiError::At { .. })
    }

    /// Whether the error should be annotated with the failing node.
    ///
    /// Control flow and interruption are not failures of a node.
    pub fn wants_location(&self) -> bool {
        !matches!(
            self,
            KiwiError::At { .. } | KiwiError::ControlFlow(_) | KiwiError::Interrupted
        )
    }

    /// Attach the failing node, unless the error is already located.
    pub fn located(self, depth: usize, node: String) -> Self {
        if self.wants_location() {
            KiwiError::At {
                depth,
                node,
                source: Box::new(self),
            }
        } else {
            self
        }
    }

    /// Type mismatch between two rendered types.
    pub fn type_mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        KiwiError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
            context: context.into(),
        }
    }

    /// Arity mismatch at a call site.
    pub fn argument_size(callee: impl Into<String>, expected: usize, got: usize) -> Self {
        KiwiError::ArgumentSizeMismatch {
            callee: callee.into(),
            expected,
            got,
        }
    }

    /// Inference could not find a type for `what`.
    pub fn unknown_type(what: impl Into<String>) -> Self {
        KiwiError::UnknownType { what: what.into() }
    }
}

impl From<ScopeError> for KiwiError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::NotFound { name } => KiwiError::ReferenceNotFound { name },
            ScopeError::StackOverflow { depth, max } => KiwiError::StackOverflow { depth, max },
        }
    }
}

/// Result type alias for kiwi operations
pub type Result<T> = std::result::Result<T, KiwiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprId;

    #[test]
    fn test_located_wraps_once() {
        let err = KiwiError::unknown_type("x")
            .located(3, "x".to_string())
            .located(2, "f(x)".to_string());

        match &err {
            KiwiError::At { depth, node, .. } => {
                assert_eq!(*depth, 3);
                assert_eq!(node, "x");
            }
            other => panic!("expected located error, got {:?}", other),
        }
        assert!(matches!(err.root(), KiwiError::UnknownType { .. }));
    }

    #[test]
    fn test_control_flow_is_never_located() {
        let err = KiwiError::ControlFlow(ControlFlow::Return { value: ExprId(0) })
            .located(1, "return(1)".to_string());
        assert!(!err.is_located());
        assert!(!KiwiError::Interrupted.wants_location());
    }

    #[test]
    fn test_scope_error_conversion() {
        let err: KiwiError = ScopeError::NotFound {
            name: "x".to_string(),
        }
        .into();
        assert!(matches!(err, KiwiError::ReferenceNotFound { ref name } if name == "x"));

        let err: KiwiError = ScopeError::StackOverflow { depth: 5, max: 5 }.into();
        assert!(matches!(err, KiwiError::StackOverflow { depth: 5, max: 5 }));
    }

    #[test]
    fn test_display_includes_location() {
        let err = KiwiError::type_mismatch("Float", "Int", "argument").located(2, "f(3)".to_string());
        assert_eq!(
            err.to_string(),
            "Type mismatch in argument: expected Float, found Int (at depth 2 in `f(3)`)"
        );
    }
}
