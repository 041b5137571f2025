//! # Kiwi
//!
//! The front-end core of a small statically typed expression language.
//!
//! Programs are trees of [`Expr`] nodes held in an [`Ast`] arena. Values
//! and types share that one node taxonomy: a struct type is a node, and so is
//! the struct value built by calling it.
//!
//! ## Passes
//!
//! - **Scope chain** ([`Scope`]): lexically nested name bindings, preloaded
//!   with the primitive types and builtins by [`Scope::with_prelude`]
//! - **Equality** ([`equal`]): structural comparison of values and types
//! - **Substitution** ([`substitute`]): rewrite used to instantiate generic
//!   signatures
//! - **Trace** ([`type_trace`]): type inference, filling untyped parameters
//!   and return types in place
//! - **Evaluation** ([`evaluate`]): reduces an expression to a value
//!
//! ```
//! use kiwi::{evaluate, type_trace, Ast, EvalContext, Expr, Payload, Scope};
//!
//! let mut ast = Ast::new();
//! let mut scope = Scope::with_prelude(&mut ast);
//! let ctx = EvalContext::new();
//!
//! let int = scope.get_expression_by_name("Int").unwrap();
//! let plus = ast.reference(&scope, "+");
//! let one = ast.value(1, int);
//! let two = ast.value(2, int);
//! let sum = ast.binary(plus, one, two);
//!
//! assert_eq!(type_trace(&mut ast, &mut scope, sum, &ctx).unwrap().ty, int);
//! let value = evaluate(&mut ast, &mut scope, sum, &ctx).unwrap();
//! assert!(matches!(ast.get(value), Expr::Value { payload: Payload::Int(3), .. }));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtin;
pub mod context;
pub mod equality;
pub mod error;
pub mod eval;
pub mod scope;
pub mod substitute;
pub mod trace;

mod stack;

// Re-export main types
pub use ast::{Ast, CallForm, Constructor, Expr, ExprId, MatchArm, Pattern, Payload, TagWidth};
pub use builtin::{check_consistency, BuiltinArgs, TypeBuiltins, TypeRule, ValueBuiltins};
pub use context::EvalContext;
pub use equality::{equal, equal_with, EqualityMode};
pub use error::{KiwiError, Result, ScopeError};
pub use eval::{evaluate, ControlFlow, Evaluator};
pub use scope::{Binding, Scope, ScopeGuard};
pub use substitute::{substitute, substitute_with};
pub use trace::{type_trace, TypeTrace, Typed};

/// Kiwi version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
