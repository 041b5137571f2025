//! Tree-walking evaluation

mod call;
mod control;
mod match_expr;
mod pattern;

pub use control::ControlFlow;

use tracing::{debug, trace};

use crate::ast::{Ast, Expr, ExprId, Payload};
use crate::builtin::ValueBuiltins;
use crate::context::EvalContext;
use crate::error::{KiwiError, Result};
use crate::scope::Scope;
use crate::stack::ensure_sufficient_stack;

/// Evaluate `expr` with the standard builtin table.
///
/// A `return` reached outside any function ends evaluation with its value.
pub fn evaluate(ast: &mut Ast, scope: &mut Scope, expr: ExprId, ctx: &EvalContext) -> Result<ExprId> {
    let builtins = ValueBuiltins::standard();
    Evaluator::new(ast, scope, ctx, &builtins).run(expr)
}

/// Evaluation state for one pass.
pub struct Evaluator<'a> {
    ast: &'a mut Ast,
    scope: &'a mut Scope,
    ctx: &'a EvalContext,
    builtins: &'a ValueBuiltins,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over `ast` in `scope`, calling `builtins`.
    pub fn new(
        ast: &'a mut Ast,
        scope: &'a mut Scope,
        ctx: &'a EvalContext,
        builtins: &'a ValueBuiltins,
    ) -> Self {
        Self {
            ast,
            scope,
            ctx,
            builtins,
            depth: 0,
        }
    }

    /// Evaluate `expr` to a value.
    pub fn run(&mut self, expr: ExprId) -> Result<ExprId> {
        match self.eval(expr) {
            Err(KiwiError::ControlFlow(flow)) => Ok(flow.value()),
            other => other,
        }
    }

    pub(crate) fn eval(&mut self, id: ExprId) -> Result<ExprId> {
        // Check for interruption before each expression
        if self.ctx.is_interrupted() {
            return Err(KiwiError::Interrupted);
        }
        self.depth += 1;
        let depth = self.depth;
        let result = ensure_sufficient_stack(|| self.eval_node(id));
        self.depth -= 1;
        result.map_err(|err| {
            if err.wants_location() {
                err.located(depth, self.ast.render(id))
            } else {
                err
            }
        })
    }

    fn eval_node(&mut self, id: ExprId) -> Result<ExprId> {
        let expr = self.ast.get(id).clone();
        trace!(depth = self.depth, kind = expr.kind_name(), "eval");
        if self.ctx.trace {
            debug!(depth = self.depth, node = %self.ast.render(id), "eval");
        }

        match expr {
            // Self-evaluating: values, types, and callables named without a call
            Expr::Value { .. }
            | Expr::StructValue { .. }
            | Expr::UnionValue { .. }
            | Expr::Struct { .. }
            | Expr::Union { .. }
            | Expr::Arrow { .. }
            | Expr::Variable { .. }
            | Expr::Builtin { .. }
            | Expr::Function { .. } => Ok(id),

            Expr::Reference { .. } => {
                let target = self.scope.resolve(self.ast, id)?;
                self.eval(target)
            }
            Expr::Bind { name, expr } => {
                let value = self.eval(expr)?;
                self.scope.insert_binding(name, value);
                Ok(value)
            }
            Expr::Block { exprs } => self.eval_block(&exprs),
            Expr::NamedArgument { expr, .. } => self.eval(expr),
            Expr::Call { callee, args, .. } => self.eval_call(callee, &args),
            Expr::Match {
                target,
                arms,
                default,
            } => self.eval_match(target, &arms, default),
        }
    }

    fn eval_block(&mut self, exprs: &[ExprId]) -> Result<ExprId> {
        self.in_scope(|this| {
            for expr in exprs {
                this.eval(*expr)?;
            }
            Ok(())
        })?;
        let unit = self.scope.get_expression_by_name("Unit")?;
        Ok(self.ast.value(Payload::Unit, unit))
    }

    /// Run `f` in a child scope, exiting it whatever `f` returns.
    fn in_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scope.enter_scope();
        let result = f(self);
        self.scope.exit_scope();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Ast, Scope, EvalContext) {
        let mut ast = Ast::new();
        let scope = Scope::with_prelude(&mut ast);
        (ast, scope, EvalContext::new())
    }

    fn ty(scope: &Scope, name: &str) -> ExprId {
        scope.get_expression_by_name(name).unwrap()
    }

    #[test]
    fn test_values_evaluate_to_themselves() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let one = ast.value(1, int);
        assert_eq!(evaluate(&mut ast, &mut scope, one, &ctx).unwrap(), one);
        assert_eq!(evaluate(&mut ast, &mut scope, int, &ctx).unwrap(), int);
    }

    #[test]
    fn test_reference_evaluates_binding() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let one = ast.value(1, int);
        let bind = ast.bind("x", one);
        let x = ast.reference(&scope, "x");

        evaluate(&mut ast, &mut scope, bind, &ctx).unwrap();
        assert_eq!(evaluate(&mut ast, &mut scope, x, &ctx).unwrap(), one);
    }

    #[test]
    fn test_block_is_unit_and_scoped() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let one = ast.value(1, int);
        let bind = ast.bind("inner", one);
        let block = ast.block(vec![bind]);

        let result = evaluate(&mut ast, &mut scope, block, &ctx).unwrap();
        assert!(matches!(
            ast.get(result),
            Expr::Value {
                payload: Payload::Unit,
                ..
            }
        ));
        assert!(!scope.contains("inner"));
    }

    #[test]
    fn test_top_level_return() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let one = ast.value(1, int);
        let two = ast.value(2, int);
        let ret = ast.reference(&scope, "return");
        let early = ast.call(ret, vec![one]);
        let block = ast.block(vec![early, two]);

        assert_eq!(evaluate(&mut ast, &mut scope, block, &ctx).unwrap(), one);
        assert!(scope.is_root());
    }

    #[test]
    fn test_unbound_reference() {
        let (mut ast, mut scope, ctx) = setup();
        let ghost = ast.reference(&scope, "ghost");
        let err = evaluate(&mut ast, &mut scope, ghost, &ctx).unwrap_err();
        assert!(err.is_located());
        assert!(matches!(err.root(), KiwiError::ReferenceNotFound { name } if name == "ghost"));
    }

    #[test]
    fn test_interrupt() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let one = ast.value(1, int);
        ctx.interrupt();
        let err = evaluate(&mut ast, &mut scope, one, &ctx).unwrap_err();
        assert!(matches!(err, KiwiError::Interrupted));
    }
}
