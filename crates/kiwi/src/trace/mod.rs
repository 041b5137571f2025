//! Type inference by pseudo-evaluation
//!
//! The trace walks a tree the way the evaluator would, but computes types
//! instead of values. Type hints flow downward from call sites and match
//! targets into parameters that were declared without a type; those slots
//! are filled in place and then checked at every later use.

mod call;
mod generic;
mod match_expr;

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::ast::{Ast, Expr, ExprId};
use crate::builtin::TypeBuiltins;
use crate::context::EvalContext;
use crate::equality::equal_with;
use crate::error::{KiwiError, Result};
use crate::scope::Scope;
use crate::stack::ensure_sufficient_stack;

/// An expression together with its inferred type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typed {
    /// The traced expression (references are reported resolved)
    pub expr: ExprId,
    /// Its type
    pub ty: ExprId,
}

/// Result of visiting one node; the type may still be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Traced {
    pub expr: ExprId,
    pub ty: Option<ExprId>,
}

/// Infer the type of `expr` with the standard builtin table.
///
/// Unset `Variable` types and `Function` return types reached by the trace
/// are filled in place. Bindings introduced at the top level stay in `scope`.
pub fn type_trace(ast: &mut Ast, scope: &mut Scope, expr: ExprId, ctx: &EvalContext) -> Result<Typed> {
    let builtins = TypeBuiltins::standard();
    TypeTrace::new(ast, scope, ctx, &builtins).run(expr)
}

/// Type inference state for one pass.
pub struct TypeTrace<'a> {
    ast: &'a mut Ast,
    scope: &'a mut Scope,
    ctx: &'a EvalContext,
    builtins: &'a TypeBuiltins,
    depth: usize,
    /// Functions whose signature is complete
    traced: HashSet<ExprId>,
    /// Functions whose body is being traced
    in_progress: Vec<ExprId>,
    /// `return` type collected per function being traced
    returns: Vec<Option<ExprId>>,
}

impl<'a> TypeTrace<'a> {
    /// Create a trace over `ast` in `scope`, typing builtins with `builtins`.
    pub fn new(
        ast: &'a mut Ast,
        scope: &'a mut Scope,
        ctx: &'a EvalContext,
        builtins: &'a TypeBuiltins,
    ) -> Self {
        Self {
            ast,
            scope,
            ctx,
            builtins,
            depth: 0,
            traced: HashSet::new(),
            in_progress: Vec::new(),
            returns: Vec::new(),
        }
    }

    /// Infer the type of `expr`.
    pub fn run(&mut self, expr: ExprId) -> Result<Typed> {
        let traced = self.visit(expr, None)?;
        match traced.ty {
            Some(ty) => Ok(Typed {
                expr: traced.expr,
                ty,
            }),
            None => Err(KiwiError::unknown_type(self.ast.render(expr))),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Dispatch
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn visit(&mut self, id: ExprId, hint: Option<ExprId>) -> Result<Traced> {
        if self.ctx.is_interrupted() {
            return Err(KiwiError::Interrupted);
        }
        self.depth += 1;
        let depth = self.depth;
        let result = ensure_sufficient_stack(|| self.visit_node(id, hint));
        self.depth -= 1;
        result.map_err(|err| {
            if err.wants_location() {
                err.located(depth, self.ast.render(id))
            } else {
                err
            }
        })
    }

    fn visit_node(&mut self, id: ExprId, hint: Option<ExprId>) -> Result<Traced> {
        let expr = self.ast.get(id).clone();
        trace!(depth = self.depth, kind = expr.kind_name(), "type trace");
        if self.ctx.trace {
            debug!(
                depth = self.depth,
                node = %self.ast.render(id),
                hint = ?hint.map(|h| self.ast.render(h)),
                "type trace"
            );
        }

        match expr {
            Expr::Value { ty, .. } | Expr::StructValue { ty, .. } | Expr::UnionValue { ty, .. } => {
                Ok(self.typed(id, ty))
            }
            Expr::Variable { ty, .. } => self.trace_variable(id, ty.get().copied(), hint),
            Expr::Reference { .. } => {
                let target = self.scope.resolve(self.ast, id)?;
                self.visit(target, hint)
            }
            Expr::Function { args, body, .. } => self.trace_function(id, &args, body),
            Expr::Block { exprs } => self.trace_block(id, &exprs),
            Expr::Match {
                target,
                arms,
                default,
            } => self.trace_match(id, target, &arms, default),
            Expr::Builtin { ty, .. } => Ok(self.typed(id, ty.unwrap_or(id))),
            Expr::Arrow { .. } | Expr::Struct { .. } | Expr::Union { .. } => {
                let universe = self.universe()?;
                Ok(self.typed(id, universe))
            }
            Expr::Bind { name, expr } => self.trace_bind(id, name, expr, hint),
            Expr::NamedArgument { expr, .. } => self.visit(expr, hint),
            Expr::Call { callee, args, .. } => self.trace_call(id, callee, &args, hint),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Node kinds
    // ═══════════════════════════════════════════════════════════════════

    fn trace_variable(&mut self, id: ExprId, ty: Option<ExprId>, hint: Option<ExprId>) -> Result<Traced> {
        match (ty, hint) {
            (None, Some(hint)) => {
                self.ast.fill_type(id, hint);
                Ok(self.typed(id, hint))
            }
            (Some(ty), Some(hint)) => {
                self.expect(hint, ty, "variable")?;
                Ok(self.typed(id, ty))
            }
            (Some(ty), None) => Ok(self.typed(id, ty)),
            (None, None) => Ok(Traced { expr: id, ty: None }),
        }
    }

    fn trace_block(&mut self, id: ExprId, exprs: &[ExprId]) -> Result<Traced> {
        self.in_scope(|this| {
            for expr in exprs {
                this.visit(*expr, None)?;
            }
            Ok(())
        })?;
        let unit = self.scope.get_expression_by_name("Unit")?;
        Ok(self.typed(id, unit))
    }

    fn trace_bind(&mut self, id: ExprId, name: String, expr: ExprId, hint: Option<ExprId>) -> Result<Traced> {
        let target = self.scope.try_resolve(self.ast, expr);
        if !self.ast.get(target).is_definition() {
            let traced = self.visit(expr, hint)?;
            // a type built by `struct`/`union` is bound as that type so it stays callable
            let bound = match self.reflect_aggregate(target) {
                Some(aggregate) => aggregate,
                None => self.ast.variable(name.clone(), traced.ty),
            };
            self.scope.insert_binding(name, bound);
            return Ok(Traced {
                expr: id,
                ty: traced.ty,
            });
        }

        // Definitions are bound as themselves so later calls can see them.
        self.scope.insert_binding(name, target);
        let deferred = match self.ast.get(target) {
            Expr::Function { args, .. } => args.iter().any(|arg| self.ast.param_type(*arg).is_none()),
            _ => false,
        };
        if deferred {
            // typed at its first call site
            return Ok(Traced { expr: id, ty: None });
        }
        let traced = self.visit(target, hint)?;
        Ok(Traced {
            expr: id,
            ty: traced.ty,
        })
    }

    /// Trace a function body once, filling its return type.
    fn trace_function(&mut self, id: ExprId, args: &[ExprId], body: ExprId) -> Result<Traced> {
        if self.traced.contains(&id) {
            return self.function_signature(id);
        }
        if self.in_progress.contains(&id) {
            if self.ast.type_of(id).is_none() {
                return Err(KiwiError::unknown_type(format!(
                    "return type of recursive function {}",
                    self.ast.render(id)
                )));
            }
            return self.function_signature(id);
        }

        self.in_progress.push(id);
        self.returns.push(None);
        let result = self.in_scope(|this| {
            for arg in args {
                let name = this.ast.get(*arg).name().unwrap_or("_").to_string();
                this.scope.insert_binding(name, *arg);
            }
            this.visit(body, None)
        });
        let returned = self.returns.pop().flatten();
        self.in_progress.pop();
        let body = result?;

        match (self.ast.type_of(id), returned.or(body.ty)) {
            (Some(declared), Some(found)) => self.expect(declared, found, "return type")?,
            (None, Some(found)) => {
                self.ast.fill_type(id, found);
            }
            (Some(_), None) => {}
            (None, None) => {
                return Err(KiwiError::unknown_type(format!(
                    "return type of {}",
                    self.ast.render(id)
                )))
            }
        }
        self.traced.insert(id);
        self.function_signature(id)
    }

    fn function_signature(&mut self, id: ExprId) -> Result<Traced> {
        match self.ast.function_type(id) {
            Some(arrow) => Ok(Traced {
                expr: id,
                ty: Some(arrow),
            }),
            None => {
                let missing = match self.ast.get(id) {
                    Expr::Function { args, .. } => args
                        .iter()
                        .find(|arg| self.ast.param_type(**arg).is_none())
                        .map(|arg| format!("parameter {}", self.ast.render(*arg))),
                    _ => None,
                };
                Err(KiwiError::unknown_type(
                    missing.unwrap_or_else(|| format!("signature of {}", self.ast.render(id))),
                ))
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Helpers
    // ═══════════════════════════════════════════════════════════════════

    /// Run `f` in a child scope, exiting it whatever `f` returns.
    fn in_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scope.enter_scope();
        let result = f(self);
        self.scope.exit_scope();
        result
    }

    fn typed(&self, expr: ExprId, ty: ExprId) -> Traced {
        Traced {
            expr,
            ty: Some(self.scope.try_resolve(self.ast, ty)),
        }
    }

    /// The type of types.
    fn universe(&self) -> Result<ExprId> {
        Ok(self.scope.get_expression_by_name("Type")?)
    }

    /// Assert that `found` is type-equal to `expected`.
    fn expect(&self, expected: ExprId, found: ExprId, context: &str) -> Result<()> {
        if equal_with(self.ast, self.scope, expected, found, self.ctx.equality) {
            Ok(())
        } else {
            Err(KiwiError::type_mismatch(
                self.ast.render(expected),
                self.ast.render(found),
                context,
            ))
        }
    }

    /// Visit `id` under the hint `expected` and assert the result agrees.
    fn check(&mut self, id: ExprId, expected: ExprId, context: &str) -> Result<Traced> {
        let traced = self.visit(id, Some(expected))?;
        match traced.ty {
            Some(found) => {
                self.expect(expected, found, context)?;
                Ok(traced)
            }
            None => Ok(self.typed(traced.expr, expected)),
        }
    }

    /// Merge a branch type into the running type, asserting agreement.
    fn unify(&self, current: Option<ExprId>, next: Option<ExprId>, context: &str) -> Result<Option<ExprId>> {
        match (current, next) {
            (Some(current), Some(next)) => {
                self.expect(current, next, context)?;
                Ok(Some(current))
            }
            (None, next) => Ok(next),
            (current, None) => Ok(current),
        }
    }

    /// Collect the type of a terminating builtin for the enclosing function.
    fn record_return(&mut self, ty: ExprId) -> Result<()> {
        match self.returns.last().copied() {
            None => Ok(()),
            Some(Some(previous)) => self.expect(previous, ty, "return"),
            Some(None) => {
                if let Some(slot) = self.returns.last_mut() {
                    *slot = Some(ty);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Payload;

    fn setup() -> (Ast, Scope, EvalContext) {
        let mut ast = Ast::new();
        let scope = Scope::with_prelude(&mut ast);
        (ast, scope, EvalContext::new())
    }

    fn ty(scope: &Scope, name: &str) -> ExprId {
        scope.get_expression_by_name(name).unwrap()
    }

    #[test]
    fn test_value_has_declared_type() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let one = ast.value(1, int);
        let typed = type_trace(&mut ast, &mut scope, one, &ctx).unwrap();
        assert_eq!(typed, Typed { expr: one, ty: int });
    }

    #[test]
    fn test_value_type_reference_is_resolved() {
        let (mut ast, mut scope, ctx) = setup();
        let int_ref = ast.reference(&scope, "Int");
        let one = ast.value(1, int_ref);
        let typed = type_trace(&mut ast, &mut scope, one, &ctx).unwrap();
        assert_eq!(typed.ty, ty(&scope, "Int"));
    }

    #[test]
    fn test_type_nodes_are_typed_type() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let universe = ty(&scope, "Type");
        let member = ast.variable("a", Some(int));
        let s = ast.structure(vec![member]);

        assert_eq!(type_trace(&mut ast, &mut scope, s, &ctx).unwrap().ty, universe);
        assert_eq!(type_trace(&mut ast, &mut scope, int, &ctx).unwrap().ty, universe);
        // Type is its own type
        assert_eq!(
            type_trace(&mut ast, &mut scope, universe, &ctx).unwrap().ty,
            universe
        );
    }

    #[test]
    fn test_untyped_variable_is_unknown() {
        let (mut ast, mut scope, ctx) = setup();
        let x = ast.variable("x", None);
        let err = type_trace(&mut ast, &mut scope, x, &ctx).unwrap_err();
        assert!(matches!(err.root(), KiwiError::UnknownType { .. }));
    }

    #[test]
    fn test_block_is_unit() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let one = ast.value(1, int);
        let block = ast.block(vec![one]);
        let typed = type_trace(&mut ast, &mut scope, block, &ctx).unwrap();
        assert_eq!(typed.ty, ty(&scope, "Unit"));
    }

    #[test]
    fn test_bind_introduces_typed_variable() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let one = ast.value(1, int);
        let bind = ast.bind("x", one);
        type_trace(&mut ast, &mut scope, bind, &ctx).unwrap();

        let x = scope.get_expression_by_name("x").unwrap();
        assert!(matches!(ast.get(x), Expr::Variable { .. }));
        assert_eq!(ast.type_of(x), Some(int));
    }

    #[test]
    fn test_function_return_type_is_filled() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let x = ast.variable("x", Some(int));
        let x_ref = ast.reference(&scope, "x");
        let f = ast.lambda(vec![x], x_ref);

        let typed = type_trace(&mut ast, &mut scope, f, &ctx).unwrap();
        assert_eq!(ast.type_of(f), Some(int));
        assert_eq!(ast.render(typed.ty), "(x: Int) -> Int");
    }

    #[test]
    fn test_declared_return_type_is_checked() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let float = ty(&scope, "Float");
        let one = ast.value(1, int);
        let f = ast.function(vec![], Some(float), one);

        let err = type_trace(&mut ast, &mut scope, f, &ctx).unwrap_err();
        match err.root() {
            KiwiError::TypeMismatch {
                expected,
                found,
                context,
            } => {
                assert_eq!(expected, "Float");
                assert_eq!(found, "Int");
                assert_eq!(context, "return type");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupt() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let one = ast.value(1, int);
        ctx.interrupt();
        let err = type_trace(&mut ast, &mut scope, one, &ctx).unwrap_err();
        assert!(matches!(err, KiwiError::Interrupted));
    }

    #[test]
    fn test_symbol_payloads() {
        let (mut ast, mut scope, ctx) = setup();
        let symbol = ty(&scope, "Symbol");
        let name = ast.value(Payload::symbol("x"), symbol);
        let typed = type_trace(&mut ast, &mut scope, name, &ctx).unwrap();
        assert_eq!(typed.ty, symbol);
    }
}
