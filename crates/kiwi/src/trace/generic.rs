//! Instantiation of compile-time (generic) signatures

use tracing::{debug, instrument};

use super::TypeTrace;
use crate::ast::ExprId;
use crate::equality::{equal_with, EqualityMode};
use crate::error::{KiwiError, Result};
use crate::substitute::substitute_with;

impl TypeTrace<'_> {
    /// Type a call through a compile-time Arrow `(T: Type, ...) -> tail`.
    ///
    /// Meta parameters are bound by name while the tail is walked. Arguments
    /// whose parameter is typed by a meta parameter and whose own type is
    /// known supply the concrete type, which is substituted through the tail.
    /// The remaining arguments are then checked against the instantiated
    /// parameters. The call-site hint only stands in for a meta parameter the
    /// tail returns. Returns the instantiated return type.
    #[instrument(level = "debug", skip_all, fields(depth = self.depth))]
    pub(super) fn instantiate(&mut self, sig: ExprId, args: &[ExprId], hint: Option<ExprId>) -> Result<ExprId> {
        let (metas, tail) = self.arrow_parts(sig)?;
        self.in_scope(|this| {
            for meta in &metas {
                if let Some(name) = this.ast.get(*meta).name() {
                    let name = name.to_string();
                    this.scope.insert_binding(name, *meta);
                }
            }
            this.instantiate_tail(&metas, tail, args, hint)
        })
    }

    fn instantiate_tail(
        &mut self,
        metas: &[ExprId],
        tail: ExprId,
        args: &[ExprId],
        hint: Option<ExprId>,
    ) -> Result<ExprId> {
        let mut tail = self.scope.try_resolve(self.ast, tail);
        let (params, _) = self.arrow_parts(tail)?;
        if params.len() != args.len() {
            return Err(KiwiError::argument_size(
                self.ast.render(tail),
                params.len(),
                args.len(),
            ));
        }

        // arguments that carry their own type instantiate the meta parameters
        let mut pending = Vec::new();
        for (index, arg) in args.iter().enumerate() {
            // re-read: earlier substitutions rebuild the tail
            let expected = self.expected_at(tail, index)?;
            let concrete = match self.meta_for(expected, metas) {
                Some(meta) => self.visit(*arg, None)?.ty.map(|ty| (meta, ty)),
                None => None,
            };
            match concrete {
                Some((meta, concrete)) => tail = self.bind_meta(meta, concrete, tail),
                None => pending.push(index),
            }
        }

        for index in pending {
            let arg = args[index];
            let expected = self.expected_at(tail, index)?;
            let Some(meta) = self.meta_for(expected, metas) else {
                self.check(arg, expected, "argument")?;
                continue;
            };
            // only a tail that returns the meta parameter can take it from the call site
            let (_, return_type) = self.arrow_parts(tail)?;
            let hint = hint
                .filter(|_| self.meta_for(return_type, metas) == Some(meta))
                .ok_or_else(|| {
                    KiwiError::unknown_type(format!("{} in a generic call", self.ast.render(arg)))
                })?;
            self.check(arg, hint, "argument")?;
            tail = self.bind_meta(meta, hint, tail);
        }

        let (_, return_type) = self.arrow_parts(tail)?;
        Ok(self.scope.try_resolve(self.ast, return_type))
    }

    /// Declared type of the parameter at `index` of `tail`.
    fn expected_at(&self, tail: ExprId, index: usize) -> Result<ExprId> {
        let (params, _) = self.arrow_parts(tail)?;
        params
            .get(index)
            .and_then(|param| self.ast.param_type(*param))
            .ok_or_else(|| KiwiError::unknown_type(format!("parameter {} of {}", index, self.ast.render(tail))))
    }

    /// Substitute `concrete` for `meta` through `tail`.
    fn bind_meta(&mut self, meta: ExprId, concrete: ExprId, tail: ExprId) -> ExprId {
        debug!(
            meta = %self.ast.render(meta),
            concrete = %self.ast.render(concrete),
            "instantiate"
        );
        substitute_with(self.ast, self.scope, meta, concrete, tail, self.ctx.equality)
    }

    /// The meta parameter a parameter type refers to, if any.
    fn meta_for(&self, ty: ExprId, metas: &[ExprId]) -> Option<ExprId> {
        metas
            .iter()
            .copied()
            .find(|meta| equal_with(self.ast, self.scope, ty, *meta, EqualityMode::Structural))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, Expr, ExprId};
    use crate::context::EvalContext;
    use crate::error::KiwiError;
    use crate::scope::Scope;
    use crate::trace::type_trace;

    fn setup() -> (Ast, Scope, EvalContext) {
        let mut ast = Ast::new();
        let scope = Scope::with_prelude(&mut ast);
        (ast, scope, EvalContext::new())
    }

    fn ty(scope: &Scope, name: &str) -> ExprId {
        scope.get_expression_by_name(name).unwrap()
    }

    #[test]
    fn test_return_instantiates_to_argument_type() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let ret = ast.reference(&scope, "return");
        let one = ast.value(1, int);
        let call = ast.call(ret, vec![one]);

        let typed = type_trace(&mut ast, &mut scope, call, &ctx).unwrap();
        assert_eq!(typed.ty, int);
    }

    #[test]
    fn test_second_argument_checked_against_instantiation() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let float = ty(&scope, "Float");
        let plus = ast.reference(&scope, "+");
        let one = ast.value(1, int);
        let half = ast.value(0.5, float);
        let call = ast.binary(plus, one, half);

        let err = type_trace(&mut ast, &mut scope, call, &ctx).unwrap_err();
        match err.root() {
            KiwiError::TypeMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "Int");
                assert_eq!(found, "Float");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_returns_bool() {
        let (mut ast, mut scope, ctx) = setup();
        let float = ty(&scope, "Float");
        let less = ast.reference(&scope, "<");
        let a = ast.value(1.0, float);
        let b = ast.value(2.0, float);
        let call = ast.binary(less, a, b);

        let typed = type_trace(&mut ast, &mut scope, call, &ctx).unwrap();
        assert_eq!(typed.ty, ty(&scope, "Bool"));
    }

    #[test]
    fn test_nested_generic_calls() {
        let (mut ast, mut scope, ctx) = setup();
        let float = ty(&scope, "Float");
        let yield_ref = ast.reference(&scope, "yield");
        let times = ast.reference(&scope, "*");
        let a = ast.value(1.5, float);
        let b = ast.value(2.0, float);
        let product = ast.binary(times, a, b);
        let call = ast.call(yield_ref, vec![product]);

        let typed = type_trace(&mut ast, &mut scope, call, &ctx).unwrap();
        assert_eq!(typed.ty, float);
        // the meta parameter binding does not leak
        assert!(!scope.contains("T"));
    }

    #[test]
    fn test_generic_signature_is_not_mutated() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let plus = scope.get_expression_by_name("+").unwrap();
        let sig = match ast.get(plus) {
            Expr::Builtin { ty, .. } => ty.unwrap(),
            other => panic!("expected builtin, got {:?}", other),
        };
        let before = ast.render(sig);

        let plus_ref = ast.reference(&scope, "+");
        let one = ast.value(1, int);
        let two = ast.value(2, int);
        let call = ast.binary(plus_ref, one, two);
        type_trace(&mut ast, &mut scope, call, &ctx).unwrap();

        assert_eq!(ast.render(sig), before);
    }

    #[test]
    fn test_parameter_filled_before_generic_body() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let x = ast.variable("x", None);
        let ret = ast.reference(&scope, "return");
        let x_ref = ast.reference(&scope, "x");
        let body = ast.call(ret, vec![x_ref]);
        let f = ast.function(vec![x], Some(int), body);
        let one = ast.value(1, int);
        let call = ast.call(f, vec![one]);

        let typed = type_trace(&mut ast, &mut scope, call, &ctx).unwrap();
        assert_eq!(typed.ty, int);
        assert_eq!(ast.type_of(x), Some(int));
    }

    #[test]
    fn test_unknown_argument_falls_back_to_hint() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let y = ast.variable("y", Some(int));
        let y_ref = ast.reference(&scope, "y");
        let id = ast.lambda(vec![y], y_ref);
        let x = ast.variable("x", None);
        let yield_ref = ast.reference(&scope, "yield");
        let arg = ast.call(yield_ref, vec![x]);
        let call = ast.call(id, vec![arg]);

        // `yield(x)` is checked under the parameter type Int, which types x
        let typed = type_trace(&mut ast, &mut scope, call, &ctx).unwrap();
        assert_eq!(typed.ty, int);
        assert_eq!(ast.type_of(x), Some(int));
    }

    #[test]
    fn test_comparison_types_operand_from_sibling() {
        let (mut ast, mut scope, ctx) = setup();
        let float = ty(&scope, "Float");
        let boolean = ty(&scope, "Bool");
        let b = ast.variable("b", Some(boolean));
        let b_ref = ast.reference(&scope, "b");
        let g = ast.lambda(vec![b], b_ref);
        let x = ast.variable("x", None);
        let eq = ast.reference(&scope, "==");
        let one = ast.value(1.0, float);
        let cmp = ast.binary(eq, x, one);
        let call = ast.call(g, vec![cmp]);

        // the Bool hint belongs to the result, not to the operands
        let typed = type_trace(&mut ast, &mut scope, call, &ctx).unwrap();
        assert_eq!(typed.ty, boolean);
        assert_eq!(ast.type_of(x), Some(float));
    }

    #[test]
    fn test_untyped_operands_are_not_typed_by_result_hint() {
        let (mut ast, mut scope, ctx) = setup();
        let boolean = ty(&scope, "Bool");
        let b = ast.variable("b", Some(boolean));
        let b_ref = ast.reference(&scope, "b");
        let g = ast.lambda(vec![b], b_ref);
        let x = ast.variable("x", None);
        let y = ast.variable("y", None);
        let less = ast.reference(&scope, "<");
        let cmp = ast.binary(less, x, y);
        let call = ast.call(g, vec![cmp]);

        let err = type_trace(&mut ast, &mut scope, call, &ctx).unwrap_err();
        assert!(matches!(err.root(), KiwiError::UnknownType { .. }));
        assert_eq!(ast.type_of(x), None);
    }

    #[test]
    fn test_unknown_argument_without_hint_fails() {
        let (mut ast, mut scope, ctx) = setup();
        let ret = ast.reference(&scope, "return");
        let x = ast.variable("x", None);
        let call = ast.call(ret, vec![x]);

        let err = type_trace(&mut ast, &mut scope, call, &ctx).unwrap_err();
        assert!(matches!(err.root(), KiwiError::UnknownType { .. }));
    }
}
