//! Match expression evaluation

use super::pattern::apply_bindings;
use super::Evaluator;
use crate::ast::{ExprId, MatchArm};
use crate::error::{KiwiError, Result};

impl Evaluator<'_> {
    /// Evaluate the first arm whose pattern matches the target, else the default.
    pub(super) fn eval_match(
        &mut self,
        target: ExprId,
        arms: &[MatchArm],
        default: Option<ExprId>,
    ) -> Result<ExprId> {
        // Evaluate the scrutinee
        let value = self.eval(target)?;

        for arm in arms {
            if let Some(bindings) = self.match_pattern(&arm.pattern, value)? {
                return self.in_scope(|this| {
                    apply_bindings(this.scope, bindings);
                    this.eval(arm.branch)
                });
            }
        }

        match default {
            Some(default) => self.eval(default),
            None => Err(KiwiError::NoMatchingBranch {
                target: self.ast.render(value),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, Expr, ExprId, MatchArm, Pattern, Payload};
    use crate::context::EvalContext;
    use crate::error::KiwiError;
    use crate::eval::evaluate;
    use crate::scope::Scope;

    fn setup() -> (Ast, Scope, EvalContext) {
        let mut ast = Ast::new();
        let scope = Scope::with_prelude(&mut ast);
        (ast, scope, EvalContext::new())
    }

    fn ty(scope: &Scope, name: &str) -> ExprId {
        scope.get_expression_by_name(name).unwrap()
    }

    #[test]
    fn test_first_matching_arm_wins() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let target = ast.value(1, int);
        let one = ast.value(1, int);
        let first = ast.value(10, int);
        let second = ast.value(20, int);
        let m = ast.match_expr(
            target,
            vec![
                MatchArm::new(Pattern::expr(one), first),
                MatchArm::new(Pattern::wildcard(), second),
            ],
            None,
        );

        assert_eq!(evaluate(&mut ast, &mut scope, m, &ctx).unwrap(), first);
    }

    #[test]
    fn test_default_and_no_match() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let target = ast.value(2, int);
        let one = ast.value(1, int);
        let branch = ast.value(10, int);
        let fallback = ast.value(0, int);
        let with_default = ast.match_expr(target, vec![MatchArm::new(Pattern::expr(one), branch)], Some(fallback));
        let without = ast.match_expr(target, vec![MatchArm::new(Pattern::expr(one), branch)], None);

        assert_eq!(evaluate(&mut ast, &mut scope, with_default, &ctx).unwrap(), fallback);
        let err = evaluate(&mut ast, &mut scope, without, &ctx).unwrap_err();
        assert!(matches!(err.root(), KiwiError::NoMatchingBranch { target } if target == "2"));
    }

    #[test]
    fn test_bindings_scoped_to_branch() {
        let (mut ast, mut scope, ctx) = setup();
        let int = ty(&scope, "Int");
        let i = ast.variable("int", Some(int));
        let u = ast.union(vec![i]);
        let three = ast.value(3, int);
        let arg = ast.named("int", three);
        let target = ast.call(u, vec![arg]);
        let plus = ast.reference(&scope, "+");
        let n_ref = ast.reference(&scope, "n");
        let one = ast.value(1, int);
        let branch = ast.binary(plus, n_ref, one);
        let m = ast.match_expr(
            target,
            vec![MatchArm::new(Pattern::member("int", vec![Pattern::name("n")]), branch)],
            None,
        );

        let result = evaluate(&mut ast, &mut scope, m, &ctx).unwrap();
        assert!(matches!(
            ast.get(result),
            Expr::Value {
                payload: Payload::Int(4),
                ..
            }
        ));
        assert!(!scope.contains("n"));
    }
}
