//! Pattern matching against evaluated values

use super::Evaluator;
use crate::ast::{Constructor, Expr, ExprId, Pattern};
use crate::equality::equal_with;
use crate::error::{KiwiError, Result};
use crate::scope::Scope;

/// Result of pattern matching: bindings to add to the scope.
pub type MatchBindings = Vec<(String, ExprId)>;

impl Evaluator<'_> {
    /// Match a value against a pattern.
    ///
    /// Returns `Ok(Some(bindings))` if the pattern matches,
    /// `Ok(None)` if it doesn't match,
    /// `Err(...)` if there's an error.
    pub(super) fn match_pattern(&mut self, pattern: &Pattern, value: ExprId) -> Result<Option<MatchBindings>> {
        match pattern {
            // Expression: matches an equal value under the configured mode
            Pattern::Expression(expr) => {
                let expected = self.eval(*expr)?;
                if equal_with(self.ast, self.scope, expected, value, self.ctx.equality) {
                    Ok(Some(vec![]))
                } else {
                    Ok(None)
                }
            }

            // Wildcard binds nothing, any other name binds the value
            Pattern::Name(name) => {
                if pattern.is_wildcard() {
                    Ok(Some(vec![]))
                } else {
                    Ok(Some(vec![(name.clone(), value)]))
                }
            }

            Pattern::Constructor {
                constructor,
                fields,
            } => match self.ast.get(value).clone() {
                Expr::UnionValue { tag, payload, ty } => {
                    self.match_union(constructor, fields, &tag, payload, ty)
                }
                Expr::StructValue { members, ty } => self.match_struct(constructor, fields, &members, ty),
                other => Err(KiwiError::type_mismatch(
                    "struct or union value",
                    other.kind_name(),
                    "constructor pattern",
                )),
            },
        }
    }

    fn match_union(
        &mut self,
        constructor: &Constructor,
        fields: &[Pattern],
        tag: &str,
        payload: ExprId,
        ty: ExprId,
    ) -> Result<Option<MatchBindings>> {
        match constructor {
            Constructor::Member(member) => {
                if member != tag {
                    return Ok(None);
                }
                match fields {
                    [] => Ok(Some(vec![])),
                    [field] => self.match_pattern(field, payload),
                    _ => Err(KiwiError::argument_size(member.as_str(), 1, fields.len())),
                }
            }
            Constructor::Type(expected) => {
                if !fields.is_empty() {
                    return Err(KiwiError::InvalidConstructorArity {
                        reason: "a union type pattern cannot destructure; name the member".to_string(),
                    });
                }
                let expected = self.eval(*expected)?;
                Ok(self.same_type(expected, ty).then(Vec::new))
            }
        }
    }

    fn match_struct(
        &mut self,
        constructor: &Constructor,
        fields: &[Pattern],
        members: &[ExprId],
        ty: ExprId,
    ) -> Result<Option<MatchBindings>> {
        let expected = match constructor {
            Constructor::Type(expr) => self.eval(*expr)?,
            Constructor::Member(name) => self.scope.get_expression_by_name(name)?,
        };
        if !self.same_type(expected, ty) {
            return Ok(None);
        }
        if fields.len() != members.len() {
            return Err(KiwiError::argument_size(
                self.ast.render(ty),
                members.len(),
                fields.len(),
            ));
        }

        let mut bindings = vec![];
        for (field, member) in fields.iter().zip(members) {
            match self.match_pattern(field, *member)? {
                Some(found) => bindings.extend(found),
                None => return Ok(None),
            }
        }
        Ok(Some(bindings))
    }

    fn same_type(&self, expected: ExprId, actual: ExprId) -> bool {
        equal_with(self.ast, self.scope, expected, actual, self.ctx.equality)
    }
}

/// Apply pattern bindings to the current scope.
pub(super) fn apply_bindings(scope: &mut Scope, bindings: MatchBindings) {
    for (name, value) in bindings {
        scope.insert_binding(name, value);
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, ExprId, Pattern};
    use crate::builtin::ValueBuiltins;
    use crate::context::EvalContext;
    use crate::equality::EqualityMode;
    use crate::error::KiwiError;
    use crate::eval::Evaluator;
    use crate::scope::Scope;

    fn setup() -> (Ast, Scope, EvalContext, ValueBuiltins) {
        let mut ast = Ast::new();
        let scope = Scope::with_prelude(&mut ast);
        (ast, scope, EvalContext::new(), ValueBuiltins::standard())
    }

    fn ty(scope: &Scope, name: &str) -> ExprId {
        scope.get_expression_by_name(name).unwrap()
    }

    #[test]
    fn test_expression_pattern() {
        let (mut ast, mut scope, ctx, builtins) = setup();
        let int = ty(&scope, "Int");
        let value = ast.value(1, int);
        let same = ast.value(1, int);
        let other = ast.value(2, int);
        let mut eval = Evaluator::new(&mut ast, &mut scope, &ctx, &builtins);

        assert_eq!(eval.match_pattern(&Pattern::expr(same), value).unwrap(), Some(vec![]));
        assert_eq!(eval.match_pattern(&Pattern::expr(other), value).unwrap(), None);
    }

    #[test]
    fn test_expression_pattern_honours_equality_mode() {
        let (mut ast, mut scope, _, builtins) = setup();
        let int = ty(&scope, "Int");
        let a = ast.variable("a", Some(int));
        let declared = ast.structure(vec![a]);
        let b = ast.variable("a", Some(int));
        let lookalike = ast.structure(vec![b]);
        let one = ast.value(1, int);
        let value = ast.struct_value(vec![one], declared);
        let other_one = ast.value(1, int);
        let expected = ast.struct_value(vec![other_one], lookalike);
        let pattern = Pattern::expr(expected);

        let structural = EvalContext::new();
        let mut eval = Evaluator::new(&mut ast, &mut scope, &structural, &builtins);
        assert_eq!(eval.match_pattern(&pattern, value).unwrap(), Some(vec![]));
        drop(eval);

        let nominal = EvalContext::with_equality(EqualityMode::Nominal);
        let mut eval = Evaluator::new(&mut ast, &mut scope, &nominal, &builtins);
        assert_eq!(eval.match_pattern(&pattern, value).unwrap(), None);
    }

    #[test]
    fn test_name_patterns() {
        let (mut ast, mut scope, ctx, builtins) = setup();
        let int = ty(&scope, "Int");
        let value = ast.value(1, int);
        let mut eval = Evaluator::new(&mut ast, &mut scope, &ctx, &builtins);

        assert_eq!(
            eval.match_pattern(&Pattern::name("n"), value).unwrap(),
            Some(vec![("n".to_string(), value)])
        );
        assert_eq!(eval.match_pattern(&Pattern::wildcard(), value).unwrap(), Some(vec![]));
    }

    #[test]
    fn test_union_member_pattern() {
        let (mut ast, mut scope, ctx, builtins) = setup();
        let int = ty(&scope, "Int");
        let float = ty(&scope, "Float");
        let f = ast.variable("float", Some(float));
        let i = ast.variable("int", Some(int));
        let u = ast.union(vec![f, i]);
        let three = ast.value(3, int);
        let value = ast.union_value("int", three, u);
        let mut eval = Evaluator::new(&mut ast, &mut scope, &ctx, &builtins);

        let hit = Pattern::member("int", vec![Pattern::name("n")]);
        assert_eq!(
            eval.match_pattern(&hit, value).unwrap(),
            Some(vec![("n".to_string(), three)])
        );
        let miss = Pattern::member("float", vec![Pattern::name("n")]);
        assert_eq!(eval.match_pattern(&miss, value).unwrap(), None);
    }

    #[test]
    fn test_struct_pattern_by_type() {
        let (mut ast, mut scope, ctx, builtins) = setup();
        let int = ty(&scope, "Int");
        let a = ast.variable("a", Some(int));
        let b = ast.variable("b", Some(int));
        let s = ast.structure(vec![a, b]);
        let one = ast.value(1, int);
        let two = ast.value(2, int);
        let value = ast.struct_value(vec![one, two], s);
        let mut eval = Evaluator::new(&mut ast, &mut scope, &ctx, &builtins);

        let pattern = Pattern::of_type(s, vec![Pattern::expr(one), Pattern::name("second")]);
        assert_eq!(
            eval.match_pattern(&pattern, value).unwrap(),
            Some(vec![("second".to_string(), two)])
        );

        let short = Pattern::of_type(s, vec![Pattern::wildcard()]);
        let err = eval.match_pattern(&short, value).unwrap_err();
        assert!(matches!(err, KiwiError::ArgumentSizeMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn test_constructor_pattern_on_scalar() {
        let (mut ast, mut scope, ctx, builtins) = setup();
        let int = ty(&scope, "Int");
        let value = ast.value(1, int);
        let mut eval = Evaluator::new(&mut ast, &mut scope, &ctx, &builtins);

        let err = eval.match_pattern(&Pattern::member("int", vec![]), value).unwrap_err();
        assert!(matches!(err, KiwiError::TypeMismatch { .. }));
    }
}
