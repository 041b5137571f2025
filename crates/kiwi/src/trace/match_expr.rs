//! Typing of match expressions and patterns

use super::{Traced, TypeTrace};
use crate::ast::{Constructor, Expr, ExprId, MatchArm, Pattern};
use crate::error::{KiwiError, Result};

impl TypeTrace<'_> {
    /// Every arm, and the default, must produce the same type.
    pub(super) fn trace_match(
        &mut self,
        id: ExprId,
        target: ExprId,
        arms: &[MatchArm],
        default: Option<ExprId>,
    ) -> Result<Traced> {
        let mut target_ty = self.visit(target, None)?.ty;
        if target_ty.is_none() {
            target_ty = self.backfill_target(target, arms)?;
        }

        let mut result = None;
        for arm in arms {
            let branch = self.in_scope(|this| {
                this.bind_pattern(&arm.pattern, target_ty)?;
                this.visit(arm.branch, result)
            })?;
            result = self.unify(result, branch.ty, "match branch")?;
        }
        if let Some(default) = default {
            let branch = self.visit(default, result)?;
            result = self.unify(result, branch.ty, "match default")?;
        }

        Ok(Traced {
            expr: id,
            ty: result,
        })
    }

    /// Type an untyped target from the first expression pattern that has a type.
    fn backfill_target(&mut self, target: ExprId, arms: &[MatchArm]) -> Result<Option<ExprId>> {
        for arm in arms {
            if let Pattern::Expression(expr) = &arm.pattern {
                if let Some(ty) = self.visit(*expr, None)?.ty {
                    self.check(target, ty, "match target")?;
                    return Ok(Some(ty));
                }
            }
        }
        Ok(None)
    }

    /// Check a pattern against the target type and bind its names.
    fn bind_pattern(&mut self, pattern: &Pattern, ty: Option<ExprId>) -> Result<()> {
        match pattern {
            Pattern::Expression(expr) => {
                match ty {
                    Some(ty) => self.check(*expr, ty, "pattern")?,
                    None => self.visit(*expr, None)?,
                };
                Ok(())
            }
            Pattern::Name(name) => {
                if !pattern.is_wildcard() {
                    let var = self.ast.variable(name.clone(), ty);
                    self.scope.insert_binding(name.clone(), var);
                }
                Ok(())
            }
            Pattern::Constructor {
                constructor,
                fields,
            } => {
                let ty = ty.ok_or_else(|| KiwiError::unknown_type("destructured match target"))?;
                let ty = self.scope.try_resolve(self.ast, ty);
                match self.ast.get(ty).clone() {
                    Expr::Union { members, .. } => self.bind_union_pattern(ty, &members, constructor, fields),
                    Expr::Struct { members } => self.bind_struct_pattern(ty, &members, constructor, fields),
                    _ => Err(KiwiError::type_mismatch(
                        "struct or union",
                        self.ast.render(ty),
                        "constructor pattern",
                    )),
                }
            }
        }
    }

    fn bind_union_pattern(
        &mut self,
        union: ExprId,
        members: &[ExprId],
        constructor: &Constructor,
        fields: &[Pattern],
    ) -> Result<()> {
        let tag = match constructor {
            Constructor::Member(tag) => tag,
            Constructor::Type(expr) => {
                self.expect(union, *expr, "constructor pattern")?;
                if !fields.is_empty() {
                    return Err(KiwiError::InvalidConstructorArity {
                        reason: "a union type pattern cannot destructure; name the member".to_string(),
                    });
                }
                return Ok(());
            }
        };

        let member = self
            .ast
            .member_index(union, tag)
            .and_then(|index| members.get(index).copied())
            .ok_or_else(|| KiwiError::InvalidConstructorArity {
                reason: format!("{} has no member `{}`", self.ast.render(union), tag),
            })?;
        match fields {
            [] => Ok(()),
            [field] => {
                let member_ty = self.ast.param_type(member);
                self.bind_pattern(field, member_ty)
            }
            _ => Err(KiwiError::argument_size(tag.as_str(), 1, fields.len())),
        }
    }

    fn bind_struct_pattern(
        &mut self,
        structure: ExprId,
        members: &[ExprId],
        constructor: &Constructor,
        fields: &[Pattern],
    ) -> Result<()> {
        let named = match constructor {
            Constructor::Type(expr) => *expr,
            Constructor::Member(name) => self.scope.get_expression_by_name(name)?,
        };
        self.expect(structure, named, "constructor pattern")?;

        if fields.len() != members.len() {
            return Err(KiwiError::argument_size(
                self.ast.render(structure),
                members.len(),
                fields.len(),
            ));
        }
        for (field, member) in fields.iter().zip(members) {
            let member_ty = self.ast.param_type(*member);
            self.bind_pattern(field, member_ty)?;
        }
        Ok(())
    }
}
