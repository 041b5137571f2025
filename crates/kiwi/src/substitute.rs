//! Tree rewrite replacing every occurrence of a target expression
//!
//! Used to instantiate generic signatures: the meta parameter `T` inside
//! `(a: T, b: T) -> T` is replaced by the concrete type found at a call site.

use crate::ast::{write_once, Ast, Expr, ExprId};
use crate::equality::{equal_with, EqualityMode};
use crate::scope::Scope;
use crate::stack::ensure_sufficient_stack;

/// Copy of `source` with every subtree equal to `target` replaced by
/// `replacement`.
///
/// `source` is left untouched. Replaced subtrees are not visited further, so
/// the replacement's own children are never rewritten.
pub fn substitute(
    ast: &mut Ast,
    scope: &Scope,
    target: ExprId,
    replacement: ExprId,
    source: ExprId,
) -> ExprId {
    substitute_with(ast, scope, target, replacement, source, EqualityMode::Structural)
}

/// [`substitute`], deciding occurrences with equality in `mode`.
pub fn substitute_with(
    ast: &mut Ast,
    scope: &Scope,
    target: ExprId,
    replacement: ExprId,
    source: ExprId,
    mode: EqualityMode,
) -> ExprId {
    Substitution {
        scope,
        target,
        replacement,
        mode,
    }
    .rewrite(ast, source)
}

struct Substitution<'a> {
    scope: &'a Scope,
    target: ExprId,
    replacement: ExprId,
    mode: EqualityMode,
}

impl Substitution<'_> {
    fn rewrite(&self, ast: &mut Ast, id: ExprId) -> ExprId {
        ensure_sufficient_stack(|| self.rewrite_node(ast, id))
    }

    fn rewrite_node(&self, ast: &mut Ast, id: ExprId) -> ExprId {
        if equal_with(ast, self.scope, id, self.target, self.mode) {
            return self.replacement;
        }

        let rebuilt = match ast.get(id).clone() {
            Expr::Variable { name, ty } => {
                let Some(old) = ty.get().copied() else {
                    return id;
                };
                let new = self.rewrite(ast, old);
                if new == old {
                    return id;
                }
                Expr::Variable {
                    name,
                    ty: write_once(Some(new)),
                }
            }
            Expr::Arrow {
                params,
                return_type,
            } => {
                let new_params = self.rewrite_all(ast, &params);
                let new_return = self.rewrite(ast, return_type);
                if new_params == params && new_return == return_type {
                    return id;
                }
                Expr::Arrow {
                    params: new_params,
                    return_type: new_return,
                }
            }
            Expr::Call { callee, args, form } => {
                let new_callee = self.rewrite(ast, callee);
                let new_args = self.rewrite_all(ast, &args);
                if new_callee == callee && new_args == args {
                    return id;
                }
                Expr::Call {
                    callee: new_callee,
                    args: new_args,
                    form,
                }
            }
            Expr::Struct { members } => {
                let new_members = self.rewrite_all(ast, &members);
                if new_members == members {
                    return id;
                }
                Expr::Struct {
                    members: new_members,
                }
            }
            Expr::Union { members, tag_width } => {
                let new_members = self.rewrite_all(ast, &members);
                if new_members == members {
                    return id;
                }
                Expr::Union {
                    members: new_members,
                    tag_width,
                }
            }
            Expr::NamedArgument { name, expr } => {
                let new_expr = self.rewrite(ast, expr);
                if new_expr == expr {
                    return id;
                }
                Expr::NamedArgument {
                    name,
                    expr: new_expr,
                }
            }
            Expr::StructValue { members, ty } => {
                let new_members = self.rewrite_all(ast, &members);
                let new_ty = self.rewrite(ast, ty);
                if new_members == members && new_ty == ty {
                    return id;
                }
                Expr::StructValue {
                    members: new_members,
                    ty: new_ty,
                }
            }
            Expr::UnionValue { tag, payload, ty } => {
                let new_payload = self.rewrite(ast, payload);
                let new_ty = self.rewrite(ast, ty);
                if new_payload == payload && new_ty == ty {
                    return id;
                }
                Expr::UnionValue {
                    tag,
                    payload: new_payload,
                    ty: new_ty,
                }
            }
            // leaves, and bodies that type arguments never reach into
            Expr::Value { .. }
            | Expr::Reference { .. }
            | Expr::Builtin { .. }
            | Expr::Bind { .. }
            | Expr::Function { .. }
            | Expr::Block { .. }
            | Expr::Match { .. } => return id,
        };

        let new = ast.alloc(rebuilt);
        ast.attributes().copy(id, new);
        new
    }

    fn rewrite_all(&self, ast: &mut Ast, ids: &[ExprId]) -> Vec<ExprId> {
        ids.iter().map(|id| self.rewrite(ast, *id)).collect()
    }
}
