//! Structural equality of values and types
//!
//! Values and types share one node taxonomy, so a single comparator serves
//! both pattern matching and type assertions.

use crate::ast::{Ast, Expr, ExprId};
use crate::scope::Scope;
use crate::stack::ensure_sufficient_stack;

/// How struct and union types are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EqualityMode {
    /// Same member names and types, in order
    #[default]
    Structural,
    /// Same declaration node
    Nominal,
}

/// Structural equality of `a` and `b`.
///
/// References are resolved through `scope` first. Function, Block and Match
/// nodes are only equal to themselves.
pub fn equal(ast: &Ast, scope: &Scope, a: ExprId, b: ExprId) -> bool {
    equal_with(ast, scope, a, b, EqualityMode::Structural)
}

/// Equality of `a` and `b`, comparing struct/union types in `mode`.
pub fn equal_with(ast: &Ast, scope: &Scope, a: ExprId, b: ExprId, mode: EqualityMode) -> bool {
    Equality {
        ast,
        scope,
        mode,
        assumed: Vec::new(),
    }
    .eq(a, b)
}

struct Equality<'a> {
    ast: &'a Ast,
    scope: &'a Scope,
    mode: EqualityMode,
    /// Struct/union pairs under comparison, assumed equal to cut cycles
    assumed: Vec<(ExprId, ExprId)>,
}

impl Equality<'_> {
    fn eq(&mut self, a: ExprId, b: ExprId) -> bool {
        ensure_sufficient_stack(|| self.eq_resolved(a, b))
    }

    fn eq_resolved(&mut self, a: ExprId, b: ExprId) -> bool {
        let a = self.scope.try_resolve(self.ast, a);
        let b = self.scope.try_resolve(self.ast, b);
        if a == b {
            return true;
        }

        let ast = self.ast;
        match (ast.get(a), ast.get(b)) {
            // unresolvable on both sides
            (Expr::Reference { name: x, .. }, Expr::Reference { name: y, .. }) => x == y,

            (Expr::Value { payload: p, ty: t }, Expr::Value { payload: q, ty: u }) => {
                p == q && self.eq(*t, *u)
            }
            (
                Expr::StructValue { members: m, ty: t },
                Expr::StructValue { members: n, ty: u },
            ) => self.eq(*t, *u) && self.all(m, n),
            (
                Expr::UnionValue {
                    tag: s,
                    payload: p,
                    ty: t,
                },
                Expr::UnionValue {
                    tag: r,
                    payload: q,
                    ty: u,
                },
            ) => s == r && self.eq(*t, *u) && self.eq(*p, *q),

            (Expr::Variable { name: x, ty: t }, Expr::Variable { name: y, ty: u }) => {
                x == y && self.eq_opt(t.get().copied(), u.get().copied())
            }
            (Expr::Bind { name: x, expr: e }, Expr::Bind { name: y, expr: f }) => {
                x == y && self.eq(*e, *f)
            }
            (Expr::Builtin { name: x, .. }, Expr::Builtin { name: y, .. }) => x == y,

            (
                Expr::Arrow {
                    params: p,
                    return_type: r,
                },
                Expr::Arrow {
                    params: q,
                    return_type: s,
                },
            ) => {
                p.len() == q.len()
                    && p.iter().zip(q).all(|(x, y)| {
                        let (x, y) = (ast.param_type(*x), ast.param_type(*y));
                        self.eq_opt(x, y)
                    })
                    && self.eq(*r, *s)
            }

            (Expr::Struct { members: m }, Expr::Struct { members: n })
            | (Expr::Union { members: m, .. }, Expr::Union { members: n, .. }) => {
                self.eq_members(a, b, m, n)
            }

            (Expr::NamedArgument { name: x, expr: e }, Expr::NamedArgument { name: y, expr: f }) => {
                x == y && self.eq(*e, *f)
            }
            (
                Expr::Call {
                    callee: f,
                    args: x,
                    form: k,
                },
                Expr::Call {
                    callee: g,
                    args: y,
                    form: l,
                },
            ) => k == l && self.eq(*f, *g) && self.all(x, y),

            // Function, Block, Match: identity only, checked above
            _ => false,
        }
    }

    fn eq_members(&mut self, a: ExprId, b: ExprId, m: &[ExprId], n: &[ExprId]) -> bool {
        if self.mode == EqualityMode::Nominal {
            return false;
        }
        if self
            .assumed
            .iter()
            .any(|pair| *pair == (a, b) || *pair == (b, a))
        {
            return true;
        }
        self.assumed.push((a, b));
        let result = self.all(m, n);
        self.assumed.pop();
        result
    }

    fn eq_opt(&mut self, a: Option<ExprId>, b: Option<ExprId>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn all(&mut self, xs: &[ExprId], ys: &[ExprId]) -> bool {
        xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.eq(*x, *y))
    }
}
