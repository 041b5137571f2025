//! Compact source-like rendering for diagnostics

use std::fmt::{self, Write};

use super::{Ast, CallForm, Constructor, Expr, ExprId, Pattern};

/// Nesting beyond this renders as `…`; type slots may form cycles.
const MAX_RENDER_DEPTH: usize = 24;

impl Ast {
    /// Render a node as source-like text.
    ///
    /// References print by name and are never resolved, so rendering has no
    /// side effects and works on trees that do not type-check.
    pub fn render(&self, id: ExprId) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = Renderer { ast: self, out: &mut out }.expr(id, 0);
        out
    }
}

struct Renderer<'a, W> {
    ast: &'a Ast,
    out: &'a mut W,
}

impl<W: Write> Renderer<'_, W> {
    fn expr(&mut self, id: ExprId, depth: usize) -> fmt::Result {
        if depth > MAX_RENDER_DEPTH {
            return self.out.write_str("…");
        }
        let depth = depth + 1;
        match self.ast.get(id) {
            Expr::Value { payload, .. } => write!(self.out, "{}", payload),
            Expr::StructValue { members, .. } => {
                self.out.write_char('{')?;
                self.list(members, depth)?;
                self.out.write_char('}')
            }
            Expr::UnionValue { tag, payload, .. } => {
                write!(self.out, "{{{} = ", tag)?;
                self.expr(*payload, depth)?;
                self.out.write_char('}')
            }
            Expr::Variable { name, ty } => {
                self.out.write_str(name)?;
                if let Some(ty) = ty.get() {
                    self.out.write_str(": ")?;
                    self.expr(*ty, depth)?;
                }
                Ok(())
            }
            Expr::Bind { name, expr } => {
                write!(self.out, "{} := ", name)?;
                self.expr(*expr, depth)
            }
            Expr::Reference { name, .. } | Expr::Builtin { name, .. } => self.out.write_str(name),
            Expr::Function {
                args,
                return_type,
                body,
                is_lambda,
                ..
            } => {
                self.out.write_str(if *is_lambda { "|" } else { "fn(" })?;
                self.list(args, depth)?;
                self.out.write_str(if *is_lambda { "|" } else { ")" })?;
                if let Some(ty) = return_type.get() {
                    self.out.write_str(" -> ")?;
                    self.expr(*ty, depth)?;
                }
                self.out.write_char(' ')?;
                self.expr(*body, depth)
            }
            Expr::Block { exprs } => {
                if exprs.is_empty() {
                    return self.out.write_str("{}");
                }
                self.out.write_str("{ ")?;
                for (i, expr) in exprs.iter().enumerate() {
                    if i > 0 {
                        self.out.write_str("; ")?;
                    }
                    self.expr(*expr, depth)?;
                }
                self.out.write_str(" }")
            }
            Expr::Match {
                target,
                arms,
                default,
            } => {
                self.out.write_str("match ")?;
                self.expr(*target, depth)?;
                self.out.write_str(" { ")?;
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        self.out.write_str(", ")?;
                    }
                    self.pattern(&arm.pattern, depth)?;
                    self.out.write_str(" => ")?;
                    self.expr(arm.branch, depth)?;
                }
                if let Some(default) = default {
                    if !arms.is_empty() {
                        self.out.write_str(", ")?;
                    }
                    self.out.write_str("_ => ")?;
                    self.expr(*default, depth)?;
                }
                self.out.write_str(" }")
            }
            Expr::Arrow {
                params,
                return_type,
            } => {
                self.out.write_char('(')?;
                self.list(params, depth)?;
                self.out.write_str(") -> ")?;
                self.expr(*return_type, depth)
            }
            Expr::Struct { members } => {
                self.out.write_str("struct(")?;
                self.list(members, depth)?;
                self.out.write_char(')')
            }
            Expr::Union { members, .. } => {
                self.out.write_str("union(")?;
                self.list(members, depth)?;
                self.out.write_char(')')
            }
            Expr::NamedArgument { name, expr } => {
                write!(self.out, "{} = ", name)?;
                self.expr(*expr, depth)
            }
            Expr::Call { callee, args, form } => match (form, args.as_slice()) {
                (CallForm::Binary, [lhs, rhs]) => {
                    self.out.write_char('(')?;
                    self.expr(*lhs, depth)?;
                    self.out.write_char(' ')?;
                    self.expr(*callee, depth)?;
                    self.out.write_char(' ')?;
                    self.expr(*rhs, depth)?;
                    self.out.write_char(')')
                }
                (CallForm::Unary, [operand]) => {
                    self.expr(*callee, depth)?;
                    self.expr(*operand, depth)
                }
                _ => {
                    self.expr(*callee, depth)?;
                    self.out.write_char('(')?;
                    self.list(args, depth)?;
                    self.out.write_char(')')
                }
            },
        }
    }

    fn list(&mut self, ids: &[ExprId], depth: usize) -> fmt::Result {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            self.expr(*id, depth)?;
        }
        Ok(())
    }

    fn pattern(&mut self, pattern: &Pattern, depth: usize) -> fmt::Result {
        match pattern {
            Pattern::Expression(id) => self.expr(*id, depth),
            Pattern::Name(name) => self.out.write_str(name),
            Pattern::Constructor {
                constructor,
                fields,
            } => {
                match constructor {
                    Constructor::Member(name) => self.out.write_str(name)?,
                    Constructor::Type(ty) => self.expr(*ty, depth)?,
                }
                self.out.write_char('(')?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        self.out.write_str(", ")?;
                    }
                    self.pattern(field, depth)?;
                }
                self.out.write_char(')')
            }
        }
    }
}
