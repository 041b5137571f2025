//! Typing of calls and constructor applications

use tracing::instrument;

use super::{Traced, TypeTrace};
use crate::ast::{Expr, ExprId, Payload};
use crate::builtin::TypeRule;
use crate::error::{KiwiError, Result};

/// References and binds followed before giving up on a callee.
const MAX_CALLEE_HOPS: usize = 64;

impl TypeTrace<'_> {
    pub(super) fn trace_call(
        &mut self,
        id: ExprId,
        callee: ExprId,
        args: &[ExprId],
        hint: Option<ExprId>,
    ) -> Result<Traced> {
        let target = self.resolve_callee(callee)?;
        match self.ast.get(target).clone() {
            Expr::Builtin { name, ty } => self.trace_builtin_call(id, target, &name, ty, args, hint),
            Expr::Function { args: params, .. } => self.trace_function_call(id, target, &params, args),
            Expr::Struct { members } => self.trace_struct_call(id, target, &members, args),
            Expr::Union { members, .. } => self.trace_union_call(id, target, &members, args),
            other => Err(KiwiError::UnhandledCallTarget {
                kind: other.kind_name(),
                callee: self.ast.render(target),
            }),
        }
    }

    /// Follow references and binds to the node actually being called.
    fn resolve_callee(&self, callee: ExprId) -> Result<ExprId> {
        let mut current = callee;
        for _ in 0..MAX_CALLEE_HOPS {
            current = match self.ast.get(current) {
                Expr::Reference { .. } => self.scope.resolve(self.ast, current)?,
                Expr::Bind { expr, .. } => *expr,
                _ => return Ok(current),
            };
        }
        Err(KiwiError::ReferenceNotFound {
            name: self.ast.render(callee),
        })
    }

    fn trace_builtin_call(
        &mut self,
        id: ExprId,
        builtin: ExprId,
        name: &str,
        declared: Option<ExprId>,
        args: &[ExprId],
        hint: Option<ExprId>,
    ) -> Result<Traced> {
        let entry = *self
            .builtins
            .get(name)
            .ok_or_else(|| KiwiError::UndefinedBuiltin {
                name: name.to_string(),
            })?;
        if let Some(arity) = entry.arity {
            if arity != args.len() {
                return Err(KiwiError::argument_size(name, arity, args.len()));
            }
        }

        let ty = match entry.rule {
            TypeRule::Signature => {
                let sig = declared
                    .map(|sig| self.scope.try_resolve(self.ast, sig))
                    .ok_or_else(|| KiwiError::unknown_type(format!("signature of builtin {}", name)))?;
                if self.ast.is_compile_time(self.scope, sig) {
                    self.instantiate(sig, args, hint)?
                } else {
                    self.apply_signature(name, sig, args)?
                }
            }
            TypeRule::Constructor => {
                for arg in args {
                    self.visit(*arg, None)?;
                }
                builtin
            }
            TypeRule::Universal => {
                for arg in args {
                    self.visit(*arg, None)?;
                }
                self.universe()?
            }
        };

        if entry.terminates {
            self.record_return(ty)?;
        }
        Ok(self.typed(id, ty))
    }

    /// Check arguments against a monomorphic Arrow, yielding its return type.
    fn apply_signature(&mut self, name: &str, sig: ExprId, args: &[ExprId]) -> Result<ExprId> {
        let (params, return_type) = self.arrow_parts(sig)?;
        if params.len() != args.len() {
            return Err(KiwiError::argument_size(name, params.len(), args.len()));
        }
        for (param, arg) in params.iter().zip(args) {
            let expected = self.ast.param_type(*param).ok_or_else(|| {
                KiwiError::unknown_type(format!("parameter {} of {}", self.ast.render(*param), name))
            })?;
            self.check(*arg, expected, "argument")?;
        }
        Ok(return_type)
    }

    /// Type a call to a user function.
    ///
    /// Arguments fill parameters declared without a type before the body is
    /// traced, so `add(x, y)` is typed by its first call site.
    #[instrument(level = "debug", skip_all, fields(depth = self.depth))]
    fn trace_function_call(
        &mut self,
        id: ExprId,
        function: ExprId,
        params: &[ExprId],
        args: &[ExprId],
    ) -> Result<Traced> {
        if params.len() != args.len() {
            return Err(KiwiError::argument_size(
                self.ast.render(function),
                params.len(),
                args.len(),
            ));
        }
        for (param, arg) in params.iter().zip(args) {
            match self.ast.param_type(*param) {
                Some(expected) => {
                    self.check(*arg, expected, "argument")?;
                }
                None => {
                    let found = self.visit(*arg, None)?.ty.ok_or_else(|| {
                        KiwiError::unknown_type(format!("argument {}", self.ast.render(*arg)))
                    })?;
                    self.ast.fill_type(*param, found);
                }
            }
        }

        let (fn_args, body) = match self.ast.get(function) {
            Expr::Function { args, body, .. } => (args.clone(), *body),
            other => {
                return Err(KiwiError::UnhandledCallTarget {
                    kind: other.kind_name(),
                    callee: self.ast.render(function),
                })
            }
        };
        self.scope.enter_call_within(self.ctx.max_call_depth)?;
        let result = self.trace_function(function, &fn_args, body);
        self.scope.exit_call();
        result?;

        let ret = self.ast.type_of(function).ok_or_else(|| {
            KiwiError::unknown_type(format!("return type of {}", self.ast.render(function)))
        })?;
        Ok(self.typed(id, ret))
    }

    fn trace_struct_call(
        &mut self,
        id: ExprId,
        structure: ExprId,
        members: &[ExprId],
        args: &[ExprId],
    ) -> Result<Traced> {
        if members.len() != args.len() {
            return Err(KiwiError::argument_size(
                self.ast.render(structure),
                members.len(),
                args.len(),
            ));
        }
        for (member, arg) in members.iter().zip(args) {
            let expected = self.member_type(*member)?;
            self.check(*arg, expected, "struct member")?;
        }
        Ok(Traced {
            expr: id,
            ty: Some(structure),
        })
    }

    fn trace_union_call(
        &mut self,
        id: ExprId,
        union: ExprId,
        members: &[ExprId],
        args: &[ExprId],
    ) -> Result<Traced> {
        let (tag, payload) = self.union_argument(union, args)?;
        let index = self.ast.member_index(union, &tag).ok_or_else(|| {
            KiwiError::InvalidConstructorArity {
                reason: format!("{} has no member `{}`", self.ast.render(union), tag),
            }
        })?;
        let member = members.get(index).copied().ok_or_else(|| {
            KiwiError::InvalidConstructorArity {
                reason: format!("{} has no member `{}`", self.ast.render(union), tag),
            }
        })?;
        let expected = self.member_type(member)?;
        self.check(payload, expected, "union member")?;
        Ok(Traced {
            expr: id,
            ty: Some(union),
        })
    }

    /// The single `name = expr` argument of a union instantiation.
    fn union_argument(&self, union: ExprId, args: &[ExprId]) -> Result<(String, ExprId)> {
        let [arg] = args else {
            return Err(KiwiError::InvalidConstructorArity {
                reason: format!(
                    "{} takes exactly one named argument, got {}",
                    self.ast.render(union),
                    args.len()
                ),
            });
        };
        match self.ast.get(*arg) {
            Expr::NamedArgument { name, expr } => Ok((name.clone(), *expr)),
            other => Err(KiwiError::InvalidConstructorArity {
                reason: format!(
                    "{} takes a named argument, got {}",
                    self.ast.render(union),
                    other.kind_name()
                ),
            }),
        }
    }

    fn member_type(&self, member: ExprId) -> Result<ExprId> {
        self.ast.param_type(member).ok_or_else(|| {
            KiwiError::unknown_type(format!("member {}", self.ast.render(member)))
        })
    }

    /// The Struct or Union node a `struct`/`union` builtin call builds.
    ///
    /// Members must be `variable('name, T)` calls or variables; anything
    /// only known at run time yields `None`.
    pub(super) fn reflect_aggregate(&mut self, call: ExprId) -> Option<ExprId> {
        let Expr::Call { callee, args, .. } = self.ast.get(call).clone() else {
            return None;
        };
        let is_union = match self.builtin_name(callee)?.as_str() {
            "struct" => false,
            "union" => true,
            _ => return None,
        };
        let members = args
            .iter()
            .map(|arg| self.reflect_member(*arg))
            .collect::<Option<Vec<_>>>()?;
        match (is_union, members.is_empty()) {
            (false, _) => Some(self.ast.structure(members)),
            (true, false) => Some(self.ast.union(members)),
            (true, true) => None,
        }
    }

    fn reflect_member(&mut self, arg: ExprId) -> Option<ExprId> {
        let arg = self.scope.try_resolve(self.ast, arg);
        let (callee, args) = match self.ast.get(arg) {
            Expr::Variable { .. } => return Some(arg),
            Expr::Call { callee, args, .. } => (*callee, args.clone()),
            _ => return None,
        };
        if self.builtin_name(callee)? != "variable" {
            return None;
        }
        let [name, ty] = args.as_slice() else {
            return None;
        };
        let name = match self.ast.get(self.scope.try_resolve(self.ast, *name)) {
            Expr::Value {
                payload: Payload::Symbol(name),
                ..
            } => name.clone(),
            _ => return None,
        };
        let ty = self.scope.try_resolve(self.ast, *ty);
        Some(self.ast.variable(name, Some(ty)))
    }

    fn builtin_name(&self, callee: ExprId) -> Option<String> {
        let target = self.resolve_callee(callee).ok()?;
        match self.ast.get(target) {
            Expr::Builtin { name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    pub(super) fn arrow_parts(&self, id: ExprId) -> Result<(Vec<ExprId>, ExprId)> {
        match self.ast.get(id) {
            Expr::Arrow {
                params,
                return_type,
            } => Ok((params.clone(), *return_type)),
            other => Err(KiwiError::UnhandledCallTarget {
                kind: other.kind_name(),
                callee: self.ast.render(id),
            }),
        }
    }
}
