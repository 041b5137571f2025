//! Call evaluation

use tracing::{debug, instrument};

use super::{ControlFlow, Evaluator};
use crate::ast::{Expr, ExprId};
use crate::builtin::BuiltinArgs;
use crate::error::{KiwiError, Result};

impl Evaluator<'_> {
    /// Evaluate a call by dispatching on the evaluated callee.
    #[instrument(level = "debug", skip_all, fields(depth = self.depth))]
    pub(super) fn eval_call(&mut self, callee: ExprId, args: &[ExprId]) -> Result<ExprId> {
        let target = self.eval(callee)?;
        match self.ast.get(target).clone() {
            Expr::Builtin { name, .. } => self.call_builtin(&name, args),
            Expr::Function { args: params, body, .. } => self.call_function(target, &params, body, args),
            Expr::Struct { members } => self.construct_struct(target, members.len(), args),
            Expr::Union { .. } => self.construct_union(target, args),
            other => Err(KiwiError::UnhandledCallTarget {
                kind: other.kind_name(),
                callee: self.ast.render(target),
            }),
        }
    }

    fn call_builtin(&mut self, name: &str, args: &[ExprId]) -> Result<ExprId> {
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

        let values = self.eval_args(args)?;
        let result = (entry.call)(&mut BuiltinArgs {
            ast: &mut *self.ast,
            scope: &*self.scope,
            args: &values,
            equality: self.ctx.equality,
        })
        .map_err(|message| KiwiError::BuiltinError {
            name: name.to_string(),
            message,
        })?;
        debug!(builtin = name, result = %self.ast.render(result), "builtin");

        if entry.terminates {
            return Err(KiwiError::ControlFlow(ControlFlow::return_value(result)));
        }
        Ok(result)
    }

    /// Arguments are evaluated in the caller's scope, then bound by parameter
    /// name in a fresh one. A `return` inside the body ends the call.
    fn call_function(
        &mut self,
        function: ExprId,
        params: &[ExprId],
        body: ExprId,
        args: &[ExprId],
    ) -> Result<ExprId> {
        if params.len() != args.len() {
            return Err(KiwiError::argument_size(
                self.ast.render(function),
                params.len(),
                args.len(),
            ));
        }
        let values = self.eval_args(args)?;
        let mut bindings = Vec::with_capacity(params.len());
        for (param, value) in params.iter().zip(values) {
            let name = self.ast.get(*param).name().ok_or_else(|| {
                KiwiError::type_mismatch("variable", self.ast.get(*param).kind_name(), "parameter")
            })?;
            bindings.push((name.to_string(), value));
        }

        self.scope.enter_call_within(self.ctx.max_call_depth)?;
        let result = self.in_scope(|this| {
            for (name, value) in bindings {
                this.scope.insert_binding(name, value);
            }
            this.eval(body)
        });
        self.scope.exit_call();

        match result {
            Err(KiwiError::ControlFlow(ControlFlow::Return { value })) => Ok(value),
            other => other,
        }
    }

    fn construct_struct(&mut self, structure: ExprId, members: usize, args: &[ExprId]) -> Result<ExprId> {
        if members != args.len() {
            return Err(KiwiError::argument_size(
                self.ast.render(structure),
                members,
                args.len(),
            ));
        }
        let values = self.eval_args(args)?;
        Ok(self.ast.struct_value(values, structure))
    }

    fn construct_union(&mut self, union: ExprId, args: &[ExprId]) -> Result<ExprId> {
        let [arg] = args else {
            return Err(KiwiError::InvalidConstructorArity {
                reason: format!(
                    "{} takes exactly one named argument, got {}",
                    self.ast.render(union),
                    args.len()
                ),
            });
        };
        let (tag, expr) = match self.ast.get(*arg) {
            Expr::NamedArgument { name, expr } => (name.clone(), *expr),
            other => {
                return Err(KiwiError::InvalidConstructorArity {
                    reason: format!(
                        "{} takes a named argument, got {}",
                        self.ast.render(union),
                        other.kind_name()
                    ),
                })
            }
        };
        if self.ast.member_index(union, &tag).is_none() {
            return Err(KiwiError::InvalidConstructorArity {
                reason: format!("{} has no member `{}`", self.ast.render(union), tag),
            });
        }

        let payload = self.eval(expr)?;
        Ok(self.ast.union_value(tag, payload, union))
    }

    fn eval_args(&mut self, args: &[ExprId]) -> Result<Vec<ExprId>> {
        args.iter().map(|arg| self.eval(*arg)).collect()
    }
}
