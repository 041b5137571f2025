//! Name-keyed builtin tables
//!
//! Evaluation and inference consult separate tables sharing one name set:
//! [`ValueBuiltins`] computes results, [`TypeBuiltins`] says how a call is
//! typed. A builtin must be registered in both.

use std::fmt;

use indexmap::IndexMap;

use crate::ast::{Ast, Expr, ExprId, Payload};
use crate::equality::{equal_with, EqualityMode};
use crate::scope::Scope;

/// Expected argument count; `None` is variadic.
pub type Arity = Option<usize>;

/// Arguments handed to a value builtin, already evaluated.
pub struct BuiltinArgs<'a> {
    /// Arena to read arguments from and allocate results in
    pub ast: &'a mut Ast,
    /// Scope of the call site
    pub scope: &'a Scope,
    /// Evaluated arguments
    pub args: &'a [ExprId],
    /// Type equality used by `==`
    pub equality: EqualityMode,
}

impl BuiltinArgs<'_> {
    fn payload(&self, index: usize) -> Result<(&Payload, ExprId), String> {
        let id = *self
            .args
            .get(index)
            .ok_or_else(|| format!("missing argument {}", index))?;
        match self.ast.get(id) {
            Expr::Value { payload, ty } => Ok((payload, *ty)),
            other => Err(format!("expected a value, got {}", other.kind_name())),
        }
    }

    fn prelude_type(&self, name: &str) -> Result<ExprId, String> {
        self.scope
            .get_expression_by_name(name)
            .map_err(|err| err.to_string())
    }
}

/// Signature of a value builtin implementation.
pub type ValueFn = fn(&mut BuiltinArgs<'_>) -> Result<ExprId, String>;

/// A value-level builtin.
#[derive(Clone, Copy)]
pub struct ValueBuiltin {
    /// Expected argument count
    pub arity: Arity,
    /// Implementation
    pub call: ValueFn,
    /// Terminates the enclosing function with its result
    pub terminates: bool,
}

impl fmt::Debug for ValueBuiltin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueBuiltin")
            .field("arity", &self.arity)
            .field("terminates", &self.terminates)
            .finish_non_exhaustive()
    }
}

/// How a builtin call is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRule {
    /// Use the builtin's declared Arrow, instantiating it when generic
    Signature,
    /// The result has the type named by the builtin itself (`Int(x)`)
    Constructor,
    /// The result is a type (`struct(...)`)
    Universal,
}

/// A type-level builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeBuiltin {
    /// Expected argument count
    pub arity: Arity,
    /// Typing rule
    pub rule: TypeRule,
    /// Terminates the enclosing function with its result
    pub terminates: bool,
}

// ═══════════════════════════════════════════════════════════════════════
// Tables
// ═══════════════════════════════════════════════════════════════════════

/// Value-level builtin table.
#[derive(Debug, Clone, Default)]
pub struct ValueBuiltins {
    entries: IndexMap<String, ValueBuiltin>,
}

impl ValueBuiltins {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table matching the standard prelude.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register_terminating("return", Some(1), builtin_identity);
        table.register("yield", Some(1), builtin_identity);
        table.register("+", Some(2), builtin_add);
        table.register("-", Some(2), builtin_sub);
        table.register("*", Some(2), builtin_mul);
        table.register("/", Some(2), builtin_div);
        table.register("==", Some(2), builtin_eq);
        table.register("<", Some(2), builtin_lt);
        table.register("Int", Some(1), builtin_to_int);
        table.register("Float", Some(1), builtin_to_float);
        table.register("variable", Some(2), builtin_variable);
        table.register("struct", None, builtin_struct);
        table.register("union", None, builtin_union);
        table
    }

    /// Register a builtin.
    pub fn register(&mut self, name: impl Into<String>, arity: Arity, call: ValueFn) {
        self.entries.insert(
            name.into(),
            ValueBuiltin {
                arity,
                call,
                terminates: false,
            },
        );
    }

    /// Register a builtin that ends the enclosing function.
    pub fn register_terminating(&mut self, name: impl Into<String>, arity: Arity, call: ValueFn) {
        self.entries.insert(
            name.into(),
            ValueBuiltin {
                arity,
                call,
                terminates: true,
            },
        );
    }

    /// Look up a builtin by name.
    pub fn get(&self, name: &str) -> Option<&ValueBuiltin> {
        self.entries.get(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered builtins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No builtin registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Type-level builtin table.
#[derive(Debug, Clone, Default)]
pub struct TypeBuiltins {
    entries: IndexMap<String, TypeBuiltin>,
}

impl TypeBuiltins {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table matching the standard prelude.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register_terminating("return", Some(1), TypeRule::Signature);
        table.register("yield", Some(1), TypeRule::Signature);
        for op in ["+", "-", "*", "/", "==", "<"] {
            table.register(op, Some(2), TypeRule::Signature);
        }
        table.register("Int", Some(1), TypeRule::Constructor);
        table.register("Float", Some(1), TypeRule::Constructor);
        table.register("variable", Some(2), TypeRule::Signature);
        table.register("struct", None, TypeRule::Universal);
        table.register("union", None, TypeRule::Universal);
        table
    }

    /// Register a builtin.
    pub fn register(&mut self, name: impl Into<String>, arity: Arity, rule: TypeRule) {
        self.entries.insert(
            name.into(),
            TypeBuiltin {
                arity,
                rule,
                terminates: false,
            },
        );
    }

    /// Register a builtin that ends the enclosing function.
    pub fn register_terminating(&mut self, name: impl Into<String>, arity: Arity, rule: TypeRule) {
        self.entries.insert(
            name.into(),
            TypeBuiltin {
                arity,
                rule,
                terminates: true,
            },
        );
    }

    /// Look up a builtin by name.
    pub fn get(&self, name: &str) -> Option<&TypeBuiltin> {
        self.entries.get(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered builtins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No builtin registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Names registered in only one of the two tables, or registered with
/// different arities or termination.
pub fn check_consistency(values: &ValueBuiltins, types: &TypeBuiltins) -> Vec<String> {
    let mut problems = Vec::new();
    for (name, value) in &values.entries {
        match types.get(name) {
            None => problems.push(format!("{}: missing type rule", name)),
            Some(ty) if ty.arity != value.arity => problems.push(format!(
                "{}: arity {:?} in value table, {:?} in type table",
                name, value.arity, ty.arity
            )),
            Some(ty) if ty.terminates != value.terminates => {
                problems.push(format!("{}: termination differs between tables", name))
            }
            Some(_) => {}
        }
    }
    for name in types.names() {
        if values.get(name).is_none() {
            problems.push(format!("{}: missing value implementation", name));
        }
    }
    problems
}

// ═══════════════════════════════════════════════════════════════════════
// Value Implementations
// ═══════════════════════════════════════════════════════════════════════

fn builtin_identity(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    args.args
        .first()
        .copied()
        .ok_or_else(|| "missing argument".to_string())
}

fn arithmetic(
    args: &mut BuiltinArgs<'_>,
    op: fn(&Payload, &Payload) -> Result<Payload, String>,
) -> Result<ExprId, String> {
    let (lhs, ty) = args.payload(0)?;
    let (rhs, _) = args.payload(1)?;
    let result = op(lhs, rhs)?;
    Ok(args.ast.value(result, ty))
}

fn builtin_add(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    arithmetic(args, Payload::add)
}

fn builtin_sub(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    arithmetic(args, Payload::sub)
}

fn builtin_mul(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    arithmetic(args, Payload::mul)
}

fn builtin_div(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    arithmetic(args, Payload::div)
}

fn builtin_eq(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    let [lhs, rhs] = args.args else {
        return Err(format!("expected 2 arguments, got {}", args.args.len()));
    };
    let same = equal_with(args.ast, args.scope, *lhs, *rhs, args.equality);
    let bool_ty = args.prelude_type("Bool")?;
    Ok(args.ast.value(same, bool_ty))
}

fn builtin_lt(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    let (lhs, _) = args.payload(0)?;
    let (rhs, _) = args.payload(1)?;
    let less = lhs.less_than(rhs)?;
    let bool_ty = args.prelude_type("Bool")?;
    Ok(args.ast.value(less, bool_ty))
}

fn builtin_to_int(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    let (payload, _) = args.payload(0)?;
    let n = payload
        .as_i64()
        .ok_or_else(|| format!("cannot convert {} to Int", payload.kind_name()))?;
    let int = args.prelude_type("Int")?;
    Ok(args.ast.value(n, int))
}

fn builtin_to_float(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    let (payload, _) = args.payload(0)?;
    let x = payload
        .as_f64()
        .ok_or_else(|| format!("cannot convert {} to Float", payload.kind_name()))?;
    let float = args.prelude_type("Float")?;
    Ok(args.ast.value(x, float))
}

fn builtin_variable(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    let name = match args.payload(0)? {
        (Payload::Symbol(name), _) => name.clone(),
        (other, _) => return Err(format!("variable name must be a symbol, got {}", other.kind_name())),
    };
    let ty = *args
        .args
        .get(1)
        .ok_or_else(|| "missing variable type".to_string())?;
    Ok(args.ast.variable(name, Some(ty)))
}

fn members(args: &BuiltinArgs<'_>) -> Result<Vec<ExprId>, String> {
    args.args
        .iter()
        .map(|id| match args.ast.get(*id) {
            Expr::Variable { .. } => Ok(*id),
            other => Err(format!("members must be variables, got {}", other.kind_name())),
        })
        .collect()
}

fn builtin_struct(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    let members = members(args)?;
    Ok(args.ast.structure(members))
}

fn builtin_union(args: &mut BuiltinArgs<'_>) -> Result<ExprId, String> {
    let members = members(args)?;
    if members.is_empty() {
        return Err("a union needs at least one member".to_string());
    }
    Ok(args.ast.union(members))
}
