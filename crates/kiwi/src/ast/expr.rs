//! Node kinds of the expression tree

use std::cell::OnceCell;
use std::fmt;

use super::{Pattern, Payload};

/// Index of a node inside an [`Ast`](super::Ast) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub(crate) u32);

impl ExprId {
    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Syntactic form of a call, kept for rendering and backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallForm {
    /// `f(a, b, ...)`
    #[default]
    Regular,
    /// `a op b`
    Binary,
    /// `op a`
    Unary,
}

/// How many bits a union spends on its discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagWidth {
    /// Just enough bits to tell every member apart
    #[default]
    Minimal,
    /// A fixed number of bits, regardless of member count
    Fixed(u32),
}

impl TagWidth {
    /// Number of tag bits for a union with `members` members.
    pub fn tag_bits(self, members: usize) -> u32 {
        match self {
            TagWidth::Fixed(bits) => bits,
            TagWidth::Minimal if members <= 1 => 0,
            TagWidth::Minimal => usize::BITS - (members - 1).leading_zeros(),
        }
    }
}

/// One `pattern => branch` arm of a match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    /// What the target is matched against
    pub pattern: Pattern,
    /// Evaluated when the pattern matches
    pub branch: ExprId,
}

impl MatchArm {
    /// Create an arm
    pub fn new(pattern: Pattern, branch: ExprId) -> Self {
        Self { pattern, branch }
    }
}

/// The closed set of node kinds.
///
/// Type slots that inference is allowed to fill (`Variable::ty` and
/// `Function::return_type`) are write-once cells; every other field is fixed
/// once the node is allocated.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal or an evaluation result.
    Value {
        /// Runtime payload
        payload: Payload,
        /// Type of the payload
        ty: ExprId,
    },

    /// An instance of a struct type.
    StructValue {
        /// Member values in declaration order
        members: Vec<ExprId>,
        /// The struct type
        ty: ExprId,
    },

    /// An instance of a union type.
    UnionValue {
        /// Name of the active member
        tag: String,
        /// Value of the active member
        payload: ExprId,
        /// The union type
        ty: ExprId,
    },

    /// A formal parameter, struct/union member or declared binding.
    Variable {
        /// Name
        name: String,
        /// Type, possibly filled in by inference
        ty: OnceCell<ExprId>,
    },

    /// `name := expr` in the current scope.
    Bind {
        /// Bound name
        name: String,
        /// Bound expression
        expr: ExprId,
    },

    /// A use of a bound name.
    ///
    /// `index` and `size` record where the binding sat when the reference was
    /// built; resolution itself is by name.
    Reference {
        /// Referenced name
        name: String,
        /// Binding index at creation, if the name was bound then
        index: Option<usize>,
        /// Visible binding count at creation
        size: usize,
        /// Binding the name pointed at when the reference was built
        pointee: Option<ExprId>,
    },

    /// A function or lambda.
    Function {
        /// Parameters, each a `Variable`
        args: Vec<ExprId>,
        /// Return type, possibly filled in by inference
        return_type: OnceCell<ExprId>,
        /// Body
        body: ExprId,
        /// Written as a lambda
        is_lambda: bool,
        /// Inlining hint for backends
        inline: bool,
    },

    /// Sequential evaluation. A block does not yield its last value.
    Block {
        /// Elements in evaluation order
        exprs: Vec<ExprId>,
    },

    /// Pattern dispatch on a target value.
    Match {
        /// Matched value
        target: ExprId,
        /// Arms tried in order
        arms: Vec<MatchArm>,
        /// Taken when no arm matches
        default: Option<ExprId>,
    },

    /// A primitive resolved through the builtin tables.
    Builtin {
        /// Table key
        name: String,
        /// Declared type, absent only for `Type` itself and variadic builtins
        ty: Option<ExprId>,
    },

    /// A function type.
    Arrow {
        /// Parameter types, or `Variable`s carrying them
        params: Vec<ExprId>,
        /// Return type
        return_type: ExprId,
    },

    /// A product type.
    Struct {
        /// Members, each a `Variable`
        members: Vec<ExprId>,
    },

    /// A tagged sum type.
    Union {
        /// Members, each a `Variable`
        members: Vec<ExprId>,
        /// Discriminant width policy
        tag_width: TagWidth,
    },

    /// `name = expr` at a union construction site.
    NamedArgument {
        /// Member name
        name: String,
        /// Member value
        expr: ExprId,
    },

    /// A call, binary operator or unary operator.
    Call {
        /// Called expression
        callee: ExprId,
        /// Arguments
        args: Vec<ExprId>,
        /// Syntactic form
        form: CallForm,
    },
}

impl Expr {
    /// Get the kind name of this node (for error messages).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Value { .. } => "value",
            Expr::StructValue { .. } => "struct value",
            Expr::UnionValue { .. } => "union value",
            Expr::Variable { .. } => "variable",
            Expr::Bind { .. } => "bind",
            Expr::Reference { .. } => "reference",
            Expr::Function { .. } => "function",
            Expr::Block { .. } => "block",
            Expr::Match { .. } => "match",
            Expr::Builtin { .. } => "builtin",
            Expr::Arrow { .. } => "arrow",
            Expr::Struct { .. } => "struct",
            Expr::Union { .. } => "union",
            Expr::NamedArgument { .. } => "named argument",
            Expr::Call { .. } => "call",
        }
    }

    /// Structural children, in source order.
    ///
    /// Type annotations (`Value::ty`, `Variable::ty`, ...) point at shared type
    /// nodes and are not children.
    pub fn children(&self) -> Vec<ExprId> {
        match self {
            Expr::Value { .. }
            | Expr::Variable { .. }
            | Expr::Reference { .. }
            | Expr::Builtin { .. } => Vec::new(),
            Expr::StructValue { members, .. } => members.clone(),
            Expr::UnionValue { payload, .. } => vec![*payload],
            Expr::Bind { expr, .. } | Expr::NamedArgument { expr, .. } => vec![*expr],
            Expr::Function { args, body, .. } => {
                let mut out = args.clone();
                out.push(*body);
                out
            }
            Expr::Block { exprs } => exprs.clone(),
            Expr::Match {
                target,
                arms,
                default,
            } => {
                let mut out = vec![*target];
                for arm in arms {
                    arm.pattern.collect_exprs(&mut out);
                    out.push(arm.branch);
                }
                out.extend(default.iter().copied());
                out
            }
            Expr::Arrow {
                params,
                return_type,
            } => {
                let mut out = params.clone();
                out.push(*return_type);
                out
            }
            Expr::Struct { members } | Expr::Union { members, .. } => members.clone(),
            Expr::Call { callee, args, .. } => {
                let mut out = vec![*callee];
                out.extend(args.iter().copied());
                out
            }
        }
    }

    /// Name carried by a `Variable`, `Bind`, `Reference`, `Builtin` or
    /// `NamedArgument`.
    pub fn name(&self) -> Option<&str> {
        match self {
            Expr::Variable { name, .. }
            | Expr::Bind { name, .. }
            | Expr::Reference { name, .. }
            | Expr::Builtin { name, .. }
            | Expr::NamedArgument { name, .. } => Some(name),
            _ => None,
        }
    }

    /// True for nodes that define something callable or a type.
    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            Expr::Function { .. }
                | Expr::Struct { .. }
                | Expr::Union { .. }
                | Expr::Arrow { .. }
                | Expr::Builtin { .. }
        )
    }
}

/// Build a write-once cell, already filled when `value` is present.
pub fn write_once(value: Option<ExprId>) -> OnceCell<ExprId> {
    let cell = OnceCell::new();
    if let Some(value) = value {
        let _ = cell.set(value);
    }
    cell
}
