//! The expression tree
//!
//! Every node lives in an [`Ast`] arena and is addressed by an [`ExprId`].
//! Children are held by id; a node's `parent` is a back-index filled in when
//! the parent is allocated, never an ownership edge.

mod attributes;
mod display;
mod expr;
mod pattern;
mod payload;

pub use attributes::Attributes;
pub use expr::{write_once, CallForm, Expr, ExprId, MatchArm, TagWidth};
pub use pattern::{Constructor, Pattern};
pub use payload::Payload;

use crate::scope::Scope;

/// A node slot in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// The node itself
    pub expr: Expr,
    /// First node that adopted this one as a child
    pub parent: Option<ExprId>,
}

/// Arena holding every node of one program.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    attributes: Attributes,
}

impl Ast {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// No node allocated yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate `expr` and adopt any of its children that have no parent yet.
    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        for child in expr.children() {
            if let Some(node) = self.nodes.get_mut(child.index()) {
                if node.parent.is_none() && child != id {
                    node.parent = Some(id);
                }
            }
        }
        self.nodes.push(Node { expr, parent: None });
        id
    }

    /// The node behind `id`.
    ///
    /// Ids are only minted by this arena, so an unknown id is a caller bug.
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()].expr
    }

    /// Parent back-reference of `id`.
    pub fn parent(&self, id: ExprId) -> Option<ExprId> {
        self.nodes.get(id.index()).and_then(|node| node.parent)
    }

    /// Kind name of `id`, for diagnostics.
    pub fn kind(&self, id: ExprId) -> &'static str {
        self.get(id).kind_name()
    }

    /// The metadata side-table.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Attach metadata to a node.
    pub fn set_attribute(&self, node: ExprId, name: impl Into<String>, value: ExprId) {
        self.attributes.set(node, name, value);
    }

    /// Read metadata from a node.
    pub fn attribute(&self, node: ExprId, name: &str) -> Option<ExprId> {
        self.attributes.get(node, name)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type slots
    // ═══════════════════════════════════════════════════════════════════

    /// Declared or inferred type carried directly by a node.
    ///
    /// For a `Function` this is its return type.
    pub fn type_of(&self, id: ExprId) -> Option<ExprId> {
        match self.get(id) {
            Expr::Value { ty, .. } | Expr::StructValue { ty, .. } | Expr::UnionValue { ty, .. } => {
                Some(*ty)
            }
            Expr::Variable { ty, .. } => ty.get().copied(),
            Expr::Function { return_type, .. } => return_type.get().copied(),
            Expr::Builtin { ty, .. } => *ty,
            _ => None,
        }
    }

    /// Fill the write-once type slot of a `Variable` (its type) or a
    /// `Function` (its return type).
    ///
    /// Returns the type the slot holds afterwards; a slot that was already
    /// filled keeps its first value. Nodes without a slot yield `None`.
    pub fn fill_type(&self, id: ExprId, ty: ExprId) -> Option<ExprId> {
        match self.get(id) {
            Expr::Variable { ty: slot, .. } => Some(*slot.get_or_init(|| ty)),
            Expr::Function { return_type, .. } => Some(*return_type.get_or_init(|| ty)),
            _ => None,
        }
    }

    /// Type contributed by an `Arrow` parameter or a struct/union member:
    /// a `Variable` contributes its type, anything else is the type itself.
    pub fn param_type(&self, param: ExprId) -> Option<ExprId> {
        match self.get(param) {
            Expr::Variable { ty, .. } => ty.get().copied(),
            _ => Some(param),
        }
    }

    /// The Arrow type of a `Function`, once every parameter and the return
    /// type are known.
    pub fn function_type(&mut self, id: ExprId) -> Option<ExprId> {
        let (args, return_type) = match self.get(id) {
            Expr::Function {
                args, return_type, ..
            } => (args.clone(), return_type.get().copied()?),
            _ => return None,
        };
        if args.iter().any(|arg| self.param_type(*arg).is_none()) {
            return None;
        }
        Some(self.arrow(args, return_type))
    }

    /// Whether `id` is an Arrow whose parameters are all typed `Type`.
    ///
    /// Such arrows are generic: their parameters bind type arguments that the
    /// nested Arrow they return is instantiated with. An Arrow without
    /// parameters is never compile-time.
    pub fn is_compile_time(&self, scope: &Scope, id: ExprId) -> bool {
        let id = scope.try_resolve(self, id);
        let Expr::Arrow { params, .. } = self.get(id) else {
            return false;
        };
        !params.is_empty()
            && params.iter().all(|param| {
                self.param_type(*param)
                    .map(|ty| scope.try_resolve(self, ty))
                    .is_some_and(|ty| matches!(self.get(ty), Expr::Builtin { name, .. } if name == "Type"))
            })
    }

    /// Tag width of a `Union`, in bits.
    pub fn tag_bits(&self, id: ExprId) -> Option<u32> {
        match self.get(id) {
            Expr::Union { members, tag_width } => Some(tag_width.tag_bits(members.len())),
            _ => None,
        }
    }

    /// Position of the member called `name` in a `Struct` or `Union`.
    pub fn member_index(&self, id: ExprId, name: &str) -> Option<usize> {
        match self.get(id) {
            Expr::Struct { members } | Expr::Union { members, .. } => members
                .iter()
                .position(|member| self.get(*member).name() == Some(name)),
            _ => None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Node constructors
    // ═══════════════════════════════════════════════════════════════════

    /// Literal value of type `ty`.
    pub fn value(&mut self, payload: impl Into<Payload>, ty: ExprId) -> ExprId {
        self.alloc(Expr::Value {
            payload: payload.into(),
            ty,
        })
    }

    /// Struct instance.
    pub fn struct_value(&mut self, members: Vec<ExprId>, ty: ExprId) -> ExprId {
        self.alloc(Expr::StructValue { members, ty })
    }

    /// Union instance.
    pub fn union_value(&mut self, tag: impl Into<String>, payload: ExprId, ty: ExprId) -> ExprId {
        self.alloc(Expr::UnionValue {
            tag: tag.into(),
            payload,
            ty,
        })
    }

    /// Variable, optionally typed.
    pub fn variable(&mut self, name: impl Into<String>, ty: Option<ExprId>) -> ExprId {
        self.alloc(Expr::Variable {
            name: name.into(),
            ty: write_once(ty),
        })
    }

    /// `name := expr`
    pub fn bind(&mut self, name: impl Into<String>, expr: ExprId) -> ExprId {
        self.alloc(Expr::Bind {
            name: name.into(),
            expr,
        })
    }

    /// Reference to `name` as currently bound in `scope`.
    ///
    /// Forward references are allowed: the name need not be bound yet.
    pub fn reference(&mut self, scope: &Scope, name: impl Into<String>) -> ExprId {
        let name = name.into();
        let index = scope.get_index(&name);
        let pointee = index.and_then(|index| scope.get_expression_by_index(index));
        self.alloc(Expr::Reference {
            name,
            index,
            size: scope.len(),
            pointee,
        })
    }

    /// Named function with an optional declared return type.
    pub fn function(&mut self, args: Vec<ExprId>, return_type: Option<ExprId>, body: ExprId) -> ExprId {
        self.alloc(Expr::Function {
            args,
            return_type: write_once(return_type),
            body,
            is_lambda: false,
            inline: false,
        })
    }

    /// Lambda; its return type is always inferred.
    pub fn lambda(&mut self, args: Vec<ExprId>, body: ExprId) -> ExprId {
        self.alloc(Expr::Function {
            args,
            return_type: write_once(None),
            body,
            is_lambda: true,
            inline: false,
        })
    }

    /// `callee(args...)`
    pub fn call(&mut self, callee: ExprId, args: Vec<ExprId>) -> ExprId {
        self.alloc(Expr::Call {
            callee,
            args,
            form: CallForm::Regular,
        })
    }

    /// `lhs op rhs`
    pub fn binary(&mut self, op: ExprId, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.alloc(Expr::Call {
            callee: op,
            args: vec![lhs, rhs],
            form: CallForm::Binary,
        })
    }

    /// `op operand`
    pub fn unary(&mut self, op: ExprId, operand: ExprId) -> ExprId {
        self.alloc(Expr::Call {
            callee: op,
            args: vec![operand],
            form: CallForm::Unary,
        })
    }

    /// `(params) -> return_type`
    pub fn arrow(&mut self, params: Vec<ExprId>, return_type: ExprId) -> ExprId {
        self.alloc(Expr::Arrow {
            params,
            return_type,
        })
    }

    /// Struct type.
    pub fn structure(&mut self, members: Vec<ExprId>) -> ExprId {
        self.alloc(Expr::Struct { members })
    }

    /// Union type with a minimal tag.
    pub fn union(&mut self, members: Vec<ExprId>) -> ExprId {
        self.union_with_tag(members, TagWidth::Minimal)
    }

    /// Union type with an explicit tag width policy.
    pub fn union_with_tag(&mut self, members: Vec<ExprId>, tag_width: TagWidth) -> ExprId {
        self.alloc(Expr::Union { members, tag_width })
    }

    /// `name = expr`
    pub fn named(&mut self, name: impl Into<String>, expr: ExprId) -> ExprId {
        self.alloc(Expr::NamedArgument {
            name: name.into(),
            expr,
        })
    }

    /// `{ exprs... }`
    pub fn block(&mut self, exprs: Vec<ExprId>) -> ExprId {
        self.alloc(Expr::Block { exprs })
    }

    /// `match target { arms..., _ => default }`
    pub fn match_expr(&mut self, target: ExprId, arms: Vec<MatchArm>, default: Option<ExprId>) -> ExprId {
        self.alloc(Expr::Match {
            target,
            arms,
            default,
        })
    }

    /// Primitive resolved through the builtin tables.
    pub fn builtin(&mut self, name: impl Into<String>, ty: Option<ExprId>) -> ExprId {
        self.alloc(Expr::Builtin {
            name: name.into(),
            ty,
        })
    }
}
