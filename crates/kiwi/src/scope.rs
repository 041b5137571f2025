//! Lexically nested name bindings

mod frame;
mod prelude;

pub use frame::ScopeGuard;

use crate::ast::{Ast, Expr, ExprId};
use crate::error::ScopeError;

/// A single name binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// The binding's name
    pub name: String,

    /// The bound expression
    pub expr: ExprId,
}

/// The scope chain.
///
/// Uses a flat binding array with frame boundaries: entering a scope marks
/// the current binding count, exiting truncates back to it. Names resolve
/// innermost first, so a later binding shadows an earlier one without
/// removing it.
///
/// # Example
///
/// ```
/// use kiwi::{Ast, Scope};
///
/// let mut ast = Ast::new();
/// let mut scope = Scope::new();
/// let int = ast.builtin("Int", None);
/// let x = ast.variable("x", Some(int));
///
/// scope.insert_binding("x", x);
/// scope.enter_scope();
/// let inner = ast.variable("x", None);
/// scope.insert_binding("x", inner);
/// assert_eq!(scope.get_expression_by_name("x"), Ok(inner));
///
/// scope.exit_scope();
/// assert_eq!(scope.get_expression_by_name("x"), Ok(x));
/// ```
#[derive(Debug, Clone)]
pub struct Scope {
    /// All bindings in a flat array (most recent at end)
    bindings: Vec<Binding>,

    /// Frame boundaries (indices into bindings)
    frames: Vec<usize>,

    /// Current call depth (for recursion limiting)
    call_depth: usize,

    /// Maximum allowed call depth
    max_call_depth: usize,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Create an empty root scope.
    pub fn new() -> Self {
        Self::with_max_call_depth(1000)
    }

    /// Create a root scope with a custom call depth limit.
    pub fn with_max_call_depth(max_depth: usize) -> Self {
        Self {
            bindings: Vec::new(),
            frames: vec![0],
            call_depth: 0,
            max_call_depth: max_depth,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scope Entry/Exit
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a child scope starting at the current binding count.
    pub fn enter_scope(&mut self) {
        self.frames.push(self.bindings.len());
    }

    /// Return to the parent scope, dropping the child's bindings.
    ///
    /// Does nothing at the root.
    pub fn exit_scope(&mut self) {
        if self.frames.len() > 1 {
            if let Some(boundary) = self.frames.pop() {
                self.bindings.truncate(boundary);
            }
        }
    }

    /// Number of scopes in the chain, root included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// At the root scope.
    pub fn is_root(&self) -> bool {
        self.frames.len() == 1
    }

    // ═══════════════════════════════════════════════════════════════════
    // Call Depth Tracking
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a function call. Returns error if max depth exceeded.
    pub fn enter_call(&mut self) -> Result<(), ScopeError> {
        self.enter_call_within(self.max_call_depth)
    }

    /// Enter a function call under a limit other than this scope's own.
    pub fn enter_call_within(&mut self, max_depth: usize) -> Result<(), ScopeError> {
        if self.call_depth >= max_depth {
            return Err(ScopeError::StackOverflow {
                depth: self.call_depth,
                max: max_depth,
            });
        }
        self.call_depth += 1;
        Ok(())
    }

    /// Exit a function call.
    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// Current call depth.
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// Call depth limit used by [`Scope::enter_call`].
    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    // ═══════════════════════════════════════════════════════════════════
    // Bindings
    // ═══════════════════════════════════════════════════════════════════

    /// Bind `name` to `expr` in the current scope, returning its index.
    pub fn insert_binding(&mut self, name: impl Into<String>, expr: ExprId) -> usize {
        self.bindings.push(Binding {
            name: name.into(),
            expr,
        });
        self.bindings.len() - 1
    }

    /// Total bindings visible here, outer scopes included.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// No bindings visible.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings added since the current scope was entered.
    pub fn local_len(&self) -> usize {
        let start = self.frames.last().copied().unwrap_or(0);
        self.bindings.len() - start
    }

    /// Is `name` bound anywhere in the chain?
    pub fn contains(&self, name: &str) -> bool {
        self.get_index(name).is_some()
    }

    /// Index of the innermost binding of `name`.
    pub fn get_index(&self, name: &str) -> Option<usize> {
        self.bindings.iter().rposition(|binding| binding.name == name)
    }

    /// Expression bound at `index`, if still visible.
    pub fn get_expression_by_index(&self, index: usize) -> Option<ExprId> {
        self.bindings.get(index).map(|binding| binding.expr)
    }

    /// Innermost expression bound to `name`.
    pub fn get_expression_by_name(&self, name: &str) -> Result<ExprId, ScopeError> {
        self.bindings
            .iter()
            .rev()
            .find(|binding| binding.name == name)
            .map(|binding| binding.expr)
            .ok_or_else(|| ScopeError::NotFound {
                name: name.to_string(),
            })
    }

    /// Resolve a `Reference` node by its name.
    ///
    /// The index and size recorded on the reference are not consulted: they
    /// go stale as soon as an enclosing scope grows.
    pub fn get_expression_by_ref(&self, ast: &Ast, reference: ExprId) -> Result<ExprId, ScopeError> {
        match ast.get(reference) {
            Expr::Reference { name, .. } => self.get_expression_by_name(name),
            other => Err(ScopeError::NotFound {
                name: format!("<{}>", other.kind_name()),
            }),
        }
    }

    /// Follow references until a non-reference node is reached.
    ///
    /// Non-reference nodes resolve to themselves.
    pub fn resolve(&self, ast: &Ast, id: ExprId) -> Result<ExprId, ScopeError> {
        let mut current = id;
        for _ in 0..=self.bindings.len() {
            if !matches!(ast.get(current), Expr::Reference { .. }) {
                return Ok(current);
            }
            current = self.get_expression_by_ref(ast, current)?;
        }
        // every hop consumed a binding without leaving the reference chain
        Err(ScopeError::NotFound {
            name: ast.render(id),
        })
    }

    /// Like [`resolve`](Self::resolve), keeping `id` when it cannot be resolved.
    pub fn try_resolve(&self, ast: &Ast, id: ExprId) -> ExprId {
        self.resolve(ast, id).unwrap_or(id)
    }

    /// Visible bindings, innermost first.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Ast, Scope, ExprId) {
        let mut ast = Ast::new();
        let int = ast.builtin("Int", None);
        (ast, Scope::new(), int)
    }

    #[test]
    fn test_insert_and_lookup() {
        let (mut ast, mut scope, int) = setup();
        let x = ast.value(1, int);
        assert_eq!(scope.insert_binding("x", x), 0);
        assert_eq!(scope.get_expression_by_name("x"), Ok(x));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_missing_name() {
        let (_, scope, _) = setup();
        assert_eq!(
            scope.get_expression_by_name("nope"),
            Err(ScopeError::NotFound {
                name: "nope".to_string()
            })
        );
    }

    #[test]
    fn test_shadowing_keeps_both_by_index() {
        let (mut ast, mut scope, int) = setup();
        let one = ast.value(1, int);
        let two = ast.value(2, int);
        let first = scope.insert_binding("x", one);
        let second = scope.insert_binding("x", two);

        assert_eq!(scope.get_expression_by_name("x"), Ok(two));
        assert_eq!(scope.get_expression_by_index(first), Some(one));
        assert_eq!(scope.get_expression_by_index(second), Some(two));
        assert_eq!(scope.get_index("x"), Some(second));
    }

    #[test]
    fn test_exit_scope_drops_locals() {
        let (mut ast, mut scope, int) = setup();
        let one = ast.value(1, int);
        scope.insert_binding("x", one);

        scope.enter_scope();
        scope.insert_binding("y", one);
        assert_eq!(scope.local_len(), 1);
        assert!(scope.contains("x"));
        scope.exit_scope();

        assert!(!scope.contains("y"));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_exit_at_root_is_noop() {
        let (mut ast, mut scope, int) = setup();
        let one = ast.value(1, int);
        scope.insert_binding("x", one);
        scope.exit_scope();
        assert!(scope.is_root());
        assert_eq!(scope.get_expression_by_name("x"), Ok(one));
    }

    #[test]
    fn test_reference_survives_sibling_growth() {
        let (mut ast, mut scope, int) = setup();
        let one = ast.value(1, int);
        let two = ast.value(2, int);
        scope.insert_binding("x", one);
        let x_ref = ast.reference(&scope, "x");

        scope.insert_binding("y", two);
        scope.enter_scope();
        scope.insert_binding("z", two);

        assert_eq!(scope.get_expression_by_ref(&ast, x_ref), Ok(one));
    }

    #[test]
    fn test_reference_records_position() {
        let (mut ast, mut scope, int) = setup();
        let one = ast.value(1, int);
        scope.insert_binding("x", one);
        let x_ref = ast.reference(&scope, "x");
        let fwd = ast.reference(&scope, "later");

        match ast.get(x_ref) {
            Expr::Reference {
                index,
                size,
                pointee,
                ..
            } => {
                assert_eq!(*index, Some(0));
                assert_eq!(*size, 1);
                assert_eq!(*pointee, Some(one));
            }
            other => panic!("expected reference, got {:?}", other),
        }
        assert!(matches!(
            ast.get(fwd),
            Expr::Reference { pointee: None, index: None, .. }
        ));
    }

    #[test]
    fn test_resolve_follows_chains() {
        let (mut ast, mut scope, int) = setup();
        let one = ast.value(1, int);
        scope.insert_binding("x", one);
        let x_ref = ast.reference(&scope, "x");
        scope.insert_binding("y", x_ref);
        let y_ref = ast.reference(&scope, "y");

        assert_eq!(scope.resolve(&ast, y_ref), Ok(one));
        assert_eq!(scope.resolve(&ast, one), Ok(one));
    }

    #[test]
    fn test_resolve_detects_cycles() {
        let (mut ast, mut scope, _) = setup();
        let x_ref = ast.reference(&scope, "x");
        scope.insert_binding("x", x_ref);

        assert!(scope.resolve(&ast, x_ref).is_err());
        assert_eq!(scope.try_resolve(&ast, x_ref), x_ref);
    }

    #[test]
    fn test_call_depth_limit() {
        let mut scope = Scope::with_max_call_depth(2);
        assert!(scope.enter_call().is_ok());
        assert!(scope.enter_call().is_ok());
        assert_eq!(
            scope.enter_call(),
            Err(ScopeError::StackOverflow { depth: 2, max: 2 })
        );
        scope.exit_call();
        assert_eq!(scope.call_depth(), 1);
    }

    #[test]
    fn test_call_limit_override_keeps_own_limit() {
        let mut scope = Scope::with_max_call_depth(8);
        assert_eq!(
            scope.enter_call_within(0),
            Err(ScopeError::StackOverflow { depth: 0, max: 0 })
        );
        assert!(scope.enter_call_within(1).is_ok());
        assert_eq!(scope.max_call_depth(), 8);
        assert!(scope.enter_call().is_ok());
    }
}
