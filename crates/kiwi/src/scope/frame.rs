//! RAII guard over a child scope

use super::Scope;

/// Exits the scope it entered when dropped.
///
/// Meta parameters of a generic signature live in such a scope: `T` is
/// bound while the signature refers to it and is gone afterwards.
///
/// # Example
///
/// ```
/// use kiwi::{Ast, Scope};
///
/// let mut ast = Ast::new();
/// let mut scope = Scope::with_prelude(&mut ast);
/// let ty = scope.get_expression_by_name("Type").unwrap();
///
/// let t_ref = {
///     let mut guard = scope.scope_guard();
///     let meta = ast.variable("T", Some(ty));
///     guard.insert_binding("T", meta);
///     let t_ref = ast.reference(&guard, "T");
///     assert_eq!(guard.resolve(&ast, t_ref), Ok(meta));
///     t_ref
/// };
/// assert!(scope.resolve(&ast, t_ref).is_err());
/// ```
pub struct ScopeGuard<'a> {
    scope: &'a mut Scope,
}

impl Scope {
    /// Enter a scope now and exit it when the guard drops.
    pub fn scope_guard(&mut self) -> ScopeGuard<'_> {
        self.enter_scope();
        ScopeGuard { scope: self }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.scope.exit_scope();
    }
}

impl std::ops::Deref for ScopeGuard<'_> {
    type Target = Scope;

    fn deref(&self) -> &Self::Target {
        self.scope
    }
}

impl std::ops::DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.scope
    }
}
