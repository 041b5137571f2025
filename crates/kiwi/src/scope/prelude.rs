//! Standard prelude: primitive types and builtin operators

use super::Scope;
use crate::ast::{Ast, ExprId};

/// Primitive types bound in the prelude, besides `Type` itself.
pub const PRIMITIVE_TYPES: [&str; 5] = ["Float", "Int", "Bool", "Unit", "Symbol"];

impl Scope {
    /// Create a root scope holding the standard prelude.
    pub fn with_prelude(ast: &mut Ast) -> Self {
        let mut scope = Self::new();
        scope.load_prelude(ast);
        scope
    }

    /// Bind the standard prelude into the current scope.
    pub fn load_prelude(&mut self, ast: &mut Ast) {
        // Types
        let ty = ast.builtin("Type", None);
        self.insert_binding("Type", ty);
        let [_, _, bool_ty, _, symbol] = PRIMITIVE_TYPES.map(|name| {
            let prim = ast.builtin(name, Some(ty));
            self.insert_binding(name, prim);
            prim
        });

        // Control: (T: Type) -> (r: T) -> T
        for name in ["return", "yield"] {
            let sig = self.generic(ast, ty, &["r"], None);
            self.define_builtin(ast, name, Some(sig));
        }

        // Arithmetic: (T: Type) -> (a: T, b: T) -> T
        for name in ["+", "-", "*", "/"] {
            let sig = self.generic(ast, ty, &["a", "b"], None);
            self.define_builtin(ast, name, Some(sig));
        }

        // Comparison: (T: Type) -> (a: T, b: T) -> Bool
        for name in ["==", "<"] {
            let sig = self.generic(ast, ty, &["a", "b"], Some(bool_ty));
            self.define_builtin(ast, name, Some(sig));
        }

        // variable(name: Symbol, type: Type) -> Type
        let name_param = ast.variable("name", Some(symbol));
        let type_param = ast.variable("type", Some(ty));
        let sig = ast.arrow(vec![name_param, type_param], ty);
        self.define_builtin(ast, "variable", Some(sig));

        // Variadic type constructors
        self.define_builtin(ast, "struct", None);
        self.define_builtin(ast, "union", None);
    }

    fn define_builtin(&mut self, ast: &mut Ast, name: &str, sig: Option<ExprId>) {
        let builtin = ast.builtin(name, sig);
        self.insert_binding(name, builtin);
    }

    /// Build `(T: Type) -> (params: T...) -> ret`, where `ret` defaults to `T`.
    ///
    /// The inner arrow refers to `T` by name; the binding only exists while
    /// the signature is built, so uses of it must rebind `T` to resolve it.
    fn generic(&mut self, ast: &mut Ast, ty: ExprId, params: &[&str], ret: Option<ExprId>) -> ExprId {
        let mut guard = self.scope_guard();
        let meta = ast.variable("T", Some(ty));
        guard.insert_binding("T", meta);

        let params = params
            .iter()
            .map(|name| {
                let t = ast.reference(&guard, "T");
                ast.variable(*name, Some(t))
            })
            .collect();
        let ret = match ret {
            Some(ret) => ret,
            None => ast.reference(&guard, "T"),
        };
        let inner = ast.arrow(params, ret);
        ast.arrow(vec![meta], inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use crate::builtin::{TypeBuiltins, ValueBuiltins};

    #[test]
    fn test_prelude_binds_types() {
        let mut ast = Ast::new();
        let scope = Scope::with_prelude(&mut ast);

        let ty = scope.get_expression_by_name("Type").unwrap();
        assert!(matches!(ast.get(ty), Expr::Builtin { ty: None, .. }));
        for name in PRIMITIVE_TYPES {
            let prim = scope.get_expression_by_name(name).unwrap();
            assert_eq!(ast.type_of(prim), Some(ty), "{} should be typed Type", name);
        }
    }

    #[test]
    fn test_prelude_covers_builtin_tables() {
        let mut ast = Ast::new();
        let scope = Scope::with_prelude(&mut ast);

        for name in ValueBuiltins::standard().names() {
            assert!(scope.contains(name), "prelude is missing {}", name);
        }
        for name in TypeBuiltins::standard().names() {
            assert!(scope.contains(name), "prelude is missing {}", name);
        }
    }

    #[test]
    fn test_generic_signatures_are_compile_time() {
        let mut ast = Ast::new();
        let scope = Scope::with_prelude(&mut ast);

        for name in ["return", "yield", "+", "==", "<"] {
            let builtin = scope.get_expression_by_name(name).unwrap();
            let sig = ast.type_of(builtin).unwrap();
            assert!(ast.is_compile_time(&scope, sig), "{} should be generic", name);
        }
        let variable = scope.get_expression_by_name("variable").unwrap();
        let sig = ast.type_of(variable).unwrap();
        assert!(!ast.is_compile_time(&scope, sig));
    }

    #[test]
    fn test_generic_meta_is_not_leaked() {
        let mut ast = Ast::new();
        let scope = Scope::with_prelude(&mut ast);
        assert!(!scope.contains("T"));
        assert!(scope.is_root());
    }

    #[test]
    fn test_render_signature() {
        let mut ast = Ast::new();
        let scope = Scope::with_prelude(&mut ast);
        let plus = scope.get_expression_by_name("+").unwrap();
        let sig = ast.type_of(plus).unwrap();
        assert_eq!(ast.render(sig), "(T: Type) -> (a: T, b: T) -> T");
    }
}
