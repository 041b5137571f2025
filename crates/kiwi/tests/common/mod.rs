//! Random program trees shared by the property tests

#![allow(dead_code)]

use kiwi::*;
use proptest::prelude::*;

/// Tree shapes built into an arena by [`build`].
#[derive(Debug, Clone)]
pub enum Shape {
    Int(i64),
    Float(f64),
    Flag(bool),
    /// Variable named `name`, typed Int when the flag is set
    Var(String, bool),
    Struct(Vec<(String, bool)>),
    Union(Vec<(String, bool)>),
    Named(String, Box<Shape>),
    Call(Vec<Shape>),
}

pub fn name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "int", "float"]).prop_map(str::to_string)
}

pub fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Shape::Int),
        (-1e6f64..1e6).prop_map(Shape::Float),
        any::<bool>().prop_map(Shape::Flag),
        (name(), any::<bool>()).prop_map(|(n, t)| Shape::Var(n, t)),
        prop::collection::vec((name(), any::<bool>()), 0..4).prop_map(Shape::Struct),
        prop::collection::vec((name(), any::<bool>()), 1..4).prop_map(Shape::Union),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            (name(), inner.clone()).prop_map(|(n, s)| Shape::Named(n, Box::new(s))),
            prop::collection::vec(inner, 0..4).prop_map(Shape::Call),
        ]
    })
}

pub fn build(ast: &mut Ast, scope: &Scope, shape: &Shape) -> ExprId {
    let ty = |name: &str| scope.get_expression_by_name(name).unwrap();
    let member_type = |typed: bool| if typed { ty("Int") } else { ty("Float") };
    match shape {
        Shape::Int(n) => ast.value(*n, ty("Int")),
        Shape::Float(x) => ast.value(*x, ty("Float")),
        Shape::Flag(b) => ast.value(*b, ty("Bool")),
        Shape::Var(name, typed) => ast.variable(name.clone(), Some(member_type(*typed))),
        Shape::Struct(members) => {
            let members = members
                .iter()
                .map(|(n, t)| ast.variable(n.clone(), Some(member_type(*t))))
                .collect();
            ast.structure(members)
        }
        Shape::Union(members) => {
            let members = members
                .iter()
                .map(|(n, t)| ast.variable(n.clone(), Some(member_type(*t))))
                .collect();
            ast.union(members)
        }
        Shape::Named(name, inner) => {
            let inner = build(ast, scope, inner);
            ast.named(name.clone(), inner)
        }
        Shape::Call(args) => {
            let callee = ty("+");
            let args = args.iter().map(|arg| build(ast, scope, arg)).collect();
            ast.call(callee, args)
        }
    }
}

pub fn setup() -> (Ast, Scope) {
    let mut ast = Ast::new();
    let scope = Scope::with_prelude(&mut ast);
    (ast, scope)
}
