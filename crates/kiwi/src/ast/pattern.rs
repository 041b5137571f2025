//! Match patterns

use super::ExprId;

/// What a constructor pattern names.
#[derive(Debug, Clone, PartialEq)]
pub enum Constructor {
    /// A union member tag, or the bound name of a struct type
    Member(String),
    /// A type expression the target's type must equal
    Type(ExprId),
}

/// A pattern matched against a match target.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Matches when the target equals the evaluated expression
    Expression(ExprId),

    /// Destructures a struct or union value positionally
    Constructor {
        /// Which constructor is expected
        constructor: Constructor,
        /// Sub-patterns for the members
        fields: Vec<Pattern>,
    },

    /// Binds the target to a name; `_` binds nothing
    Name(String),
}

impl Pattern {
    /// Expression pattern
    pub fn expr(id: ExprId) -> Self {
        Pattern::Expression(id)
    }

    /// Name pattern
    pub fn name(name: impl Into<String>) -> Self {
        Pattern::Name(name.into())
    }

    /// The `_` pattern
    pub fn wildcard() -> Self {
        Pattern::Name("_".to_string())
    }

    /// Union member pattern, e.g. `int(n)`
    pub fn member(tag: impl Into<String>, fields: Vec<Pattern>) -> Self {
        Pattern::Constructor {
            constructor: Constructor::Member(tag.into()),
            fields,
        }
    }

    /// Constructor pattern keyed by a type expression
    pub fn of_type(ty: ExprId, fields: Vec<Pattern>) -> Self {
        Pattern::Constructor {
            constructor: Constructor::Type(ty),
            fields,
        }
    }

    /// Is this the `_` pattern?
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Pattern::Name(name) if name == "_")
    }

    /// Append every expression this pattern refers to.
    pub fn collect_exprs(&self, out: &mut Vec<ExprId>) {
        match self {
            Pattern::Expression(id) => out.push(*id),
            Pattern::Constructor {
                constructor,
                fields,
            } => {
                if let Constructor::Type(id) = constructor {
                    out.push(*id);
                }
                for field in fields {
                    field.collect_exprs(out);
                }
            }
            Pattern::Name(_) => {}
        }
    }
}
