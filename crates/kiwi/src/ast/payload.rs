//! Runtime payloads carried by literal `Value` nodes

use std::fmt;

/// The runtime payload of a literal value.
///
/// Arithmetic never coerces between `Int` and `Float`: mixing them is an
/// error reported by the builtin that attempted it.
#[derive(Debug, Clone)]
pub enum Payload {
    /// The unit payload, produced by blocks
    Unit,

    /// Boolean
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// A name, used by the reflective `variable` builtin
    Symbol(String),
}

impl Payload {
    /// Name of the payload kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Unit => "unit",
            Payload::Bool(_) => "bool",
            Payload::Int(_) => "int",
            Payload::Float(_) => "float",
            Payload::Symbol(_) => "symbol",
        }
    }

    /// Create a symbol payload
    pub fn symbol(name: impl Into<String>) -> Self {
        Payload::Symbol(name.into())
    }

    /// Numeric view of the payload, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Payload::Int(n) => Some(*n as f64),
            Payload::Float(x) => Some(*x),
            Payload::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Payload::Unit | Payload::Symbol(_) => None,
        }
    }

    /// Integer view of the payload, truncating floats.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Payload::Int(n) => Some(*n),
            Payload::Float(x) => Some(x.trunc() as i64),
            Payload::Bool(b) => Some(i64::from(*b)),
            Payload::Unit | Payload::Symbol(_) => None,
        }
    }

    /// `self + other`
    pub fn add(&self, other: &Payload) -> Result<Payload, String> {
        match (self, other) {
            (Payload::Int(a), Payload::Int(b)) => a
                .checked_add(*b)
                .map(Payload::Int)
                .ok_or_else(|| format!("integer overflow in {} + {}", a, b)),
            (Payload::Float(a), Payload::Float(b)) => Ok(Payload::Float(a + b)),
            _ => Err(mismatch("+", self, other)),
        }
    }

    /// `self - other`
    pub fn sub(&self, other: &Payload) -> Result<Payload, String> {
        match (self, other) {
            (Payload::Int(a), Payload::Int(b)) => a
                .checked_sub(*b)
                .map(Payload::Int)
                .ok_or_else(|| format!("integer overflow in {} - {}", a, b)),
            (Payload::Float(a), Payload::Float(b)) => Ok(Payload::Float(a - b)),
            _ => Err(mismatch("-", self, other)),
        }
    }

    /// `self * other`
    pub fn mul(&self, other: &Payload) -> Result<Payload, String> {
        match (self, other) {
            (Payload::Int(a), Payload::Int(b)) => a
                .checked_mul(*b)
                .map(Payload::Int)
                .ok_or_else(|| format!("integer overflow in {} * {}", a, b)),
            (Payload::Float(a), Payload::Float(b)) => Ok(Payload::Float(a * b)),
            _ => Err(mismatch("*", self, other)),
        }
    }

    /// `self / other`
    pub fn div(&self, other: &Payload) -> Result<Payload, String> {
        match (self, other) {
            (Payload::Int(_), Payload::Int(0)) => Err("division by zero".to_string()),
            (Payload::Int(a), Payload::Int(b)) => a
                .checked_div(*b)
                .map(Payload::Int)
                .ok_or_else(|| format!("integer overflow in {} / {}", a, b)),
            (Payload::Float(a), Payload::Float(b)) => Ok(Payload::Float(a / b)),
            _ => Err(mismatch("/", self, other)),
        }
    }

    /// `self < other`
    pub fn less_than(&self, other: &Payload) -> Result<bool, String> {
        match (self, other) {
            (Payload::Int(a), Payload::Int(b)) => Ok(a < b),
            (Payload::Float(a), Payload::Float(b)) => Ok(a < b),
            (Payload::Bool(a), Payload::Bool(b)) => Ok(a < b),
            (Payload::Symbol(a), Payload::Symbol(b)) => Ok(a < b),
            _ => Err(mismatch("<", self, other)),
        }
    }
}

fn mismatch(op: &str, lhs: &Payload, rhs: &Payload) -> String {
    format!(
        "cannot apply `{}` to {} and {}",
        op,
        lhs.kind_name(),
        rhs.kind_name()
    )
}

// NaN payloads compare equal to themselves so that value equality stays reflexive.
impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Unit, Payload::Unit) => true,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::Int(a), Payload::Int(b)) => a == b,
            (Payload::Float(a), Payload::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Payload::Symbol(a), Payload::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Unit => write!(f, "()"),
            Payload::Bool(b) => write!(f, "{}", b),
            Payload::Int(n) => write!(f, "{}", n),
            Payload::Float(x) => write!(f, "{:?}", x),
            Payload::Symbol(s) => write!(f, "'{}", s),
        }
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Bool(b)
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Payload::Int(n)
    }
}

impl From<i32> for Payload {
    fn from(n: i32) -> Self {
        Payload::Int(i64::from(n))
    }
}

impl From<f64> for Payload {
    fn from(x: f64) -> Self {
        Payload::Float(x)
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Payload::Unit
    }
}
