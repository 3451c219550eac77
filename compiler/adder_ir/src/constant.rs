//! Constant values produced by the literal-decoding subsystem.

use num_bigint::BigInt;
use std::fmt;

/// A decoded constant.
///
/// Exactly one variant is active; text and bytes are never implicitly
/// coerced into each other. `Int` holds values that fit a machine word,
/// `BigInt` holds the overflow path of integer decoding.
#[derive(Clone, PartialEq)]
pub enum ConstantValue {
    None,
    Ellipsis,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Float(f64),
    Complex { real: f64, imag: f64 },
    Str(String),
    Bytes(Vec<u8>),
}

impl ConstantValue {
    /// True for a textual constant that decoded to the empty string.
    ///
    /// Interpolated-string assembly drops these fragments.
    #[inline]
    pub fn is_empty_str(&self) -> bool {
        matches!(self, ConstantValue::Str(s) if s.is_empty())
    }

    #[inline]
    pub fn is_bytes(&self) -> bool {
        matches!(self, ConstantValue::Bytes(_))
    }

    /// Short classification used by diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstantValue::None => "None",
            ConstantValue::Ellipsis => "ellipsis",
            ConstantValue::Bool(true) => "True",
            ConstantValue::Bool(false) => "False",
            ConstantValue::Int(_) | ConstantValue::BigInt(_) => "literal",
            ConstantValue::Float(_) | ConstantValue::Complex { .. } => "literal",
            ConstantValue::Str(_) => "literal",
            ConstantValue::Bytes(_) => "literal",
        }
    }
}

impl fmt::Debug for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::None => write!(f, "None"),
            ConstantValue::Ellipsis => write!(f, "Ellipsis"),
            ConstantValue::Bool(b) => write!(f, "{b:?}"),
            ConstantValue::Int(i) => write!(f, "{i}"),
            ConstantValue::BigInt(i) => write!(f, "{i}"),
            ConstantValue::Float(x) => write!(f, "{x}"),
            ConstantValue::Complex { real, imag } => write!(f, "({real}+{imag}j)"),
            ConstantValue::Str(s) => write!(f, "{s:?}"),
            ConstantValue::Bytes(b) => write!(f, "b{b:?}"),
        }
    }
}
