//! Elementwise binary operators applied in place by a backend.

use std::fmt;

/// An in-place elementwise binary operator.
///
/// Grouped arrays dispatch every variant through the same rule: pairwise
/// against another array of equal group count, or against a scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `a += b`
    Add,
    /// `a -= b`
    Sub,
    /// `a *= b`
    Mul,
    /// `a /= b` (true division)
    Div,
    /// `a %= b` (result takes the sign of the divisor)
    Rem,
    /// `a &= b`
    BitAnd,
    /// `a ^= b`
    BitXor,
    /// `a |= b`
    BitOr,
}

impl BinaryOp {
    /// All operators, in declaration order.
    pub const ALL: [BinaryOp; 8] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Rem,
        Self::BitAnd,
        Self::BitXor,
        Self::BitOr,
    ];

    /// Operator symbol in compound-assignment form.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Rem => "%=",
            Self::BitAnd => "&=",
            Self::BitXor => "^=",
            Self::BitOr => "|=",
        }
    }

    /// Whether this is one of the bitwise operators.
    pub fn is_bitwise(self) -> bool {
        matches!(self, Self::BitAnd | Self::BitXor | Self::BitOr)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
