//! Boolean operators used to combine two shapes cell by cell.

use crate::error::{Error, Result};

/// One of the sixteen binary boolean functions.
///
/// The discriminant is the truth table: bit `(a << 1) | b` holds `op(a, b)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BooleanOp {
    False = 0b0000,
    NotOr = 0b0001,
    OnlySecond = 0b0010,
    NotFirst = 0b0011,
    OnlyFirst = 0b0100,
    NotSecond = 0b0101,
    NotSame = 0b0110,
    NotAnd = 0b0111,
    And = 0b1000,
    Same = 0b1001,
    Second = 0b1010,
    Causes = 0b1011,
    First = 0b1100,
    CausedBy = 0b1101,
    Or = 0b1110,
    True = 0b1111,
}

impl BooleanOp {
    /// Every operator, ordered by truth table.
    pub const ALL: [Self; 16] = [
        Self::False,
        Self::NotOr,
        Self::OnlySecond,
        Self::NotFirst,
        Self::OnlyFirst,
        Self::NotSecond,
        Self::NotSame,
        Self::NotAnd,
        Self::And,
        Self::Same,
        Self::Second,
        Self::Causes,
        Self::First,
        Self::CausedBy,
        Self::Or,
        Self::True,
    ];

    /// Evaluate the operator.
    #[inline]
    pub const fn apply(self, first: bool, second: bool) -> bool {
        let bit = ((first as u8) << 1) | second as u8;
        (self as u8 >> bit) & 1 != 0
    }

    /// Whether cells covered only by the first operand survive.
    #[inline]
    pub const fn keeps_first_only(self) -> bool {
        self.apply(true, false)
    }

    /// Whether cells covered only by the second operand survive.
    #[inline]
    pub const fn keeps_second_only(self) -> bool {
        self.apply(false, true)
    }

    /// Returns true if the operator fills space covered by neither operand.
    #[inline]
    pub const fn is_unbounded(self) -> bool {
        self.apply(false, false)
    }

    /// Reject operators that fill empty space.
    pub fn ensure_bounded(self) -> Result<Self> {
        if self.is_unbounded() {
            Err(Error::UnboundedOperator(self))
        } else {
            Ok(self)
        }
    }
}
