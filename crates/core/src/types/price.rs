//! Fiat amounts in integer minor-currency units.
//!
//! All catalog prices and order totals are carried as whole cents so that
//! summing line totals never accumulates rounding drift. Conversion to a
//! `Decimal` in major units happens only at the edges (display, rate math).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of decimal places in the minor unit (cents).
pub const MINOR_UNIT_SCALE: u32 = 2;

/// A fiat amount in minor currency units (cents).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    pub const ZERO: Self = Self(0);

    /// Create an amount from a count of minor units.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the underlying count of minor units.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Multiply by a line quantity, failing on overflow.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }

    /// Add another amount, failing on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// The amount as a decimal in major units (1050 -> 10.50).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }
}

impl std::fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_mul() {
        assert_eq!(
            MinorUnits::new(1000).checked_mul(2),
            Some(MinorUnits::new(2000))
        );
        assert_eq!(MinorUnits::new(i64::MAX).checked_mul(2), None);
    }

    #[test]
    fn test_checked_add() {
        assert_eq!(
            MinorUnits::new(1).checked_add(MinorUnits::new(2)),
            Some(MinorUnits::new(3))
        );
        assert_eq!(
            MinorUnits::new(i64::MAX).checked_add(MinorUnits::new(1)),
            None
        );
    }

    #[test]
    fn test_to_decimal_is_two_places() {
        assert_eq!(MinorUnits::new(1050).to_decimal().to_string(), "10.50");
        assert_eq!(MinorUnits::new(5).to_decimal().to_string(), "0.05");
    }

    #[test]
    fn test_display() {
        assert_eq!(MinorUnits::new(2000).to_string(), "20.00");
    }
}
