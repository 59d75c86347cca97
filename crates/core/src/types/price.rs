//! Monetary amounts using decimal arithmetic.
//!
//! Prices, order totals and price-at-time values arrive from the hosted API
//! as JSON numbers (or numeric strings). They are kept as [`Decimal`] so that
//! dashboard sums do not accumulate floating point drift; formatting happens
//! only at the edge.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price in the store's single currency (dollars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Amount as a float, for chart payloads.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Multiply by a line quantity, saturating at the representable range.
    #[must_use]
    pub fn times(self, quantity: i64) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Divide evenly, returning zero for a zero divisor.
    #[must_use]
    pub fn average_over(self, count: usize) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        Self(self.0 / Decimal::from(count))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-${:.2}", rounded.abs())
        } else {
            write!(f, "${:.2}", rounded.abs())
        }
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn price(s: &str) -> Price {
        Price::new(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(price("19.9").to_string(), "$19.90");
        assert_eq!(price("0").to_string(), "$0.00");
        assert_eq!(price("3.005").to_string(), "$3.00");
        assert_eq!(price("-4.5").to_string(), "-$4.50");
    }

    #[test]
    fn test_sum_and_times() {
        let total: Price = [price("10.10"), price("0.20")].iter().sum();
        assert_eq!(total, price("10.30"));
        assert_eq!(price("2.50").times(3), price("7.50"));
    }

    #[test]
    fn test_extreme_amounts_saturate() {
        let huge = Price::new(Decimal::MAX);
        assert_eq!(huge.times(i64::MAX), huge);
        assert_eq!(huge.times(-2), Price::new(Decimal::MIN));
        assert_eq!(huge + huge, huge);
        let total: Price = [huge, price("1"), huge].iter().sum();
        assert_eq!(total, huge);
    }

    #[test]
    fn test_average_over_zero_is_zero() {
        assert_eq!(price("10").average_over(0), Price::ZERO);
        assert_eq!(price("10").average_over(4), price("2.5"));
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let from_number: Price = serde_json::from_str("24.99").unwrap();
        let from_string: Price = serde_json::from_str("\"24.99\"").unwrap();
        assert_eq!(from_number, from_string);
    }
}
