//! Vietnamese dong amounts and their display format.
//!
//! The shop only sells in VND. Amounts arrive from the backend as JSON numbers
//! or numeric strings and are kept as [`Decimal`] so discounts do not pick up
//! binary floating point noise. Display follows the `vi-VN` locale: whole dong,
//! `.` as the thousands separator and a trailing `₫`.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of Vietnamese dong.
///
/// Arithmetic never panics: a sum or product that leaves the `Decimal` range
/// becomes [`Money::OUT_OF_RANGE`], which displays as `N/A`.
///
/// ```
/// use hearth_core::Money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(Money::new(Decimal::from(1_250_000)).to_string(), "1.250.000 ₫");
/// assert_eq!((Money::new(Decimal::MAX) * 2).to_string(), "N/A");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Option<Decimal>);

impl Money {
    /// Zero dong.
    pub const ZERO: Self = Self(Some(Decimal::ZERO));

    /// Result of arithmetic that overflowed.
    pub const OUT_OF_RANGE: Self = Self(None);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(Some(amount))
    }

    /// The raw amount, `None` once arithmetic has overflowed.
    #[must_use]
    pub const fn amount(&self) -> Option<Decimal> {
        self.0
    }

    #[must_use]
    pub const fn is_out_of_range(&self) -> bool {
        self.0.is_none()
    }

    /// Render an optional amount, using `fallback` when it is absent.
    ///
    /// The product table shows `N/A` for unparseable prices while the order
    /// table shows `0 ₫`, so the fallback is chosen by the caller.
    #[must_use]
    pub fn display_or(amount: Option<Decimal>, fallback: &str) -> String {
        amount.map_or_else(|| fallback.to_string(), |a| Self::new(a).to_string())
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.zip(rhs.0).and_then(|(a, b)| a.checked_add(b)))
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0.and_then(|a| a.checked_mul(Decimal::from(rhs))))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(amount) = self.0 else {
            return f.write_str("N/A");
        };
        let whole = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let digits = whole.abs().trunc().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        if whole.is_sign_negative() && !whole.is_zero() {
            write!(f, "-{grouped} ₫")
        } else {
            write!(f, "{grouped} ₫")
        }
    }
}

/// Unit price after a percentage discount: `price * (1 - percent / 100)`.
///
/// `None` when the result does not fit a `Decimal`.
#[must_use]
pub fn discounted_price(price: Decimal, discount_percent: Decimal) -> Option<Decimal> {
    let factor = Decimal::ONE.checked_sub(discount_percent.checked_div(Decimal::ONE_HUNDRED)?)?;
    price.checked_mul(factor)
}
