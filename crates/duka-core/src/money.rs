//! # Money Module
//!
//! Provides the `Money`, `Quantity` and `Percent` types used by every
//! calculation in Duka.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Integer cents don't fit either: sugar sold by weight                   │
//! │    1.25 kg × 33.33 = 41.6625  → cents would round every line           │
//! │                                                                         │
//! │  OUR SOLUTION: exact base-10 decimals, rounded ONLY for display         │
//! │    Σ line totals == subtotal, exactly, no matter how many lines         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use duka_core::money::{Money, Percent, Quantity};
//!
//! let price = Money::from(100);
//! let line = price * Quantity::from(2);
//! assert_eq!(line, Money::from(200));
//!
//! let tax = Percent::from(16).of(line);
//! assert_eq!(tax, Money::from(32));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

/// Decimal places used when rounding for display.
pub const DISPLAY_DECIMALS: u32 = 2;

/// A negative value given where only non-negative ones are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("must not be negative, got {0}")]
pub struct NegativeValue(pub Decimal);

// =============================================================================
// Money Type
// =============================================================================

/// A currency amount.
///
/// ## Design Decisions
/// - **Signed**: profit may be negative (selling below cost is allowed)
/// - **Never rounded in arithmetic**: rounding happens at render time only,
///   so aggregations over thousands of sales don't compound rounding error
/// - **Serialized as a decimal string**: no float drift over JSON
/// - **Saturating**: arithmetic pins at the decimal range instead of
///   panicking, so a runaway figure typed into a form stays harmless
///
/// ## Where Money is Used
/// ```text
/// SaleItem.unit_price ──► line_total ──► subtotal ──► tax/discount ──► total
///                                                                      │
///                                           Currency::format() ◄───────┘
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// The underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns `self`, or zero when negative.
    ///
    /// ## Example
    /// ```rust
    /// use duka_core::money::Money;
    ///
    /// assert_eq!(Money::from(-5).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::from(5).clamp_non_negative(), Money::from(5));
    /// ```
    #[inline]
    pub fn clamp_non_negative(self) -> Self {
        self.max(Money::zero())
    }

    /// Rounds to `dp` decimal places using Bankers Rounding.
    ///
    /// ## Bankers Rounding
    /// Half-way values go to the nearest even digit (2.345 → 2.34,
    /// 2.355 → 2.36) so that rounding many displayed figures carries no
    /// systematic bias.
    ///
    /// Display only: never feed the result back into a calculation.
    pub fn round_for_display(&self, dp: u32) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven),
        )
    }
}

/// Display shows the amount rounded to two places, no currency symbol.
///
/// ## Note
/// This is for logs and debugging. Use `locale::Currency::format` for
/// anything a customer sees.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.round_for_display(DISPLAY_DECIMALS).0;
        rounded.rescale(DISPLAY_DECIMALS);
        write!(f, "{}", rounded)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl From<i32> for Money {
    fn from(amount: i32) -> Self {
        Money(Decimal::from(amount))
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

/// Multiplication by a quantity (line totals, per-line profit).
impl Mul<Quantity> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: Quantity) -> Self {
        Money(self.0.saturating_mul(qty.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// A non-negative quantity. Fractional values are allowed (weight-based
/// goods sold by the kilo, fabric by the metre).
///
/// Deserializing goes through [`Quantity::new`], so negative input is
/// rejected at the boundary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(try_from = "Decimal")]
pub struct Quantity(#[ts(type = "string")] Decimal);

impl Quantity {
    /// Creates a quantity, rejecting negative values.
    pub fn new(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            None
        } else {
            Some(Quantity(value))
        }
    }

    /// Creates a quantity, mapping negative values to zero.
    pub fn coerce(value: Decimal) -> Self {
        Quantity::new(value).unwrap_or_default()
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(Decimal::ZERO)
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Negative input coerces to zero.
impl From<i32> for Quantity {
    fn from(value: i32) -> Self {
        Quantity::coerce(Decimal::from(value))
    }
}

/// Negative input coerces to zero.
impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Quantity::coerce(Decimal::from(value))
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = NegativeValue;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Quantity::new(value).ok_or(NegativeValue(value))
    }
}

impl Mul<Money> for Quantity {
    type Output = Money;

    #[inline]
    fn mul(self, price: Money) -> Money {
        price * self
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), Add::add)
    }
}

// =============================================================================
// Percent
// =============================================================================

/// A non-negative percentage: `16` means 16%.
///
/// Used for tax rates and percentage discounts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(try_from = "Decimal")]
pub struct Percent(#[ts(type = "string")] Decimal);

impl Percent {
    /// Creates a percentage, rejecting negative values.
    pub fn new(value: Decimal) -> Option<Self> {
        Quantity::new(value).map(|q| Percent(q.0))
    }

    /// Creates a percentage, mapping negative values to zero.
    pub fn coerce(value: Decimal) -> Self {
        Percent::new(value).unwrap_or_default()
    }

    #[inline]
    pub const fn zero() -> Self {
        Percent(Decimal::ZERO)
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Applies the percentage to an amount: `amount × p / 100`.
    ///
    /// ## Example
    /// ```rust
    /// use duka_core::money::{Money, Percent};
    ///
    /// assert_eq!(Percent::from(16).of(Money::from(250)), Money::from(40));
    /// ```
    pub fn of(&self, amount: Money) -> Money {
        Money(amount.0.saturating_mul(self.0) / Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = NegativeValue;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Percent::new(value).ok_or(NegativeValue(value))
    }
}

/// Negative input coerces to zero.
impl From<i32> for Percent {
    fn from(value: i32) -> Self {
        Percent::coerce(Decimal::from(value))
    }
}

/// Negative input coerces to zero.
impl From<i64> for Percent {
    fn from(value: i64) -> Self {
        Percent::coerce(Decimal::from(value))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_rounds_and_pads() {
        assert_eq!(Money::from(250).to_string(), "250.00");
        assert_eq!(Money::new(dec!(10.999)).to_string(), "11.00");
        assert_eq!(Money::new(dec!(-5.5)).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_bankers_rounding_for_display() {
        assert_eq!(
            Money::new(dec!(2.345)).round_for_display(2),
            Money::new(dec!(2.34))
        );
        assert_eq!(
            Money::new(dec!(2.355)).round_for_display(2),
            Money::new(dec!(2.36))
        );
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from(1000);
        let b = Money::from(500);

        assert_eq!(a + b, Money::from(1500));
        assert_eq!(a - b, Money::from(500));
        assert_eq!(b - a, Money::from(-500));
        assert_eq!(a * Quantity::from(3), Money::from(3000));
    }

    #[test]
    fn test_fractional_quantity_is_not_rounded() {
        let line = Money::new(dec!(33.33)) * Quantity::new(dec!(1.25)).unwrap();
        assert_eq!(line.amount(), dec!(41.6625));
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from(1), Money::from(2), Money::from(3)]
            .iter()
            .sum();
        assert_eq!(total, Money::from(6));

        let empty: Money = Vec::<Money>::new().into_iter().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_quantity_rejects_negative() {
        assert!(Quantity::new(dec!(-1)).is_none());
        assert_eq!(Quantity::new(dec!(0)), Some(Quantity::zero()));
        assert_eq!(Quantity::from(-3), Quantity::zero());
        assert_eq!(Quantity::new(dec!(2.5)).unwrap().to_string(), "2.5");
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(Percent::from(16).of(Money::from(250)), Money::from(40));
        assert_eq!(
            Percent::new(dec!(8.25)).unwrap().of(Money::from(1000)),
            Money::new(dec!(82.5))
        );
        assert!(Percent::from(-4).is_zero());
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(" 12.50 ".parse::<Money>().unwrap(), Money::new(dec!(12.5)));
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::new(dec!(12.50))).unwrap();
        assert_eq!(json, "\"12.50\"");
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        let qty: Quantity = serde_json::from_str("\"2.5\"").unwrap();
        assert_eq!(qty, Quantity::new(dec!(2.5)).unwrap());

        assert!(serde_json::from_str::<Quantity>("\"-2\"").is_err());
        assert!(serde_json::from_str::<Percent>("\"-16\"").is_err());
        assert_eq!(
            serde_json::from_str::<Percent>("\"16\"").unwrap(),
            Percent::from(16)
        );
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::new(Decimal::MAX);
        let qty = Quantity::new(Decimal::MAX).unwrap();

        assert_eq!(huge * qty, huge);
        assert_eq!(huge + Money::from(1), huge);
        assert_eq!(Money::new(Decimal::MIN) - Money::from(1), Money::new(Decimal::MIN));
        assert_eq!([huge, huge].iter().sum::<Money>(), huge);
        assert!(Percent::from(16).of(huge).is_positive());
    }
}
