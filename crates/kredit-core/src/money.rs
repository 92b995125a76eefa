//! # Money Module
//!
//! Provides the `Money` and `Rate` types for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  A credit ledger that drifts by one unit per sale never reconciles.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units + basis-point rates                  │
//! │    118,000 × 800 bp = 9,440 exactly                                    │
//! │    Rounding happens once per derived amount, half-up                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kredit_core::money::{Money, Rate};
//!
//! let subtotal = Money::from_cents(100_000);
//! let tax = subtotal.apply_rate(Rate::from_bps(1800)); // 18%
//! assert_eq!(tax.cents(), 18_000);
//!
//! let half = (subtotal + tax).percentage(50);
//! assert_eq!(half.cents(), 59_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use ts_rs::TS;

// =============================================================================
// Rounding
// =============================================================================

/// Divides `numerator` by a positive `denominator`, rounding half-up
/// (half away from zero for negative values).
///
/// ## Examples
/// ```text
///  825 / 100  →  8   (8.25 rounds down)
///  850 / 100  →  9   (8.50 rounds up)
/// -850 / 100  → -9
/// ```
fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        -((-numerator + half) / denominator)
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: arithmetic on differences (e.g., available credit) can
///   go negative without wrapping
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No float constructor**: there is no way to build Money from f64
///
/// ## Where Money Flows
/// ```text
/// LineItem.unit_price ──► line subtotal ──► cart subtotal
///                                               │
///                            tax ◄──────────────┤
///                       interest ◄──────────────┤
///                                               ▼
///                              base total ──► due now / deferred
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use kredit_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Applies a basis-point rate and rounds the result half-up.
    ///
    /// Used for both sales tax and credit interest.
    ///
    /// ## Implementation
    /// Integer math in i128: `(amount * bps + 5000) / 10000` for
    /// non-negative amounts. The +5000 is the half-unit.
    ///
    /// ## Example
    /// ```rust
    /// use kredit_core::money::{Money, Rate};
    ///
    /// // 118,000 at 8% = 9,440
    /// let interest = Money::from_cents(118_000).apply_rate(Rate::from_bps(800));
    /// assert_eq!(interest.cents(), 9_440);
    ///
    /// // 10.00 at 8.25% = 0.825 → 0.83
    /// let tax = Money::from_cents(1000).apply_rate(Rate::from_bps(825));
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let scaled = self.0 as i128 * rate.bps() as i128;
        Money::from_cents(div_round_half_up(scaled, 10_000) as i64)
    }

    /// Returns `percent`% of this amount, rounded half-up.
    ///
    /// ## Example
    /// ```rust
    /// use kredit_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(118_000).percentage(50).cents(), 59_000);
    /// assert_eq!(Money::from_cents(1_001).percentage(50).cents(), 501);
    /// ```
    pub fn percentage(&self, percent: u32) -> Money {
        let scaled = self.0 as i128 * percent as i128;
        Money::from_cents(div_round_half_up(scaled, 100) as i64)
    }

    /// Multiplies money by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use kredit_core::money::Money;
    ///
    /// let line = Money::from_cents(299).checked_mul_quantity(3);
    /// assert_eq!(line, Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display without a currency symbol.
///
/// Currency formatting belongs to the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so 1800 bps = 18% and 825 bps = 8.25%.
/// Rates stay integers end to end, like money.
///
/// Used for the sales tax rate and the per-duration credit interest rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(Money::default(), Money::zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Rate::from_bps(825).to_string(), "8.25%");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((b - a).cents(), -500);
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // 18% of 100,000 is exact
        assert_eq!(Money::from_cents(100_000).apply_rate(Rate::from_bps(1800)).cents(), 18_000);

        // 1% of 50 = 0.5 → 1 (half rounds up, not to even)
        assert_eq!(Money::from_cents(50).apply_rate(Rate::from_bps(100)).cents(), 1);

        // 1% of 150 = 1.5 → 2
        assert_eq!(Money::from_cents(150).apply_rate(Rate::from_bps(100)).cents(), 2);

        // 1% of 249 = 2.49 → 2
        assert_eq!(Money::from_cents(249).apply_rate(Rate::from_bps(100)).cents(), 2);
    }

    #[test]
    fn test_apply_rate_negative_is_symmetric() {
        let rate = Rate::from_bps(100);
        assert_eq!(Money::from_cents(-150).apply_rate(rate).cents(), -2);
        assert_eq!(Money::from_cents(-149).apply_rate(rate).cents(), -1);
    }

    #[test]
    fn test_apply_rate_does_not_overflow_on_large_amounts() {
        let big = Money::from_cents(i64::MAX / 2);
        let tax = big.apply_rate(Rate::from_bps(10_000));
        assert_eq!(tax, big);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(Money::from_cents(118_000).percentage(50).cents(), 59_000);
        assert_eq!(Money::from_cents(333).percentage(30).cents(), 100); // 99.9 → 100
        assert_eq!(Money::from_cents(5).percentage(50).cents(), 3); // 2.5 → 3
        assert_eq!(Money::from_cents(1234).percentage(100).cents(), 1234);
        assert_eq!(Money::from_cents(1234).percentage(0).cents(), 0);
    }

    #[test]
    fn test_checked_operations() {
        assert_eq!(
            Money::from_cents(299).checked_mul_quantity(3),
            Some(Money::from_cents(897))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_mul_quantity(2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_rate_constructors() {
        assert_eq!(Rate::from_bps(800).bps(), 800);
        assert_eq!(Rate::default(), Rate::zero());
    }
}
