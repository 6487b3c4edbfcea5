//! Price arithmetic and formatting.
//!
//! Prices travel as decimal strings and stay [`Decimal`] end to end; nothing
//! here goes through floating point. The storefront sells in rupees.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currency symbol used by [`format_currency`].
pub const CURRENCY_SYMBOL: &str = "\u{20b9}";

/// Apply a percentage discount: `price - price * pct / 100`.
///
/// A zero or negative percentage leaves the price unchanged.
#[must_use]
pub fn discounted_price(price: Decimal, discount_percentage: Decimal) -> Decimal {
    if discount_percentage <= Decimal::ZERO {
        return price;
    }
    price - price * discount_percentage / Decimal::ONE_HUNDRED
}

/// Two decimal places, half away from zero (`"1299.50"`).
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Whole currency units with the rupee sign (`"₹1300"`).
#[must_use]
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{CURRENCY_SYMBOL}{}", rounded.trunc())
}

/// What a product card shows: the selling price, the struck-through
/// original, and whether a discount badge applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPrice {
    pub current: Decimal,
    pub original: Decimal,
    pub has_discount: bool,
    /// Zero unless `has_discount`.
    pub discount_percentage: Decimal,
}

impl DisplayPrice {
    /// The original price falls back to the selling price when the product
    /// has no `actual_price`. A discount is only shown when the percentage
    /// is positive and the original is actually higher.
    #[must_use]
    pub fn new(price: Decimal, actual_price: Option<Decimal>, discount_percentage: Decimal) -> Self {
        let original = actual_price.filter(|p| !p.is_zero()).unwrap_or(price);
        let has_discount = discount_percentage > Decimal::ZERO && original > price;
        Self {
            current: price,
            original,
            has_discount,
            discount_percentage: if has_discount {
                discount_percentage
            } else {
                Decimal::ZERO
            },
        }
    }

    /// Amount saved against the original price.
    #[must_use]
    pub fn savings(&self) -> Decimal {
        if self.has_discount {
            self.original - self.current
        } else {
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_discounted_price() {
        assert_eq!(discounted_price(d("1000"), d("15")), d("850"));
        assert_eq!(discounted_price(d("999.99"), d("0")), d("999.99"));
        assert_eq!(discounted_price(d("200"), d("-5")), d("200"));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(d("12")), "12.00");
        assert_eq!(format_price(d("12.345")), "12.35");
        assert_eq!(format_price(d("0")), "0.00");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(d("1299.5")), "\u{20b9}1300");
        assert_eq!(format_currency(d("49.49")), "\u{20b9}49");
    }

    #[test]
    fn test_display_price_with_discount() {
        let p = DisplayPrice::new(d("800"), Some(d("1000")), d("20"));
        assert!(p.has_discount);
        assert_eq!(p.original, d("1000"));
        assert_eq!(p.savings(), d("200"));
    }

    #[test]
    fn test_display_price_without_actual_price() {
        let p = DisplayPrice::new(d("800"), None, d("20"));
        assert!(!p.has_discount);
        assert_eq!(p.original, d("800"));
        assert_eq!(p.discount_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_display_price_ignores_inverted_original() {
        let p = DisplayPrice::new(d("800"), Some(d("700")), d("10"));
        assert!(!p.has_discount);
    }
}
