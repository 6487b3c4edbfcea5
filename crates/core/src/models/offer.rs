use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Category, ProductSummary, default_true, nullable};
use crate::types::{OfferId, format_currency};

/// How an offer computes its discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    /// Percentage off.
    #[default]
    Discount,
    /// Fixed amount off.
    Flat,
    CategoryOffer,
    FirstTime,
    /// Every product in a set must be in the cart.
    Combo,
    #[serde(other)]
    Other,
}

impl OfferType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discount => "discount",
            Self::Flat => "flat",
            Self::CategoryOffer => "category_offer",
            Self::FirstTime => "first_time",
            Self::Combo => "combo",
            Self::Other => "other",
        }
    }

    /// Label for the admin table.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Discount => "Percentage Discount",
            Self::Flat => "Flat Discount",
            Self::CategoryOffer => "Category Offer",
            Self::FirstTime => "First Time Offer",
            Self::Combo | Self::Other => "Special Offer",
        }
    }
}

impl fmt::Display for OfferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "discount" => Ok(Self::Discount),
            "flat" => Ok(Self::Flat),
            "category_offer" | "category" => Ok(Self::CategoryOffer),
            "first_time" => Ok(Self::FirstTime),
            "combo" => Ok(Self::Combo),
            other => Err(format!("unknown offer type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for OfferPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// How often an offer has been redeemed, as the admin usage filter buckets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageBucket {
    Unused,
    /// 1 to 10 uses.
    Low,
    /// More than 10 uses.
    High,
}

/// A promotion as `/admin/offers/` and `/offers/active/` return it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub code: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default)]
    pub offer_type: OfferType,
    #[serde(default, deserialize_with = "nullable")]
    pub discount_percentage: Decimal,
    #[serde(default, deserialize_with = "nullable")]
    pub flat_discount: Decimal,
    #[serde(default, deserialize_with = "nullable")]
    pub min_order_value: Decimal,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub used_count: u64,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default)]
    pub first_time_only: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub priority: OfferPriority,
    #[serde(default, deserialize_with = "nullable")]
    pub badge_text: String,
    #[serde(default, deserialize_with = "nullable")]
    pub categories: Vec<Category>,
    #[serde(default, deserialize_with = "nullable")]
    pub products: Vec<ProductSummary>,
}

impl Offer {
    /// Active and inside its date window. Missing dates do not restrict.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date.is_none_or(|start| start <= now) && !self.is_expired_at(now)
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| end < now)
    }

    #[must_use]
    pub const fn usage_bucket(&self) -> UsageBucket {
        match self.used_count {
            0 => UsageBucket::Unused,
            1..=10 => UsageBucket::Low,
            _ => UsageBucket::High,
        }
    }

    /// Short description of the discount for listings.
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.badge_text.is_empty() {
            return self.badge_text.clone();
        }
        match self.offer_type {
            OfferType::Flat => format!("{} off", format_currency(self.flat_discount)),
            _ if !self.discount_percentage.is_zero() => {
                format!("{}% off", self.discount_percentage.normalize())
            }
            other => other.label().to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn offer(json: &str) -> Offer {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_decodes_admin_row() {
        let o = offer(
            r#"{"id":3,"name":"Festive","code":"FEST10","offer_type":"discount",
                "discount_percentage":"10.00","flat_discount":"0.00","min_order_value":"500.00",
                "max_discount":null,"used_count":4,"start_date":"2025-01-01T00:00:00Z",
                "end_date":"2025-12-31T23:59:59Z","is_active":true,"priority":"high",
                "badge_text":null,"categories":[{"id":1,"name":"Cables","slug":"cables"}]}"#,
        );
        assert_eq!(o.offer_type, OfferType::Discount);
        assert_eq!(o.priority, OfferPriority::High);
        assert_eq!(o.min_order_value, Decimal::from(500));
        assert_eq!(o.usage_bucket(), UsageBucket::Low);
        assert_eq!(o.categories[0].slug, "cables");
        assert_eq!(o.summary(), "10% off");
    }

    #[test]
    fn test_unknown_type_is_other() {
        let o = offer(r#"{"id":1,"name":"Mystery","offer_type":"buy_x_get_y"}"#);
        assert_eq!(o.offer_type, OfferType::Other);
        assert_eq!(o.offer_type.label(), "Special Offer");
        assert!(o.is_active);
    }

    #[test]
    fn test_validity_window() {
        let o = offer(
            r#"{"id":1,"name":"Spring","start_date":"2025-03-01T00:00:00Z",
                "end_date":"2025-03-31T00:00:00Z","is_active":true}"#,
        );
        let inside = Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2025, 2, 2, 0, 0, 0).unwrap();
        assert!(o.is_valid_at(inside));
        assert!(!o.is_valid_at(before));
        assert!(o.is_expired_at(after));
        assert!(!o.is_valid_at(after));
    }

    #[test]
    fn test_usage_buckets() {
        let mut o = offer(r#"{"id":1,"name":"A"}"#);
        assert_eq!(o.usage_bucket(), UsageBucket::Unused);
        o.used_count = 10;
        assert_eq!(o.usage_bucket(), UsageBucket::Low);
        o.used_count = 11;
        assert_eq!(o.usage_bucket(), UsageBucket::High);
    }
}
