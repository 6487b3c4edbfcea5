use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{FormError, parse_decimal};
use crate::models::{Offer, OfferPriority, OfferType};
use crate::types::{CategoryId, OfferId, ProductId};

/// The offer create/edit form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OfferDraft {
    /// Set when editing an existing offer.
    pub editing: Option<OfferId>,
    pub name: String,
    pub code: String,
    pub description: String,
    pub offer_type: OfferType,
    pub discount_percentage: String,
    pub flat_discount: String,
    pub buy_quantity: String,
    pub get_quantity: String,
    pub min_order_value: String,
    pub priority: OfferPriority,
    /// RFC 3339, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DD`, read as UTC.
    pub start_date: String,
    pub end_date: String,
    pub is_active: bool,
    pub auto_apply: bool,
    pub first_time_only: bool,
    pub badge_text: String,
    pub product_ids: Vec<ProductId>,
    pub category_ids: Vec<CategoryId>,
}

/// Body of `POST /admin/offers/create/` and `PUT /admin/offers/update/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferPayload {
    pub name: String,
    pub code: String,
    pub description: String,
    pub offer_type: OfferType,
    pub discount_percentage: Decimal,
    pub flat_discount: Decimal,
    pub buy_quantity: u32,
    pub get_quantity: u32,
    pub min_order_value: Decimal,
    pub priority: OfferPriority,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub auto_apply: bool,
    pub first_time_only: bool,
    pub badge_text: String,
    pub product_ids: Vec<ProductId>,
    pub category_ids: Vec<CategoryId>,
}

impl OfferDraft {
    /// A blank create form. New offers start active.
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_active: true,
            ..Self::default()
        }
    }

    /// Prefill the edit form.
    #[must_use]
    pub fn edit(offer: &Offer) -> Self {
        let date = |d: Option<DateTime<Utc>>| d.map(|d| d.to_rfc3339()).unwrap_or_default();
        Self {
            editing: Some(offer.id),
            name: offer.name.clone(),
            code: offer.code.clone(),
            description: offer.description.clone(),
            offer_type: offer.offer_type,
            discount_percentage: offer.discount_percentage.to_string(),
            flat_discount: offer.flat_discount.to_string(),
            buy_quantity: String::new(),
            get_quantity: String::new(),
            min_order_value: offer.min_order_value.to_string(),
            priority: offer.priority,
            start_date: date(offer.start_date),
            end_date: date(offer.end_date),
            is_active: offer.is_active,
            auto_apply: offer.auto_apply,
            first_time_only: offer.first_time_only,
            badge_text: offer.badge_text.clone(),
            product_ids: offer.products.iter().filter_map(|p| p.id).collect(),
            category_ids: offer.categories.iter().map(|c| c.id).collect(),
        }
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.editing.is_none()
    }

    /// # Errors
    ///
    /// Name and code come first, then both dates and their order, then the
    /// category selection of category offers, then the numeric fields.
    pub fn validate(&self) -> Result<OfferPayload, FormError> {
        let name = self.name.trim();
        let code = self.code.trim();
        if name.is_empty() || code.is_empty() {
            return Err(FormError::OfferNameAndCodeRequired);
        }

        if self.start_date.trim().is_empty() || self.end_date.trim().is_empty() {
            return Err(FormError::OfferDatesRequired);
        }
        let start_date = parse_date("Start date", &self.start_date)?;
        let end_date = parse_date("End date", &self.end_date)?;
        if start_date >= end_date {
            return Err(FormError::OfferEndBeforeStart);
        }

        if self.offer_type == OfferType::CategoryOffer && self.category_ids.is_empty() {
            return Err(FormError::OfferCategoryRequired);
        }

        let discount_percentage =
            parse_decimal("Discount", &self.discount_percentage)?.unwrap_or(Decimal::ZERO);
        if discount_percentage > Decimal::ONE_HUNDRED {
            return Err(FormError::DiscountOutOfRange);
        }

        Ok(OfferPayload {
            name: name.to_owned(),
            code: code.to_uppercase(),
            description: self.description.trim().to_owned(),
            offer_type: self.offer_type,
            discount_percentage,
            flat_discount: parse_decimal("Flat discount", &self.flat_discount)?.unwrap_or(Decimal::ZERO),
            buy_quantity: parse_quantity("Buy quantity", &self.buy_quantity)?,
            get_quantity: parse_quantity("Get quantity", &self.get_quantity)?,
            min_order_value: parse_decimal("Minimum order value", &self.min_order_value)?
                .unwrap_or(Decimal::ZERO),
            priority: self.priority,
            start_date,
            end_date,
            is_active: self.is_active,
            auto_apply: self.auto_apply,
            first_time_only: self.first_time_only,
            badge_text: self.badge_text.trim().to_owned(),
            product_ids: self.product_ids.clone(),
            category_ids: self.category_ids.clone(),
        })
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<DateTime<Utc>, FormError> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| FormError::InvalidDate {
            field,
            value: raw.to_owned(),
        })
}

/// Blank means one.
fn parse_quantity(field: &'static str, raw: &str) -> Result<u32, FormError> {
    match raw.trim() {
        "" => Ok(1),
        raw => raw.parse().map_err(|_| FormError::NotANumber {
            field,
            value: raw.to_owned(),
        }),
    }
}
