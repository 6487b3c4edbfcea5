//! Promotions: the shopper's apply/remove flow and the admin offer desk.

use chrono::{DateTime, Utc};
use emporium_core::forms::OfferPayload;
use emporium_core::models::{ListResponse, Offer, ProductSummary};
use emporium_core::types::OfferId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError, MessageResponse};

/// Which offer to apply: picked from a list, or typed in as a code.
///
/// Serializes as the whole request body, `{"offer_id": 3}` or
/// `{"offer_code": "FEST10"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OfferSelector {
    #[serde(rename = "offer_id")]
    Id(OfferId),
    #[serde(rename = "offer_code")]
    Code(String),
}

#[derive(Serialize)]
struct RemoveRequest {
    offer_id: OfferId,
}

#[derive(Serialize)]
struct ActiveUpdate {
    is_active: bool,
}

/// Result of `POST /offers/apply/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApplyOfferResponse {
    pub success: bool,
    pub message: String,
    pub offer_name: String,
    pub discount_amount: Decimal,
    /// Set when auto-apply offers came along with this one.
    pub multiple_offers_applied: Option<u32>,
    /// Name of the manual offer this one replaced.
    pub replaced_offer: Option<String>,
}

/// `GET /offers/check-combo-eligibility/{id}/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComboEligibility {
    pub eligible: bool,
    pub missing_products: Vec<ProductSummary>,
}

/// An order that redeemed an offer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OfferRedemption {
    pub order_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: String,
}

/// `GET /admin/offers/usage-stats/{id}/`: a recount of an offer's redemptions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OfferUsage {
    pub offer_id: OfferId,
    #[serde(default)]
    pub offer_name: String,
    /// Stored count before the recount.
    #[serde(default)]
    pub old_count: u64,
    #[serde(default)]
    pub used_count: u64,
    #[serde(default)]
    pub matching_orders: Vec<OfferRedemption>,
    #[serde(default)]
    pub total_orders_checked: u64,
}

impl ApiClient {
    // =========================================================================
    // Shopper
    // =========================================================================

    /// Offers currently open to shoppers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn active_offers(&self) -> Result<Vec<Offer>, ApiError> {
        let list: ListResponse<Offer> = self.get("offers/active/").await?;
        Ok(list.into_vec())
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Api`] (400) when the cart is empty, the offer is
    /// inactive or expired, already applied, or the order minimum is not met.
    /// The error body carries `code` and `min_order_value` where relevant.
    #[instrument(skip(self))]
    pub async fn apply_offer(&self, selector: &OfferSelector) -> Result<ApplyOfferResponse, ApiError> {
        self.post("offers/apply/", selector).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Api`] (400) for auto-apply offers.
    #[instrument(skip(self), fields(offer_id = %offer_id))]
    pub async fn remove_offer(&self, offer_id: OfferId) -> Result<MessageResponse, ApiError> {
        self.post("offers/remove/", &RemoveRequest { offer_id }).await
    }

    /// Whether the cart holds every product of a combo offer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(offer_id = %offer_id))]
    pub async fn combo_eligibility(&self, offer_id: OfferId) -> Result<ComboEligibility, ApiError> {
        self.get(&format!("offers/check-combo-eligibility/{offer_id}/"))
            .await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Every offer, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn admin_offers(&self) -> Result<Vec<Offer>, ApiError> {
        let list: ListResponse<Offer> = self.get("admin/offers/").await?;
        Ok(list.into_vec())
    }

    /// The backend uppercases the code.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] (400) when the code is taken.
    #[instrument(skip(self, payload), fields(code = %payload.code))]
    pub async fn create_offer(&self, payload: &OfferPayload) -> Result<Offer, ApiError> {
        self.post("admin/offers/create/", payload).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, payload), fields(offer_id = %id))]
    pub async fn update_offer(&self, id: OfferId, payload: &OfferPayload) -> Result<Offer, ApiError> {
        self.put(&format!("admin/offers/update/{id}/"), payload).await
    }

    /// Partial update of the active flag only.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn set_offer_active(&self, id: OfferId, is_active: bool) -> Result<Offer, ApiError> {
        self.put(&format!("admin/offers/update/{id}/"), &ActiveUpdate { is_active })
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn delete_offer(&self, id: OfferId) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("admin/offers/delete/{id}/")).await
    }

    /// Deactivate an offer and pull it out of every active cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn revoke_offer(&self, id: OfferId) -> Result<MessageResponse, ApiError> {
        self.post_empty(&format!("admin/offers/revoke/{id}/")).await
    }

    /// Recount an offer's redemptions from order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn offer_usage(&self, id: OfferId) -> Result<OfferUsage, ApiError> {
        self.get(&format!("admin/offers/usage-stats/{id}/")).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_serializes_as_single_key() {
        let by_id = serde_json::to_value(OfferSelector::Id(OfferId::new(3))).unwrap();
        assert_eq!(by_id, serde_json::json!({"offer_id": 3}));

        let by_code = serde_json::to_value(OfferSelector::Code("FEST10".into())).unwrap();
        assert_eq!(by_code, serde_json::json!({"offer_code": "FEST10"}));
    }

    #[test]
    fn test_usage_decodes_with_missing_fields() {
        let usage: OfferUsage = serde_json::from_str(
            r#"{"offer_id":2,"used_count":3,"matching_orders":[
                {"order_id":"ORD-0001","created_at":"2025-03-01T10:00:00Z","user":"asha"}]}"#,
        )
        .unwrap();
        assert_eq!(usage.old_count, 0);
        assert_eq!(usage.matching_orders[0].user, "asha");
    }
}
