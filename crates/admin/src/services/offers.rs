//! Offers on both sides of the counter.
//!
//! [`OfferService`] applies and removes offers on the signed-in shopper's
//! cart. [`OfferDesk`] is the admin table: filtered listing, create/edit,
//! active toggle, delete, revoke and usage recounts.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use emporium_core::forms::OfferDraft;
use emporium_core::models::Offer;
use emporium_core::query::{ListState, OfferQuery, Page};
use emporium_core::types::OfferId;
use rust_decimal::Decimal;
use tokio::task::JoinSet;
use tracing::instrument;

use super::confirm::Confirm;
use super::{ServiceError, backend_message, require_session};
use super::notify::Notifier;
use super::optimistic::apply_then_reconcile;
use crate::api::{ApiClient, ApiError, ApplyOfferResponse, ComboEligibility, OfferSelector, OfferUsage};

const ALREADY_APPLIED: &str = "OFFER_ALREADY_APPLIED";
const MINIMUM_NOT_MET: &str = "MINIMUM_ORDER_NOT_MET";

/// Applies offers to the signed-in shopper's cart.
pub struct OfferService {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl OfferService {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn active(&self) -> Result<Vec<Offer>, ServiceError> {
        Ok(self.api.active_offers().await?)
    }

    /// Apply an offer by id or code.
    ///
    /// Signed-out shoppers are turned away without a request.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::OfferAlreadyApplied`] or
    /// [`ServiceError::MinimumOrderNotMet`] for those rejections, or the API
    /// error otherwise.
    #[instrument(skip(self))]
    pub async fn apply(&self, selector: &OfferSelector) -> Result<ApplyOfferResponse, ServiceError> {
        require_session(&self.api, self.notifier.as_ref(), "Please login to apply offers")?;

        match self.api.apply_offer(selector).await {
            Ok(response) => {
                if let Some(count) = response.multiple_offers_applied {
                    self.notifier
                        .success(&format!("{count} offers applied successfully!"));
                } else if let Some(replaced) = &response.replaced_offer {
                    self.notifier.info(&format!(
                        "Previous offer \"{replaced}\" was replaced with \"{}\"",
                        response.offer_name
                    ));
                } else if response.message.is_empty() {
                    self.notifier.success("Offer applied successfully!");
                } else {
                    self.notifier.success(&response.message);
                }
                Ok(response)
            }
            Err(e) => Err(self.rejected(e)),
        }
    }

    /// # Errors
    ///
    /// Returns the API error; auto-apply offers cannot be removed.
    #[instrument(skip(self), fields(offer_id = %offer_id))]
    pub async fn remove(&self, offer_id: OfferId) -> Result<(), ServiceError> {
        require_session(&self.api, self.notifier.as_ref(), "Please login to manage offers")?;

        match self.api.remove_offer(offer_id).await {
            Ok(_) => {
                self.notifier.success("Offer removed successfully");
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .error(&backend_message(&e).unwrap_or_else(|| "Failed to remove offer".to_owned()));
                Err(e.into())
            }
        }
    }

    /// Whether the cart holds everything a combo offer needs.
    ///
    /// A failed check reads as not eligible.
    pub async fn combo_eligibility(&self, offer_id: OfferId) -> ComboEligibility {
        match self.api.combo_eligibility(offer_id).await {
            Ok(eligibility) => eligibility,
            Err(e) => {
                tracing::warn!(offer_id = %offer_id, error = %e, "Combo eligibility check failed");
                ComboEligibility::default()
            }
        }
    }

    fn rejected(&self, error: ApiError) -> ServiceError {
        let code = error.body_field("code").and_then(|c| c.as_str());
        let message = backend_message(&error);

        if code == Some(ALREADY_APPLIED) || message.as_deref().is_some_and(|m| m.contains("already applied")) {
            let e = ServiceError::OfferAlreadyApplied;
            self.notifier.warning(&e.to_string());
            return e;
        }
        if code == Some(MINIMUM_NOT_MET) {
            let min_order_value = error
                .body_field("min_order_value")
                .and_then(decimal_field)
                .unwrap_or(Decimal::ZERO);
            let e = ServiceError::MinimumOrderNotMet { min_order_value };
            self.notifier.error(&e.to_string());
            return e;
        }

        tracing::warn!(error = %error, "Offer not applied");
        self.notifier
            .error(&message.unwrap_or_else(|| "Failed to apply offer".to_owned()));
        error.into()
    }
}

impl fmt::Debug for OfferService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfferService")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

/// The admin offer table.
pub struct OfferDesk {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
    offers: Vec<Offer>,
    list: ListState<OfferQuery>,
}

impl OfferDesk {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>, confirm: Arc<dyn Confirm>, page_size: NonZeroUsize) -> Self {
        Self {
            api,
            notifier,
            confirm,
            offers: Vec::new(),
            list: ListState::new(OfferQuery::default(), page_size),
        }
    }

    #[must_use]
    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    #[must_use]
    pub const fn list(&self) -> &ListState<OfferQuery> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListState<OfferQuery> {
        &mut self.list
    }

    /// The current page under the current filters.
    #[must_use]
    pub fn page(&self) -> Page<Offer> {
        self.list.apply(&self.offers)
    }

    /// # Errors
    ///
    /// Returns the API error; the previous rows are kept.
    pub async fn load(&mut self) -> Result<&[Offer], ServiceError> {
        match self.api.admin_offers().await {
            Ok(offers) => {
                tracing::debug!(count = offers.len(), "Offers loaded");
                self.offers = offers;
                Ok(&self.offers)
            }
            Err(e) => {
                self.notifier.error("Failed to load offers");
                Err(e.into())
            }
        }
    }

    /// Create or update an offer, then reload the table.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Form`] without a request for an invalid draft,
    /// or the API error.
    #[instrument(skip(self, draft), fields(offer_id = ?draft.editing))]
    pub async fn save(&mut self, draft: &OfferDraft) -> Result<Offer, ServiceError> {
        let payload = draft.validate().map_err(|e| {
            tracing::debug!(error = %e, "Offer draft rejected");
            self.notifier.error(&e.to_string());
            ServiceError::Form(e)
        })?;

        let result = match draft.editing {
            Some(id) => self.api.update_offer(id, &payload).await,
            None => self.api.create_offer(&payload).await,
        };
        let offer = match result {
            Ok(offer) => offer,
            Err(e) => {
                tracing::error!(error = %e, "Failed to save offer");
                self.notifier
                    .error(&backend_message(&e).unwrap_or_else(|| "Failed to save offer".to_owned()));
                return Err(e.into());
            }
        };

        self.notifier.success(if draft.is_new() {
            "Offer created successfully"
        } else {
            "Offer updated successfully"
        });
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Could not refetch offers");
        }
        Ok(offer)
    }

    /// Flip the active flag locally, then confirm with the server.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an unloaded id, or the API
    /// error after restoring the flag.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn toggle(&mut self, id: OfferId) -> Result<bool, ServiceError> {
        let api = &self.api;
        let offer = self
            .offers
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("offer {id}")))?;
        let target = !offer.is_active;

        let result =
            apply_then_reconcile(&mut offer.is_active, |a| *a = target, || api.set_offer_active(id, target)).await;

        match result {
            Ok(updated) => {
                offer.is_active = updated.is_active;
                self.notifier.success(if updated.is_active {
                    "Offer activated successfully"
                } else {
                    "Offer deactivated successfully"
                });
                Ok(updated.is_active)
            }
            Err(e) => {
                tracing::error!(error = %e, "Offer status update failed, reverted");
                self.notifier.error("Failed to update offer status");
                Err(e.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::NotConfirmed`] (no request) when declined.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn delete(&mut self, id: OfferId) -> Result<(), ServiceError> {
        self.confirmed("Are you sure you want to delete this offer?")?;

        if let Err(e) = self.api.delete_offer(id).await {
            tracing::error!(error = %e, "Failed to delete offer");
            self.notifier.error("Failed to delete offer");
            return Err(e.into());
        }

        self.offers.retain(|o| o.id != id);
        self.notifier.success("Offer deleted successfully");
        Ok(())
    }

    /// Deactivate an offer and pull it from every cart. The row stays,
    /// marked inactive.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotConfirmed`] (no request) when declined.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn revoke(&mut self, id: OfferId) -> Result<(), ServiceError> {
        self.confirmed(
            "Are you sure you want to revoke this offer? This will deactivate it and remove it from all active carts.",
        )?;

        match self.api.revoke_offer(id).await {
            Ok(ack) => {
                if let Some(offer) = self.offers.iter_mut().find(|o| o.id == id) {
                    offer.is_active = false;
                }
                self.notifier.success(if ack.message.is_empty() {
                    "Offer revoked successfully"
                } else {
                    ack.message.as_str()
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to revoke offer");
                self.notifier.error("Failed to revoke offer");
                Err(e.into())
            }
        }
    }

    /// Recount one offer and store the new count on its row.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn refresh_usage(&mut self, id: OfferId) -> Result<OfferUsage, ServiceError> {
        let usage = self.api.offer_usage(id).await?;
        self.record_usage(&usage);
        Ok(usage)
    }

    /// Recount every loaded offer concurrently.
    ///
    /// Offers whose recount fails keep their old count. Returns how many
    /// were updated.
    #[instrument(skip(self))]
    pub async fn refresh_all_usage(&mut self) -> usize {
        let mut tasks = JoinSet::new();
        for offer in &self.offers {
            let api = self.api.clone();
            let id = offer.id;
            tasks.spawn(async move { api.offer_usage(id).await });
        }

        let mut updated = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(usage)) => {
                    self.record_usage(&usage);
                    updated += 1;
                }
                Ok(Err(e)) => tracing::warn!(error = %e, "Usage recount failed"),
                Err(e) => tracing::error!(error = %e, "Usage recount task panicked"),
            }
        }

        if updated == self.offers.len() {
            self.notifier.success("Usage statistics refreshed successfully!");
        } else {
            self.notifier.warning(&format!(
                "Usage statistics refreshed for {updated} of {} offers",
                self.offers.len()
            ));
        }
        updated
    }

    fn record_usage(&mut self, usage: &OfferUsage) {
        if let Some(offer) = self.offers.iter_mut().find(|o| o.id == usage.offer_id) {
            if offer.used_count != usage.used_count {
                tracing::info!(
                    offer_id = %usage.offer_id,
                    old = offer.used_count,
                    new = usage.used_count,
                    "Offer usage corrected"
                );
            }
            offer.used_count = usage.used_count;
        }
    }

    fn confirmed(&self, prompt: &str) -> Result<(), ServiceError> {
        if self.confirm.confirm(prompt) {
            Ok(())
        } else {
            tracing::debug!(prompt, "Not confirmed");
            Err(ServiceError::NotConfirmed(prompt.to_owned()))
        }
    }
}

impl fmt::Debug for OfferDesk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfferDesk")
            .field("offers", &self.offers.len())
            .field("criteria", self.list.criteria())
            .finish_non_exhaustive()
    }
}

/// Money fields arrive as strings or numbers.
fn decimal_field(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_field_accepts_string_or_number() {
        assert_eq!(decimal_field(&serde_json::json!("5000.00")), Some(Decimal::from(5000)));
        assert_eq!(decimal_field(&serde_json::json!(750)), Some(Decimal::from(750)));
        assert_eq!(decimal_field(&serde_json::json!(null)), None);
    }

    #[test]
    fn test_minimum_order_message() {
        let e = ServiceError::MinimumOrderNotMet {
            min_order_value: Decimal::from(5000),
        };
        assert_eq!(e.to_string(), "Minimum order value of ₹5000 required");
    }
}
