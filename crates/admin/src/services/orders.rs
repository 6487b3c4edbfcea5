//! The shopper's side of orders: checkout, history, tracking, cancellation.

use std::fmt;
use std::sync::Arc;

use emporium_core::models::Order;
use emporium_core::types::{OrderId, format_price};
use tracing::instrument;

use super::confirm::Confirm;
use super::notify::Notifier;
use super::{ServiceError, backend_message, require_session};
use crate::api::{ApiClient, CancelResponse, CheckoutRequest};

const CANCEL_PROMPT: &str = "Are you sure you want to cancel this order? You will receive 70% refund.";

/// Holds the signed-in shopper's order history.
pub struct OrderService {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
    orders: Vec<Order>,
}

impl OrderService {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            api,
            notifier,
            confirm,
            orders: Vec::new(),
        }
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Turn the cart into an order.
    ///
    /// # Errors
    ///
    /// Returns the API error ("Cart is empty!" for an empty cart).
    #[instrument(skip(self, request))]
    pub async fn checkout(&mut self, request: &CheckoutRequest) -> Result<Order, ServiceError> {
        require_session(&self.api, self.notifier.as_ref(), "Please login to checkout")?;

        match self.api.checkout(request).await {
            Ok(order) => {
                self.notifier
                    .success(&format!("Order {} placed successfully!", order.order_id));
                Ok(order)
            }
            Err(e) => {
                tracing::error!(error = %e, "Checkout failed");
                self.notifier
                    .error(&backend_message(&e).unwrap_or_else(|| "Order creation failed".to_owned()));
                Err(e.into())
            }
        }
    }

    /// Reload the order history, newest first as the backend sends it.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous history is kept.
    pub async fn refresh(&mut self) -> Result<&[Order], ServiceError> {
        self.orders = self.api.order_history().await?;
        Ok(&self.orders)
    }

    /// Look an order up by its `ORD-...` reference.
    ///
    /// # Errors
    ///
    /// Returns [`crate::api::ApiError::NotFound`] for an unknown reference.
    #[instrument(skip(self))]
    pub async fn track(&self, order_ref: &str) -> Result<Order, ServiceError> {
        let order_ref = order_ref.trim();
        match self.api.order_detail(order_ref).await {
            Ok(order) => Ok(order),
            Err(e) => {
                tracing::info!(order_ref, error = %e, "Order lookup failed");
                self.notifier.error("Order not found");
                Err(e.into())
            }
        }
    }

    /// Cancel an order from the loaded history.
    ///
    /// Orders past confirmation are refused locally; nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`], [`ServiceError::NotCancellable`]
    /// or [`ServiceError::NotConfirmed`] without a request, or the API error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel(&mut self, id: OrderId) -> Result<CancelResponse, ServiceError> {
        let status = self
            .orders
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.status)
            .ok_or_else(|| ServiceError::NotFound(format!("order {id}")))?;
        if !status.is_cancellable() {
            let e = ServiceError::NotCancellable(status);
            self.notifier.error(&e.to_string());
            return Err(e);
        }
        if !self.confirm.confirm(CANCEL_PROMPT) {
            return Err(ServiceError::NotConfirmed(CANCEL_PROMPT.to_owned()));
        }

        let response = match self.api.cancel_order(id).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Failed to cancel order");
                self.notifier.error("Failed to cancel order. Please try again.");
                return Err(e.into());
            }
        };

        let refund = response.refund_amount.map(format_price).unwrap_or_default();
        self.notifier.success(&format!(
            "Order cancelled successfully! Refund of ₹{refund} will be processed within 3-5 business days."
        ));
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Could not refetch orders");
        }
        Ok(response)
    }
}

impl fmt::Debug for OrderService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderService")
            .field("orders", &self.orders.len())
            .finish_non_exhaustive()
    }
}
