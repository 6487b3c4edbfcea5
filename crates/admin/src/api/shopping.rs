//! Signed-in shopper endpoints: cart, wishlist, compare, checkout, orders.

use emporium_core::models::{Cart, CompareItem, ListResponse, Order, WishlistItem};
use emporium_core::types::{CartItemId, OrderId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError, MessageResponse};

/// `POST /checkout/`. The backend fills defaults for anything left out.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
}

/// `POST /orders/{id}/cancel/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CancelResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub refund_amount: Option<Decimal>,
}

#[derive(Serialize)]
struct QuantityUpdate {
    quantity: u32,
}

impl ApiClient {
    // =========================================================================
    // Cart
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn cart(&self) -> Result<Cart, ApiError> {
        self.get("cart/").await
    }

    /// Add one unit; adding a product already in the cart bumps its quantity.
    ///
    /// # Errors
    ///
    /// The backend answers 400 for unavailable or out-of-stock products.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: ProductId) -> Result<MessageResponse, ApiError> {
        self.post_empty(&format!("cart/add/{product_id}/")).await
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_cart_item(&self, item_id: CartItemId, quantity: u32) -> Result<MessageResponse, ApiError> {
        self.put(&format!("cart/update/{item_id}/"), &QuantityUpdate { quantity })
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_cart_item(&self, item_id: CartItemId) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("cart/remove/{item_id}/")).await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn wishlist(&self) -> Result<Vec<WishlistItem>, ApiError> {
        let list: ListResponse<WishlistItem> = self.get("wishlist/").await?;
        Ok(list.into_vec())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(&self, product_id: ProductId) -> Result<MessageResponse, ApiError> {
        self.post_empty(&format!("wishlist/add/{product_id}/")).await
    }

    /// Removal is keyed by product, not by wishlist row.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(&self, product_id: ProductId) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("wishlist/remove/{product_id}/")).await
    }

    // =========================================================================
    // Compare
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn compare(&self) -> Result<Vec<CompareItem>, ApiError> {
        let list: ListResponse<CompareItem> = self.get("compare/").await?;
        Ok(list.into_vec())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_compare(&self, product_id: ProductId) -> Result<MessageResponse, ApiError> {
        self.post_empty(&format!("compare/add/{product_id}/")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_compare(&self, product_id: ProductId) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("compare/remove/{product_id}/")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_compare(&self) -> Result<MessageResponse, ApiError> {
        self.delete("compare/clear/").await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Turn the cart into an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] with "Cart is empty!" when there is nothing
    /// to check out.
    #[instrument(skip(self, request))]
    pub async fn checkout(&self, request: &CheckoutRequest) -> Result<Order, ApiError> {
        let order: Order = self.post("checkout/", request).await?;
        tracing::info!(order_id = %order.order_id, amount = %order.amount(), "Order placed");
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn order_history(&self) -> Result<Vec<Order>, ApiError> {
        let list: ListResponse<Order> = self.get("orders/").await?;
        Ok(list.into_vec())
    }

    /// Look up an order by its `ORD-...` reference.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown reference.
    #[instrument(skip(self))]
    pub async fn order_detail(&self, order_ref: &str) -> Result<Order, ApiError> {
        self.get(&format!("orders/{order_ref}/")).await
    }

    /// Cancel a pending or confirmed order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] when the order is past cancellation.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<CancelResponse, ApiError> {
        self.post_empty(&format!("orders/{order_id}/cancel/")).await
    }
}
