//! Shopping cart with availability checks before adding.

use std::sync::Arc;

use emporium_core::models::{Cart, Product};
use emporium_core::types::CartItemId;
use tracing::instrument;

use super::ServiceError;
use super::notify::Notifier;
use crate::api::{ApiClient, ApiError};

/// Holds the last fetched cart and keeps it in sync after each change.
pub struct CartService {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    cart: Cart,
}

impl CartService {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            cart: Cart::default(),
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Total units in the cart, for the header badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched.
    pub async fn refresh(&mut self) -> Result<&Cart, ServiceError> {
        self.cart = self.api.cart().await?;
        Ok(&self.cart)
    }

    /// Add one unit of the product at `slug`.
    ///
    /// The product is fetched first; unavailable or out-of-stock products
    /// are refused without calling the cart endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unavailable`] or [`ServiceError::OutOfStock`]
    /// for refused products, or the API error otherwise.
    #[instrument(skip(self))]
    pub async fn add(&mut self, slug: &str) -> Result<&Cart, ServiceError> {
        let product = self.api.product_by_slug(slug).await?;
        if let Err(e) = check_addable(&product) {
            tracing::info!(product_id = %product.id, reason = %e, "Product not added to cart");
            self.notifier.error(&e.to_string());
            return Err(e);
        }

        match self.api.add_to_cart(product.id).await {
            Ok(ack) => {
                let message = if ack.message.is_empty() {
                    format!("{} added to cart", product.name)
                } else {
                    ack.message
                };
                self.notifier.success(&message);
            }
            Err(e) => {
                self.notifier.error(&failure_message(&e, "Failed to add to cart"));
                return Err(e.into());
            }
        }
        self.refresh().await
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns the API error if the update or the refetch fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update(&mut self, item_id: CartItemId, quantity: u32) -> Result<&Cart, ServiceError> {
        if let Err(e) = self.api.update_cart_item(item_id, quantity).await {
            self.notifier.error(&failure_message(&e, "Failed to update cart"));
            return Err(e.into());
        }
        self.refresh().await
    }

    /// # Errors
    ///
    /// Returns the API error if the removal or the refetch fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove(&mut self, item_id: CartItemId) -> Result<&Cart, ServiceError> {
        if let Err(e) = self.api.remove_cart_item(item_id).await {
            self.notifier.error(&failure_message(&e, "Failed to remove item"));
            return Err(e.into());
        }
        self.notifier.success("Item removed from cart");
        self.refresh().await
    }
}

impl std::fmt::Debug for CartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService")
            .field("items", &self.cart.items.len())
            .finish_non_exhaustive()
    }
}

/// Refuse products the backend would reject anyway.
fn check_addable(product: &Product) -> Result<(), ServiceError> {
    if !product.available {
        return Err(ServiceError::Unavailable);
    }
    if !product.in_stock() {
        return Err(ServiceError::OutOfStock);
    }
    Ok(())
}

fn failure_message(error: &ApiError, fallback: &str) -> String {
    match error {
        ApiError::Api { message, .. } if !message.is_empty() => message.clone(),
        _ => fallback.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(stock: i64, available: bool) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": 7, "name": "Charger", "price": "25.00", "stock": stock, "available": available
        }))
        .unwrap()
    }

    #[test]
    fn test_check_addable() {
        assert!(check_addable(&product(3, true)).is_ok());
        assert!(matches!(check_addable(&product(3, false)), Err(ServiceError::Unavailable)));
        assert!(matches!(check_addable(&product(0, true)), Err(ServiceError::OutOfStock)));
        // unavailable wins over stock
        assert!(matches!(check_addable(&product(0, false)), Err(ServiceError::Unavailable)));
    }

    #[test]
    fn test_failure_message_prefers_backend_text() {
        let api = ApiError::Api {
            status: 400,
            message: "Only 2 left".to_owned(),
            body: None,
        };
        assert_eq!(failure_message(&api, "Failed"), "Only 2 left");
        assert_eq!(failure_message(&ApiError::Unauthorized, "Failed"), "Failed");
    }
}
