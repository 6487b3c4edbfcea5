//! Staff-only endpoints under `/admin/`.
//!
//! All of these answer 403 `{"error": "Admin access required"}` for
//! non-staff accounts.

use emporium_core::forms::{CategoryPayload, ProductPayload, UserPayload};
use emporium_core::models::{AdminStats, Category, CompareItem, ListResponse, Order, Product, User, WishlistItem};
use emporium_core::types::{CategoryId, CompareItemId, OrderId, OrderStatus, ProductId, UserId, WishlistItemId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError, MessageResponse};

/// Result of `PUT /admin/products/toggle/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToggleResponse {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    pub available: bool,
    #[serde(default)]
    pub message: String,
}

/// Result of `PUT /admin/orders/update/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub message: String,
    pub order_id: OrderId,
    pub new_status: OrderStatus,
}

#[derive(Serialize)]
struct StatusRequest {
    status: OrderStatus,
}

/// `GET /admin/analytics/dashboard/`: revenue and refund figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalyticsSummary {
    pub total_revenue: Decimal,
    pub net_revenue: Decimal,
    pub total_refunds: Decimal,
    pub today_sales: Decimal,
    pub avg_daily_sales: Decimal,
    pub completed_orders_count: u64,
    pub cancelled_orders: u64,
    pub refund_rate: Decimal,
}

impl ApiClient {
    // =========================================================================
    // Products
    // =========================================================================

    /// Every product, including unavailable ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn admin_products(&self) -> Result<Vec<Product>, ApiError> {
        let list: ListResponse<Product> = self.get("admin/products/").await?;
        Ok(list.into_vec())
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Api`] (400) for an unknown category slug.
    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, ApiError> {
        self.post("admin/products/create/", payload).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, payload), fields(product_id = %id))]
    pub async fn update_product(&self, id: ProductId, payload: &ProductPayload) -> Result<Product, ApiError> {
        self.put(&format!("admin/products/update/{id}/"), payload).await
    }

    /// Flip `available`; the response carries the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn toggle_product(&self, id: ProductId) -> Result<ToggleResponse, ApiError> {
        self.put_empty(&format!("admin/products/toggle/{id}/")).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product is already gone.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("admin/products/delete/{id}/")).await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`ApiError::Api`] (400) when the slug is taken.
    #[instrument(skip(self, payload), fields(slug = %payload.slug))]
    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, ApiError> {
        self.post("admin/categories/create/", payload).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, payload), fields(category_id = %id, slug = %payload.slug))]
    pub async fn update_category(&self, id: CategoryId, payload: &CategoryPayload) -> Result<Category, ApiError> {
        self.put(&format!("admin/categories/update/{id}/"), payload).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("admin/categories/delete/{id}/")).await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn admin_users(&self) -> Result<Vec<User>, ApiError> {
        let list: ListResponse<User> = self.get("admin/users/").await?;
        Ok(list.into_vec())
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Api`] (400) when the username or email exists.
    #[instrument(skip(self, payload), fields(username = %payload.username))]
    pub async fn create_user(&self, payload: &UserPayload) -> Result<User, ApiError> {
        self.post("admin/users/create/", payload).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, payload), fields(user_id = %id))]
    pub async fn update_user(&self, id: UserId, payload: &UserPayload) -> Result<MessageResponse, ApiError> {
        self.put(&format!("admin/users/update/{id}/"), payload).await
    }

    /// Deactivate an account (`is_active = false`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn ban_user(&self, id: UserId) -> Result<MessageResponse, ApiError> {
        self.put_empty(&format!("admin/users/ban/{id}/")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: UserId) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("admin/users/delete/{id}/")).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn admin_orders(&self) -> Result<Vec<Order>, ApiError> {
        let list: ListResponse<Order> = self.get("admin/orders/").await?;
        Ok(list.into_vec())
    }

    /// Set an order's status. The backend accepts any status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<StatusUpdate, ApiError> {
        self.put(&format!("admin/orders/update/{id}/"), &StatusRequest { status })
            .await
    }

    // =========================================================================
    // Wishlists and compares
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn admin_wishlists(&self) -> Result<Vec<WishlistItem>, ApiError> {
        let list: ListResponse<WishlistItem> = self.get("admin/wishlists/").await?;
        Ok(list.into_vec())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(wishlist_id = %id))]
    pub async fn remove_wishlist_item(&self, id: WishlistItemId) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("admin/wishlists/remove/{id}/")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn admin_compares(&self) -> Result<Vec<CompareItem>, ApiError> {
        let list: ListResponse<CompareItem> = self.get("admin/compares/").await?;
        Ok(list.into_vec())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(compare_id = %id))]
    pub async fn remove_compare_item(&self, id: CompareItemId) -> Result<MessageResponse, ApiError> {
        self.delete(&format!("admin/compares/remove/{id}/")).await
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Headline totals for the dashboard stat cards.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.get("admin/analytics/stats/").await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<AnalyticsSummary, ApiError> {
        self.get("admin/analytics/dashboard/").await
    }
}
