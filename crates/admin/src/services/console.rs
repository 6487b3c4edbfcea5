//! Admin CRUD over the dashboard lists.
//!
//! [`AdminConsole`] owns the last loaded [`DashboardView`] and keeps it in
//! step with the server:
//!
//! - Drafts are validated before anything is sent; a rejected draft is
//!   reported through the notifier and makes no request.
//! - Creates and updates refetch the owning list afterwards.
//! - Deletes ask [`Confirm`] first and drop the row locally on success.
//! - Product availability and order status are applied locally first and
//!   rolled back if the server refuses.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use emporium_core::forms::{CategoryDraft, FormError, ProductDraft, UserDraft};
use emporium_core::models::{Category, CompareItem, Product};
use emporium_core::types::{
    CategoryId, CompareItemId, OrderId, OrderStatus, ProductId, TransitionPolicy, UserId, WishlistItemId,
};
use tracing::instrument;

use super::{ServiceError, backend_message};
use super::confirm::Confirm;
use super::dashboard::{DashboardAggregator, DashboardError, DashboardView};
use super::notify::Notifier;
use super::optimistic::apply_then_reconcile;
use crate::api::{AnalyticsSummary, ApiClient, ApiError, StatusUpdate};

pub struct AdminConsole {
    api: ApiClient,
    aggregator: DashboardAggregator,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
    policy: TransitionPolicy,
    view: DashboardView,
}

impl AdminConsole {
    #[must_use]
    pub fn new(
        api: ApiClient,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            aggregator: DashboardAggregator::new(api.clone(), Arc::clone(&notifier)),
            api,
            notifier,
            confirm,
            policy,
            view: DashboardView::default(),
        }
    }

    #[must_use]
    pub const fn view(&self) -> &DashboardView {
        &self.view
    }

    /// Reload every list.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::AllSourcesFailed`] when nothing loaded; the
    /// previous view is kept in that case.
    pub async fn refresh(&mut self) -> Result<&DashboardView, DashboardError> {
        self.view = self.aggregator.load().await?;
        Ok(&self.view)
    }

    /// [`Self::refresh`], abandoned when `cancel` completes.
    ///
    /// # Errors
    ///
    /// As [`Self::refresh`], plus [`DashboardError::Cancelled`].
    pub async fn refresh_until<C>(&mut self, cancel: C) -> Result<&DashboardView, DashboardError>
    where
        C: Future<Output = ()>,
    {
        self.view = self.aggregator.load_until(cancel).await?;
        Ok(&self.view)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Create (`editing == None`) or update a product, then refetch products.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Form`] without a request for an invalid draft,
    /// or the API error if the save fails.
    #[instrument(skip(self, draft), fields(product_id = ?editing))]
    pub async fn save_product(&mut self, editing: Option<ProductId>, draft: &ProductDraft) -> Result<Product, ServiceError> {
        let payload = self.validated(draft.validate())?;

        let result = match editing {
            Some(id) => self.api.update_product(id, &payload).await,
            None => self.api.create_product(&payload).await,
        };
        let product = match result {
            Ok(product) => product,
            Err(e) => return Err(self.failed(e, "Failed to save product")),
        };

        tracing::info!(product_id = %product.id, "Product saved");
        self.notifier.success(if editing.is_some() {
            "Product updated successfully"
        } else {
            "Product created successfully"
        });
        self.refetch_products().await;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::NotConfirmed`] (no request) when declined.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&mut self, id: ProductId) -> Result<(), ServiceError> {
        self.confirmed("Are you sure you want to delete this product?")?;

        if let Err(e) = self.api.delete_product(id).await {
            tracing::error!(error = %e, "Failed to delete product");
            self.notifier.error("Failed to delete product");
            return Err(e.into());
        }

        self.view.products.retain(|p| p.id != id);
        self.notifier.success("Product deleted successfully");
        Ok(())
    }

    /// Flip availability locally, confirm with the server, roll back on
    /// failure. Returns the new availability.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] if the product is not loaded, or
    /// the API error after restoring the previous value.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn toggle_product(&mut self, id: ProductId) -> Result<bool, ServiceError> {
        let api = &self.api;
        let product = self
            .view
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))?;
        let target = !product.available;

        let result =
            apply_then_reconcile(&mut *product, |p| p.available = target, || api.toggle_product(id)).await;

        match result {
            Ok(response) => {
                product.available = response.available;
                let message = if response.message.is_empty() {
                    format!(
                        "Product {} successfully",
                        if response.available { "activated" } else { "deactivated" }
                    )
                } else {
                    response.message
                };
                self.notifier.success(&message);
                let available = response.available;
                self.refetch_products().await;
                Ok(available)
            }
            Err(e) => {
                tracing::error!(error = %e, "Status update failed, reverted");
                self.notifier.error("Failed to update product status");
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`ServiceError::Form`] without a request for a blank name,
    /// or the API error (e.g. slug already taken).
    #[instrument(skip(self, draft), fields(category_id = ?draft.editing))]
    pub async fn save_category(&mut self, draft: &CategoryDraft) -> Result<Category, ServiceError> {
        let payload = self.validated(draft.validate())?;

        let (result, failure, success) = match draft.editing {
            Some(id) => (
                self.api.update_category(id, &payload).await,
                "Failed to update category",
                "Category updated successfully",
            ),
            None => (
                self.api.create_category(&payload).await,
                "Failed to create category",
                "Category created successfully",
            ),
        };
        let category = match result {
            Ok(category) => category,
            Err(e) => return Err(self.failed(e, failure)),
        };

        self.notifier.success(success);
        self.refetch_categories().await;
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::NotConfirmed`] (no request) when declined.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&mut self, id: CategoryId) -> Result<(), ServiceError> {
        self.confirmed("Are you sure you want to delete this category?")?;

        if let Err(e) = self.api.delete_category(id).await {
            tracing::error!(error = %e, "Failed to delete category");
            self.notifier.error("Failed to delete category");
            return Err(e.into());
        }

        self.view.categories.retain(|c| c.id != id);
        self.notifier.success("Category deleted successfully");
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Create or update an account, then refetch users.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Form`] without a request for an invalid
    /// draft, or the API error (e.g. username already exists).
    #[instrument(skip(self, draft), fields(user_id = ?draft.editing))]
    pub async fn save_user(&mut self, draft: &UserDraft) -> Result<(), ServiceError> {
        let payload = self.validated(draft.validate())?;

        let result = match draft.editing {
            Some(id) => self.api.update_user(id, &payload).await.map(drop),
            None => self.api.create_user(&payload).await.map(drop),
        };
        if let Err(e) = result {
            return Err(self.failed(e, "Failed to save user"));
        }

        self.notifier.success(if draft.is_new() {
            "User created successfully"
        } else {
            "User updated successfully"
        });
        self.refetch_users().await;
        Ok(())
    }

    /// Deactivate an account. The local row is marked inactive once the
    /// server confirms.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotConfirmed`] (no request) when declined.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn ban_user(&mut self, id: UserId) -> Result<(), ServiceError> {
        self.confirmed("Are you sure you want to ban this user?")?;

        if let Err(e) = self.api.ban_user(id).await {
            tracing::error!(error = %e, "Failed to ban user");
            self.notifier.error("Failed to ban user");
            return Err(e.into());
        }

        if let Some(user) = self.view.users.iter_mut().find(|u| u.id == id) {
            user.is_active = false;
        }
        self.notifier.success("User banned successfully");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::NotConfirmed`] (no request) when declined.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_user(&mut self, id: UserId) -> Result<(), ServiceError> {
        self.confirmed("Are you sure you want to delete this user? This action cannot be undone.")?;

        if let Err(e) = self.api.delete_user(id).await {
            tracing::error!(error = %e, "Failed to delete user");
            self.notifier.error("Failed to delete user");
            return Err(e.into());
        }

        self.view.users.retain(|u| u.id != id);
        self.notifier.success("User deleted successfully");
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Set an order's status optimistically.
    ///
    /// Under [`TransitionPolicy::Strict`] an out-of-flow move is refused
    /// before any request; under `Permissive` it is logged and sent.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] if the order is not loaded,
    /// [`ServiceError::InvalidTransition`] under the strict policy, or the API
    /// error after restoring the previous status.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<StatusUpdate, ServiceError> {
        let api = &self.api;
        let order = self
            .view
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("order {id}")))?;
        let from = order.status;

        if !self.policy.allows(from, status) {
            let error = ServiceError::InvalidTransition { from, to: status };
            self.notifier.error(&error.to_string());
            return Err(error);
        }
        if !from.can_transition_to(status) {
            tracing::warn!(%from, to = %status, "Order status change outside the usual flow");
        }

        let result = apply_then_reconcile(
            &mut order.status,
            |s| *s = status,
            || api.update_order_status(id, status),
        )
        .await;

        match result {
            Ok(update) => {
                self.notifier.success(&format!("Order {status} successfully"));
                Ok(update)
            }
            Err(e) => {
                tracing::error!(error = %e, "Order update failed, reverted");
                self.notifier
                    .error(&backend_message(&e).unwrap_or_else(|| "Failed to update order status".to_owned()));
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Wishlists
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`ServiceError::NotConfirmed`] (no request) when declined.
    #[instrument(skip(self), fields(wishlist_id = %id))]
    pub async fn remove_wishlist_item(&mut self, id: WishlistItemId) -> Result<(), ServiceError> {
        self.confirmed("Are you sure you want to remove this wishlist item?")?;

        if let Err(e) = self.api.remove_wishlist_item(id).await {
            tracing::error!(error = %e, "Remove wishlist error");
            self.notifier.error("Failed to remove wishlist item");
            return Err(e.into());
        }

        self.view.wishlists.retain(|w| w.id != id);
        self.notifier.success("Wishlist item removed successfully");
        Ok(())
    }

    // =========================================================================
    // Compare lists
    // =========================================================================

    /// Every shopper's compare entries. Not part of the dashboard load.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn compares(&self) -> Result<Vec<CompareItem>, ServiceError> {
        Ok(self.api.admin_compares().await?)
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::NotConfirmed`] (no request) when declined.
    #[instrument(skip(self), fields(compare_id = %id))]
    pub async fn remove_compare_item(&self, id: CompareItemId) -> Result<(), ServiceError> {
        self.confirmed("Are you sure you want to remove this compare item?")?;

        if let Err(e) = self.api.remove_compare_item(id).await {
            tracing::error!(error = %e, "Remove compare item error");
            self.notifier.error("Failed to remove compare item");
            return Err(e.into());
        }
        self.notifier.success("Compare item removed successfully");
        Ok(())
    }

    /// Revenue and refund figures for the analytics panel.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn analytics(&self) -> Result<AnalyticsSummary, ServiceError> {
        self.api.dashboard_stats().await.map_err(|e| {
            tracing::error!(error = %e, "Analytics load failed");
            self.notifier.error("Failed to load analytics");
            e.into()
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn validated<T>(&self, result: Result<T, FormError>) -> Result<T, ServiceError> {
        result.map_err(|e| {
            tracing::debug!(error = %e, "Draft rejected");
            self.notifier.error(&e.to_string());
            ServiceError::Form(e)
        })
    }

    fn confirmed(&self, prompt: &str) -> Result<(), ServiceError> {
        if self.confirm.confirm(prompt) {
            Ok(())
        } else {
            tracing::debug!(prompt, "Not confirmed");
            Err(ServiceError::NotConfirmed(prompt.to_owned()))
        }
    }

    /// Report a failed save with the backend's message when it sent one.
    fn failed(&self, error: ApiError, fallback: &str) -> ServiceError {
        tracing::error!(error = %error, "{fallback}");
        self.notifier
            .error(&backend_message(&error).unwrap_or_else(|| fallback.to_owned()));
        error.into()
    }

    async fn refetch_products(&mut self) {
        match self.api.admin_products().await {
            Ok(products) => self.view.products = products,
            Err(e) => tracing::warn!(error = %e, "Could not refetch products"),
        }
    }

    async fn refetch_categories(&mut self) {
        match self.api.categories().await {
            Ok(categories) => self.view.categories = categories,
            Err(e) => tracing::warn!(error = %e, "Could not refetch categories"),
        }
    }

    async fn refetch_users(&mut self) {
        match self.api.admin_users().await {
            Ok(users) => self.view.users = users,
            Err(e) => tracing::warn!(error = %e, "Could not refetch users"),
        }
    }
}

impl fmt::Debug for AdminConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConsole")
            .field("api", &self.api)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
