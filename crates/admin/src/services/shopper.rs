//! Signed-in shopper lists and account: wishlist, compare, reviews, profile.

use std::fmt;
use std::sync::Arc;

use emporium_core::forms::FormError;
use emporium_core::models::{CompareItem, Review, User, WishlistItem};
use emporium_core::types::ProductId;
use secrecy::ExposeSecret;
use tracing::instrument;

use super::notify::Notifier;
use super::{ServiceError, backend_message, require_session};
use crate::api::{ApiClient, ApiError, NewReview, ProfileUpdate, RegisterRequest};

pub struct ShopperService {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl ShopperService {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// # Errors
    ///
    /// Returns the API error.
    pub async fn wishlist(&self) -> Result<Vec<WishlistItem>, ServiceError> {
        self.api.wishlist().await.map_err(|e| {
            self.notifier.error("Failed to load wishlist");
            e.into()
        })
    }

    /// Add the product at `slug`. A product already on the list is an info
    /// notice, not a failure.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip(self))]
    pub async fn add_to_wishlist(&self, slug: &str) -> Result<(), ServiceError> {
        require_session(&self.api, self.notifier.as_ref(), "Please login to add items to wishlist")?;
        let product = self.api.product_by_slug(slug).await?;

        match self.api.add_to_wishlist(product.id).await {
            Ok(ack) if ack.message.contains("already") => {
                self.notifier.info("Item already in wishlist");
                Ok(())
            }
            Ok(_) => {
                self.notifier.success(&format!("{} added to wishlist!", product.name));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to add to wishlist");
                self.notifier.error("Failed to add to wishlist");
                Err(e.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(&self, product_id: ProductId) -> Result<(), ServiceError> {
        require_session(&self.api, self.notifier.as_ref(), "Please login to manage wishlist")?;
        match self.api.remove_from_wishlist(product_id).await {
            Ok(_) => {
                self.notifier.success("Item removed from wishlist!");
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Failed to remove from wishlist");
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Compare
    // =========================================================================

    /// # Errors
    ///
    /// Returns the API error.
    pub async fn compare_list(&self) -> Result<Vec<CompareItem>, ServiceError> {
        Ok(self.api.compare().await?)
    }

    /// Add a product and return the refreshed list.
    ///
    /// # Errors
    ///
    /// Returns the API error; the backend holds at most four products.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_compare(&self, product_id: ProductId) -> Result<Vec<CompareItem>, ServiceError> {
        require_session(&self.api, self.notifier.as_ref(), "Please login to compare products")?;
        match self.api.add_to_compare(product_id).await {
            Ok(ack) if ack.message.contains("already") => self.notifier.info(&ack.message),
            Ok(ack) if !ack.message.is_empty() => self.notifier.success(&ack.message),
            Ok(_) => self.notifier.success("Product added to compare"),
            Err(e) => {
                self.notifier
                    .error(&backend_message(&e).unwrap_or_else(|| "Failed to add to compare".to_owned()));
                return Err(e.into());
            }
        }
        self.compare_list().await
    }

    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_compare(&self, product_id: ProductId) -> Result<(), ServiceError> {
        self.acknowledge(
            self.api.remove_from_compare(product_id).await,
            "Product removed from compare",
            "Failed to remove from compare",
        )
    }

    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip(self))]
    pub async fn clear_compare(&self) -> Result<(), ServiceError> {
        self.acknowledge(
            self.api.clear_compare().await,
            "Compare list cleared",
            "Failed to clear compare list",
        )
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// # Errors
    ///
    /// Returns the API error.
    pub async fn reviews(&self, product_id: ProductId) -> Result<Vec<Review>, ServiceError> {
        Ok(self.api.product_reviews(product_id).await?)
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::Form`] without a request for a rating outside
    /// 1 to 5, or the API error.
    #[instrument(skip(self, review), fields(product_id = %product_id))]
    pub async fn add_review(&self, product_id: ProductId, review: &NewReview) -> Result<Review, ServiceError> {
        require_session(&self.api, self.notifier.as_ref(), "Please login to add a review")?;
        if !(1..=5).contains(&review.rating) {
            return Err(self.rejected(FormError::RatingOutOfRange));
        }

        match self.api.add_review(product_id, review).await {
            Ok(saved) => {
                self.notifier.success("Review added successfully!");
                Ok(saved)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to add review");
                self.notifier.error("Failed to add review");
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Form`] without a request when the passwords
    /// differ, or the API error with the backend's field errors.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ServiceError> {
        if request.password.expose_secret() != request.password_confirm.expose_secret() {
            return Err(self.rejected(FormError::PasswordMismatch));
        }

        match self.api.register(request).await {
            Ok(user) => {
                self.notifier.success("Registration successful!");
                Ok(user)
            }
            Err(e) => {
                self.notifier
                    .error(&backend_message(&e).unwrap_or_else(|| "Registration failed".to_owned()));
                Err(e.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns the API error.
    pub async fn profile(&self) -> Result<User, ServiceError> {
        self.api.profile().await.map_err(|e| {
            self.notifier.error("Failed to load profile");
            e.into()
        })
    }

    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ServiceError> {
        match self.api.update_profile(update).await {
            Ok(user) => {
                self.notifier.success("Profile updated successfully!");
                Ok(user)
            }
            Err(e) => {
                self.notifier.error("Failed to update profile");
                Err(e.into())
            }
        }
    }

    fn acknowledge<T>(&self, result: Result<T, ApiError>, success: &str, failure: &str) -> Result<(), ServiceError> {
        match result {
            Ok(_) => {
                self.notifier.success(success);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "{failure}");
                self.notifier.error(failure);
                Err(e.into())
            }
        }
    }

    fn rejected(&self, error: FormError) -> ServiceError {
        tracing::debug!(error = %error, "Input rejected");
        self.notifier.error(&error.to_string());
        ServiceError::Form(error)
    }
}

impl fmt::Debug for ShopperService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopperService")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}
