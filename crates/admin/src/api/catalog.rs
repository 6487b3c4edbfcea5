//! Public catalog endpoints.

use emporium_core::models::{Category, ListResponse, Product, Review};
use emporium_core::simulation::HomeRecommendations;
use emporium_core::types::ProductId;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError};

/// Query parameters for `GET /products/`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Comma-separated brand names.
    pub brand: Option<String>,
    pub in_stock: Option<bool>,
    pub sort_by: Option<String>,
    pub limit: Option<u32>,
}

impl ProductParams {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                query.push((key, value));
            }
        };
        push("search", self.search.clone());
        push("category", self.category.clone());
        push("min_price", self.min_price.map(|p| p.to_string()));
        push("max_price", self.max_price.map(|p| p.to_string()));
        push("brand", self.brand.clone());
        push("in_stock", self.in_stock.map(|b| b.to_string()));
        push("sort_by", self.sort_by.clone());
        push("limit", self.limit.map(|l| l.to_string()));
        query
    }
}

/// `POST /products/{id}/reviews/add/`. Posting again replaces the
/// reviewer's earlier review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    pub rating: u8,
    pub comment: String,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, params: &ProductParams) -> Result<Vec<Product>, ApiError> {
        let list: ListResponse<Product> = self.get_with_query("products/", &params.to_query()).await?;
        Ok(list.into_vec())
    }

    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown slug.
    #[instrument(skip(self))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        self.get(&format!("products/{slug}/")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let list: ListResponse<Category> = self.get("categories/").await?;
        Ok(list.into_vec())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, ApiError> {
        let list: ListResponse<Review> = self.get(&format!("products/{product_id}/reviews/")).await?;
        Ok(list.into_vec())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, review), fields(product_id = %product_id, rating = review.rating))]
    pub async fn add_review(&self, product_id: ProductId, review: &NewReview) -> Result<Review, ApiError> {
        self.post(&format!("products/{product_id}/reviews/add/"), review).await
    }

    /// Server-computed home shelves.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. Callers usually fall back to
    /// the simulator; see `services::recommendations`.
    #[instrument(skip(self))]
    pub async fn home_recommendations(&self) -> Result<HomeRecommendations, ApiError> {
        self.get("recommendations/home/").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_params_skip_unset_and_blank() {
        let params = ProductParams {
            search: Some("  ".into()),
            category: Some("smartphones".into()),
            min_price: Some(Decimal::from(1000)),
            in_stock: Some(true),
            ..ProductParams::default()
        };
        assert_eq!(
            params.to_query(),
            vec![
                ("category", "smartphones".to_owned()),
                ("min_price", "1000".to_owned()),
                ("in_stock", "true".to_owned()),
            ]
        );
    }
}
