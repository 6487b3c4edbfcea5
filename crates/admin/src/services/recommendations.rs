//! Recommendation shelves: the backend when it answers, the simulator when
//! it doesn't.

use chrono::{DateTime, Utc};
use emporium_core::models::Product;
use emporium_core::simulation::{AbVariant, HomeRecommendations, Recommendation, RecommendationSimulator};
use tracing::instrument;

use super::ServiceError;
use super::history::HistoryService;
use crate::api::{ApiClient, ProductParams};

/// Products the home page loads alongside its shelves.
pub const HOME_PRODUCT_LIMIT: u32 = 8;

/// Where a set of shelves came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
    Api,
    /// Seeded shuffle over the fetched products.
    Simulated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub shelves: HomeRecommendations,
    pub source: RecommendationSource,
}

#[derive(Clone)]
pub struct RecommendationService {
    api: ApiClient,
    history: HistoryService,
}

impl RecommendationService {
    #[must_use]
    pub const fn new(api: ApiClient, history: HistoryService) -> Self {
        Self { api, history }
    }

    /// The four home shelves.
    ///
    /// Any error from `recommendations/home/` switches to the simulator,
    /// seeded from `now`. With no products the simulated shelves are empty.
    ///
    /// # Errors
    ///
    /// Returns an error only if the fallback product fetch fails.
    #[instrument(skip(self, now))]
    pub async fn home(&self, now: DateTime<Utc>) -> Result<Recommendations, ServiceError> {
        match self.api.home_recommendations().await {
            Ok(shelves) => Ok(Recommendations {
                shelves,
                source: RecommendationSource::Api,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Recommendation endpoint failed, using simulated shelves");
                let products = self.home_products().await?;
                Ok(Recommendations {
                    shelves: RecommendationSimulator::at(now).home(&products),
                    source: RecommendationSource::Simulated,
                })
            }
        }
    }

    /// Products similar to the one at `slug`.
    ///
    /// # Errors
    ///
    /// Returns an error if the product or the catalog cannot be fetched.
    #[instrument(skip(self, now))]
    pub async fn similar(&self, slug: &str, now: DateTime<Utc>) -> Result<Vec<Recommendation>, ServiceError> {
        let current = self.api.product_by_slug(slug).await?;
        let products = self.catalog(current.category_slug()).await?;
        let id = current.id;
        Ok(RecommendationSimulator::at(now).similar(&with_product(products, current), id))
    }

    /// Products this client has not interacted with yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or the interaction log cannot be read.
    #[instrument(skip(self, now))]
    pub async fn personalized(&self, now: DateTime<Utc>) -> Result<Vec<Recommendation>, ServiceError> {
        let seen = self.history.interactions()?.seen_products();
        let products = self.catalog(None).await?;
        Ok(RecommendationSimulator::at(now).personalized(&products, &seen))
    }

    /// The best-picks shelf as `variant` orders it.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    #[instrument(skip(self, now))]
    pub async fn ab_test(&self, variant: AbVariant, now: DateTime<Utc>) -> Result<Vec<Recommendation>, ServiceError> {
        let products = self.home_products().await?;
        Ok(RecommendationSimulator::at(now).ab_test(&products, variant))
    }

    async fn home_products(&self) -> Result<Vec<Product>, ServiceError> {
        let params = ProductParams {
            limit: Some(HOME_PRODUCT_LIMIT),
            ..ProductParams::default()
        };
        Ok(self.api.products(&params).await?)
    }

    async fn catalog(&self, category: Option<&str>) -> Result<Vec<Product>, ServiceError> {
        let params = ProductParams {
            category: category.map(str::to_owned),
            ..ProductParams::default()
        };
        Ok(self.api.products(&params).await?)
    }
}

impl std::fmt::Debug for RecommendationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationService")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

/// Ensure `current` is in the list the simulator searches.
fn with_product(mut products: Vec<Product>, current: Product) -> Vec<Product> {
    if !products.iter().any(|p| p.id == current.id) {
        products.push(current);
    }
    products
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::types::ProductId;

    use super::*;

    fn product(id: i64) -> Product {
        serde_json::from_value(serde_json::json!({"id": id, "name": format!("P{id}"), "price": "10.00"})).unwrap()
    }

    #[test]
    fn test_with_product_adds_missing_once() {
        let list = with_product(vec![product(1), product(2)], product(3));
        assert_eq!(list.len(), 3);
        let list = with_product(list, product(2));
        assert_eq!(list.len(), 3);
        assert!(list.iter().any(|p| p.id == ProductId::new(3)));
    }
}
