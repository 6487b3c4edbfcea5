use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{SeedBucket, shuffle_with_seed};
use crate::models::Product;

/// A product plus whatever score fields a shelf attaches to it.
///
/// The same shape comes back from `/recommendations/home/`, so this type is
/// also what the live endpoint deserializes into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_orders: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_score: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
}

impl Recommendation {
    #[must_use]
    pub const fn from_product(product: Product) -> Self {
        Self {
            product,
            total_orders: None,
            review_count: None,
            average_rating: None,
            ml_score: None,
            similarity_score: None,
            algorithm: None,
            recommendation_reason: None,
        }
    }
}

/// The home page shelves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HomeRecommendations {
    #[serde(default)]
    pub most_ordered: Vec<Recommendation>,
    #[serde(default)]
    pub most_popular: Vec<Recommendation>,
    #[serde(default)]
    pub knn_recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub best_ml_recommendations: Vec<Recommendation>,
}

/// `(seed + i) mod m`, as a small integer for the score formulas.
fn wobble(seed: SeedBucket, i: usize, m: u64) -> u32 {
    let i = i as u64;
    u32::try_from(seed.get().wrapping_add(i) % m).unwrap_or(0)
}

/// Score formulas run in `f64` and round from the binary value, so a score
/// such as `0.955` (stored as `0.95499..`) rounds down to `0.95`.
fn float_score(value: f64, dp: u32) -> Decimal {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or_default()
}

fn shelf<'a>(shuffled: &'a [Product], start: usize, end: usize) -> impl Iterator<Item = (usize, &'a Product)> {
    let end = end.min(shuffled.len());
    let start = start.min(end);
    shuffled.get(start..end).unwrap_or_default().iter().enumerate()
}

impl HomeRecommendations {
    /// Shuffle once, then cut four overlapping windows out of the result:
    ///
    /// | shelf | window | synthetic fields |
    /// |---|---|---|
    /// | most ordered | `[0, 6)` | `total_orders = 200 - 15i + (s+i) mod 20` |
    /// | most popular | `[2, 8)` | `review_count = 80 - 8i + (s+i) mod 10`, `average_rating = 4.8 - 0.1i + 0.04((s+i) mod 5)` |
    /// | nearest neighbours | `[1, 7)` | `ml_score = 0.95 - 0.03i + 0.005((s+i) mod 10)` |
    /// | best picks | `[3, 9)` | `ml_score = 0.98 - 0.02i + 0.003((s+i) mod 8)` |
    #[must_use]
    pub fn simulate(products: &[Product], seed: SeedBucket) -> Self {
        let shuffled = shuffle_with_seed(products, seed);

        let most_ordered = shelf(&shuffled, 0, 6)
            .map(|(i, p)| {
                let mut rec = Recommendation::from_product(p.clone());
                let step = u32::try_from(i).unwrap_or(0);
                rec.total_orders = Some(200 - step * 15 + wobble(seed, i, 20));
                rec
            })
            .collect();

        let most_popular = shelf(&shuffled, 2, 8)
            .map(|(i, p)| {
                let mut rec = Recommendation::from_product(p.clone());
                let step = u32::try_from(i).unwrap_or(0);
                rec.review_count = Some(80 - step * 8 + wobble(seed, i, 10));
                let rating = 4.8 - f64::from(step) * 0.1 + f64::from(wobble(seed, i, 5)) * 0.04;
                rec.average_rating = Some(float_score(rating, 1));
                rec
            })
            .collect();

        let knn_recommendations = shelf(&shuffled, 1, 7)
            .map(|(i, p)| {
                let mut rec = Recommendation::from_product(p.clone());
                let step = f64::from(u32::try_from(i).unwrap_or(0));
                let score = 0.95 - step * 0.03 + f64::from(wobble(seed, i, 10)) * 0.005;
                rec.ml_score = Some(float_score(score, 2));
                rec.algorithm = Some("K-Nearest Neighbors".to_owned());
                rec
            })
            .collect();

        let best_ml_recommendations = shelf(&shuffled, 3, 9)
            .map(|(i, p)| {
                let mut rec = Recommendation::from_product(p.clone());
                let step = f64::from(u32::try_from(i).unwrap_or(0));
                let score = 0.98 - step * 0.02 + f64::from(wobble(seed, i, 8)) * 0.003;
                rec.ml_score = Some(float_score(score, 2));
                rec.algorithm = Some("Hybrid ML Model".to_owned());
                rec
            })
            .collect();

        Self {
            most_ordered,
            most_popular,
            knn_recommendations,
            best_ml_recommendations,
        }
    }

    /// True when every shelf is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.most_ordered.is_empty()
            && self.most_popular.is_empty()
            && self.knn_recommendations.is_empty()
            && self.best_ml_recommendations.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::catalog;
    use super::*;

    #[test]
    fn test_shelf_sizes_and_overlap() {
        let seed = SeedBucket::new(4242);
        let recs = HomeRecommendations::simulate(&catalog(10), seed);
        assert_eq!(recs.most_ordered.len(), 6);
        assert_eq!(recs.most_popular.len(), 6);
        assert_eq!(recs.knn_recommendations.len(), 6);
        assert_eq!(recs.best_ml_recommendations.len(), 6);

        let shuffled = shuffle_with_seed(&catalog(10), seed);
        assert_eq!(recs.most_popular[0].product, shuffled[2]);
        assert_eq!(recs.best_ml_recommendations[5].product, shuffled[8]);
    }

    #[test]
    fn test_synthetic_fields() {
        // seed 40: (40 + 0) mod 20 = 0, mod 10 = 0, mod 5 = 0, mod 8 = 0
        let recs = HomeRecommendations::simulate(&catalog(9), SeedBucket::new(40));
        assert_eq!(recs.most_ordered[0].total_orders, Some(200));
        assert_eq!(recs.most_ordered[1].total_orders, Some(200 - 15 + 1));
        assert_eq!(recs.most_popular[0].review_count, Some(80));
        assert_eq!(recs.most_popular[0].average_rating, Some(Decimal::new(48, 1)));
        assert_eq!(recs.most_popular[1].average_rating, Some(Decimal::new(47, 1)));
        assert_eq!(recs.knn_recommendations[0].ml_score, Some(Decimal::new(95, 2)));
        assert_eq!(recs.best_ml_recommendations[0].ml_score, Some(Decimal::new(98, 2)));
        assert_eq!(
            recs.best_ml_recommendations[0].algorithm.as_deref(),
            Some("Hybrid ML Model")
        );
    }

    #[test]
    fn test_scores_round_from_float_value() {
        // seed 41: knn wobble 1 gives 0.955, which is just under the midpoint as f64
        let recs = HomeRecommendations::simulate(&catalog(9), SeedBucket::new(41));
        assert_eq!(recs.knn_recommendations[0].ml_score, Some(Decimal::new(95, 2)));

        // seed 45: best-picks wobble 5 gives 0.995, also just under
        let recs = HomeRecommendations::simulate(&catalog(9), SeedBucket::new(45));
        assert_eq!(recs.best_ml_recommendations[0].ml_score, Some(Decimal::new(99, 2)));
    }

    #[test]
    fn test_short_catalog_truncates_shelves() {
        let recs = HomeRecommendations::simulate(&catalog(4), SeedBucket::new(1));
        assert_eq!(recs.most_ordered.len(), 4);
        assert_eq!(recs.most_popular.len(), 2);
        assert_eq!(recs.knn_recommendations.len(), 3);
        assert_eq!(recs.best_ml_recommendations.len(), 1);
        assert!(HomeRecommendations::simulate(&[], SeedBucket::new(1)).is_empty());
    }

    #[test]
    fn test_deserializes_endpoint_shape() {
        let json = r#"{"most_ordered":[{"id":1,"name":"Phone","price":"100.00","total_orders":12}],
                       "knn_recommendations":[]}"#;
        let recs: HomeRecommendations = serde_json::from_str(json).unwrap();
        assert_eq!(recs.most_ordered[0].total_orders, Some(12));
        assert!(recs.most_popular.is_empty());
    }
}
