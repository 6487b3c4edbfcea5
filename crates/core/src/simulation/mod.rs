//! Seeded recommendation simulator.
//!
//! **This is not a recommendation engine.** When the backend's
//! recommendation endpoint is unavailable, the storefront still shows its
//! "most ordered", "popular" and "ML pick" shelves by shuffling the product
//! list it already has and stamping plausible-looking numbers on the result.
//! Nothing here is derived from real orders, reviews or behaviour.
//!
//! Output is a pure function of the product list and a [`SeedBucket`]:
//! the current time cut into 30 second windows, so the shelves hold still
//! while a page is open and rotate a little between visits.

mod home;
mod interactions;

pub use home::{HomeRecommendations, Recommendation};
pub use interactions::{Interaction, InteractionKind, InteractionLog, RecommendationMetrics};

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Product;
use crate::types::ProductId;

/// Width of one seed window.
pub const SEED_WINDOW_MILLIS: i64 = 30_000;

const LCG_MULTIPLIER: u64 = 9301;
const LCG_INCREMENT: u64 = 49_297;
const LCG_MODULUS: u64 = 233_280;

/// `floor(unix_millis / 30_000)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeedBucket(u64);

impl SeedBucket {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Bucket for a Unix timestamp in milliseconds. Pre-epoch times clamp to 0.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        if millis <= 0 {
            Self(0)
        } else {
            Self(millis.unsigned_abs() / SEED_WINDOW_MILLIS.unsigned_abs())
        }
    }

    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self::from_unix_millis(now.timestamp_millis())
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// The linear congruential generator behind every shuffle:
/// `r = (r * 9301 + 49297) mod 233280`.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed % LCG_MODULUS,
        }
    }

    /// Advance and return the raw state in `0..233280`.
    pub const fn next_raw(&mut self) -> u64 {
        self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state
    }

    /// Advance and return `floor(r / 233280 * bound)`, always `< bound`.
    pub fn next_below(&mut self, bound: usize) -> usize {
        let r = self.next_raw();
        let scaled = u128::from(r) * bound as u128 / u128::from(LCG_MODULUS);
        usize::try_from(scaled).unwrap_or(0)
    }

    /// Advance and return `r / 233280` as a decimal in `[0, 1)`.
    pub fn next_unit(&mut self) -> Decimal {
        Decimal::from(self.next_raw()) / Decimal::from(LCG_MODULUS)
    }
}

/// Fisher–Yates permutation driven by [`Lcg`].
///
/// Walks from the back: pick `j` in `0..idx`, step `idx` down, swap.
/// The same seed always yields the same order.
#[must_use]
pub fn shuffle_with_seed<T: Clone>(items: &[T], seed: SeedBucket) -> Vec<T> {
    let mut shuffled = items.to_vec();
    let mut rng = Lcg::new(seed.get());
    let mut idx = shuffled.len();
    while idx != 0 {
        let j = rng.next_below(idx);
        idx -= 1;
        shuffled.swap(idx, j);
    }
    shuffled
}

/// Round a synthetic score for display.
pub(crate) fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Which ordering of the "best picks" shelf to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbVariant {
    /// Highest synthetic score first.
    #[default]
    A,
    /// Cheapest first.
    B,
}

impl FromStr for AbVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            other => Err(format!("unknown variant: {other}")),
        }
    }
}

impl fmt::Display for AbVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
        })
    }
}

/// Produces simulated recommendation shelves for one seed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationSimulator {
    seed: SeedBucket,
}

impl RecommendationSimulator {
    pub const SIMILAR_LIMIT: usize = 6;
    pub const PERSONALIZED_LIMIT: usize = 8;

    #[must_use]
    pub const fn new(seed: SeedBucket) -> Self {
        Self { seed }
    }

    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self::new(SeedBucket::at(now))
    }

    #[must_use]
    pub const fn seed(&self) -> SeedBucket {
        self.seed
    }

    /// The four home page shelves.
    #[must_use]
    pub fn home(&self, products: &[Product]) -> HomeRecommendations {
        HomeRecommendations::simulate(products, self.seed)
    }

    /// Up to six products that share the category of `product_id` or sit
    /// within 30% of its price. Empty if `product_id` is not in `products`.
    #[must_use]
    pub fn similar(&self, products: &[Product], product_id: ProductId) -> Vec<Recommendation> {
        let Some(current) = products.iter().find(|p| p.id == product_id) else {
            return Vec::new();
        };
        let band = current.price * Decimal::new(3, 1);
        let mut rng = Lcg::new(self.seed.get().wrapping_add(product_id.get().unsigned_abs()));

        products
            .iter()
            .filter(|p| p.id != product_id)
            .filter(|p| {
                let same_category =
                    current.category_slug().is_some() && p.category_slug() == current.category_slug();
                same_category || (p.price - current.price).abs() < band
            })
            .take(Self::SIMILAR_LIMIT)
            .map(|p| {
                let mut rec = Recommendation::from_product(p.clone());
                rec.ml_score = Some(round_dp(Decimal::new(8, 1) + rng.next_unit() * Decimal::new(2, 1), 2));
                rec.similarity_score =
                    Some(round_dp(Decimal::new(7, 1) + rng.next_unit() * Decimal::new(3, 1), 2));
                rec.algorithm = Some("Content-based Filtering".to_owned());
                rec.recommendation_reason = Some("Similar to current product".to_owned());
                rec
            })
            .collect()
    }

    /// Up to eight products the visitor has not interacted with yet.
    #[must_use]
    pub fn personalized(&self, products: &[Product], seen: &HashSet<ProductId>) -> Vec<Recommendation> {
        let mut rng = Lcg::new(self.seed.get());
        products
            .iter()
            .filter(|p| !seen.contains(&p.id))
            .take(Self::PERSONALIZED_LIMIT)
            .map(|p| {
                let mut rec = Recommendation::from_product(p.clone());
                rec.ml_score = Some(round_dp(Decimal::new(7, 1) + rng.next_unit() * Decimal::new(3, 1), 2));
                rec.algorithm = Some("Personalized ML".to_owned());
                rec.recommendation_reason = Some("Based on your activity".to_owned());
                rec
            })
            .collect()
    }

    /// The "best picks" shelf in the order the given variant shows it.
    #[must_use]
    pub fn ab_test(&self, products: &[Product], variant: AbVariant) -> Vec<Recommendation> {
        let mut shelf = self.home(products).best_ml_recommendations;
        match variant {
            AbVariant::A => shelf.sort_by(|a, b| b.ml_score.cmp(&a.ml_score)),
            AbVariant::B => shelf.sort_by(|a, b| a.product.price.cmp(&b.product.price)),
        }
        shelf
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::CategoryRef;

    pub(super) fn catalog(n: i64) -> Vec<Product> {
        (1..=n)
            .map(|i| Product {
                id: ProductId::new(i),
                name: format!("Item {i}"),
                slug: format!("item-{i}"),
                description: String::new(),
                brand: String::new(),
                price: Decimal::from(i * 100),
                actual_price: None,
                discount_percentage: Decimal::ZERO,
                offer_text: String::new(),
                stock: 10,
                available: true,
                category: Some(CategoryRef::Slug(if i % 2 == 0 { "even" } else { "odd" }.to_owned())),
                image_url: String::new(),
                image_urls: Vec::new(),
                created: None,
            })
            .collect()
    }

    #[test]
    fn test_seed_bucket_windows() {
        assert_eq!(SeedBucket::from_unix_millis(59_999).get(), 1);
        assert_eq!(SeedBucket::from_unix_millis(60_000).get(), 2);
        assert_eq!(SeedBucket::from_unix_millis(-5).get(), 0);
        let t = Utc.timestamp_millis_opt(1_750_000_012_345).unwrap();
        assert_eq!(SeedBucket::at(t).get(), 58_333_333);
    }

    #[test]
    fn test_lcg_sequence() {
        let mut rng = Lcg::new(0);
        assert_eq!(rng.next_raw(), 49_297);
        assert_eq!(rng.next_raw(), (49_297 * 9301 + 49_297) % 233_280);
    }

    #[test]
    fn test_shuffle_known_permutation() {
        // seed 0: r1 = 49297 -> j = floor(49297/233280*3) = 0, swap(2, 0)
        //         r2 = 165494 -> j = floor(165494/233280*2) = 1, swap(1, 1)
        //         r3 -> j = 0, swap(0, 0)
        let out = shuffle_with_seed(&['a', 'b', 'c'], SeedBucket::new(0));
        assert_eq!(out, vec!['c', 'b', 'a']);
    }

    #[test]
    fn test_same_seed_same_permutation() {
        let items: Vec<u32> = (0..40).collect();
        let seed = SeedBucket::new(58_333_333);
        let first = shuffle_with_seed(&items, seed);
        assert_eq!(first, shuffle_with_seed(&items, seed));

        let mut sorted = first.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, items, "shuffle is a permutation");
        assert_ne!(first, shuffle_with_seed(&items, SeedBucket::new(58_333_334)));
    }

    #[test]
    fn test_shuffle_empty_and_single() {
        assert!(shuffle_with_seed::<u8>(&[], SeedBucket::new(3)).is_empty());
        assert_eq!(shuffle_with_seed(&[7], SeedBucket::new(3)), vec![7]);
    }

    #[test]
    fn test_similar_products() {
        let products = catalog(20);
        let sim = RecommendationSimulator::new(SeedBucket::new(11));
        let similar = sim.similar(&products, ProductId::new(10));
        assert_eq!(similar.len(), RecommendationSimulator::SIMILAR_LIMIT);
        assert!(similar.iter().all(|r| r.product.id != ProductId::new(10)));
        for r in &similar {
            let close = (r.product.price - Decimal::from(1000)).abs() < Decimal::from(300);
            assert!(close || r.product.category_slug() == Some("even"));
            let score = r.ml_score.unwrap();
            assert!(score >= Decimal::new(8, 1) && score <= Decimal::ONE);
        }
        assert_eq!(similar, sim.similar(&products, ProductId::new(10)));
        assert!(sim.similar(&products, ProductId::new(99)).is_empty());
    }

    #[test]
    fn test_personalized_skips_seen() {
        let products = catalog(12);
        let seen: HashSet<ProductId> = [1, 2, 3].into_iter().map(ProductId::new).collect();
        let recs = RecommendationSimulator::new(SeedBucket::new(5)).personalized(&products, &seen);
        assert_eq!(recs.len(), 8);
        assert_eq!(recs[0].product.id, ProductId::new(4));
        assert!(recs.iter().all(|r| !seen.contains(&r.product.id)));
    }

    #[test]
    fn test_ab_variants() {
        let products = catalog(12);
        let sim = RecommendationSimulator::new(SeedBucket::new(77));
        let a = sim.ab_test(&products, AbVariant::A);
        let b = sim.ab_test(&products, AbVariant::B);
        assert_eq!(a.len(), 6);
        assert!(a.windows(2).all(|w| w[0].ml_score >= w[1].ml_score));
        assert!(b.windows(2).all(|w| w[0].product.price <= w[1].product.price));
    }
}
