use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::round_dp;
use crate::types::ProductId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    Click,
    Purchase,
}

/// One tracked visitor action on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub product_id: ProductId,
    pub action: InteractionKind,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
}

/// Rolling log of the most recent interactions, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionLog {
    entries: Vec<Interaction>,
}

impl InteractionLog {
    pub const CAPACITY: usize = 100;

    /// Build from stored entries, keeping only the newest [`Self::CAPACITY`].
    #[must_use]
    pub fn from_entries(mut entries: Vec<Interaction>) -> Self {
        let excess = entries.len().saturating_sub(Self::CAPACITY);
        entries.drain(..excess);
        Self { entries }
    }

    pub fn record(&mut self, interaction: Interaction) {
        self.entries.push(interaction);
        let excess = self.entries.len().saturating_sub(Self::CAPACITY);
        self.entries.drain(..excess);
    }

    #[must_use]
    pub fn entries(&self) -> &[Interaction] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every product with at least one interaction of any kind.
    #[must_use]
    pub fn seen_products(&self) -> HashSet<ProductId> {
        self.entries.iter().map(|i| i.product_id).collect()
    }

    #[must_use]
    pub fn metrics(&self) -> RecommendationMetrics {
        let count = |kind| self.entries.iter().filter(|i| i.action == kind).count();
        let views = count(InteractionKind::View);
        let clicks = count(InteractionKind::Click);
        let purchases = count(InteractionKind::Purchase);

        RecommendationMetrics {
            total_interactions: self.entries.len(),
            total_views: views,
            total_clicks: clicks,
            total_purchases: purchases,
            click_through_rate: percent(clicks, views),
            conversion_rate: percent(purchases, clicks),
        }
    }
}

/// `part / whole * 100` to two places; zero when `whole` is zero.
fn percent(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    round_dp(
        Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole),
        2,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationMetrics {
    pub total_interactions: usize,
    pub total_views: usize,
    pub total_clicks: usize,
    pub total_purchases: usize,
    /// Clicks per hundred views.
    pub click_through_rate: Decimal,
    /// Purchases per hundred clicks.
    pub conversion_rate: Decimal,
}
