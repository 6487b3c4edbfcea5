use std::cmp::Ordering;
use std::str::FromStr;

use super::{Criteria, contains_folded, normalize_search};
use crate::models::{Offer, OfferType, UsageBucket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OfferStatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl FromStr for OfferStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("unknown offer status filter: {other}")),
        }
    }
}

/// Usage filter: `high` is more than 10 redemptions, `low` 1 to 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsageFilter {
    #[default]
    All,
    High,
    Low,
    Unused,
}

impl FromStr for UsageFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            "unused" => Ok(Self::Unused),
            other => Err(format!("unknown usage filter: {other}")),
        }
    }
}

/// Search and filter state of the offer table. Rows keep the server's order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OfferQuery {
    /// Matches name or code.
    pub search: String,
    pub offer_type: Option<OfferType>,
    pub status: OfferStatusFilter,
    pub usage: UsageFilter,
}

impl Criteria<Offer> for OfferQuery {
    fn matches(&self, offer: &Offer) -> bool {
        if let Some(term) = normalize_search(&self.search)
            && !contains_folded(&offer.name, &term)
            && !contains_folded(&offer.code, &term)
        {
            return false;
        }
        if self.offer_type.is_some_and(|t| t != offer.offer_type) {
            return false;
        }
        let status = match self.status {
            OfferStatusFilter::All => true,
            OfferStatusFilter::Active => offer.is_active,
            OfferStatusFilter::Inactive => !offer.is_active,
        };
        let usage = match self.usage {
            UsageFilter::All => true,
            UsageFilter::High => offer.usage_bucket() == UsageBucket::High,
            UsageFilter::Low => offer.usage_bucket() == UsageBucket::Low,
            UsageFilter::Unused => offer.usage_bucket() == UsageBucket::Unused,
        };
        status && usage
    }

    fn compare(&self, _a: &Offer, _b: &Offer) -> Ordering {
        Ordering::Equal
    }
}
