use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{Criteria, cmp_folded, contains_folded, normalize_search};
use crate::models::WishlistItem;

/// How recently an item was saved, in whole days before `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateBucket {
    #[default]
    All,
    /// Less than one full day ago.
    Today,
    /// Seven days or fewer.
    Week,
    /// Thirty days or fewer.
    Month,
}

impl DateBucket {
    /// Whether `added_at` falls in the bucket relative to `now`.
    ///
    /// Rows without a timestamp only match [`DateBucket::All`].
    #[must_use]
    pub fn contains(self, added_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        if self == Self::All {
            return true;
        }
        let Some(added_at) = added_at else {
            return false;
        };
        let days = (now - added_at).num_days();
        match self {
            Self::All => true,
            Self::Today => days == 0,
            Self::Week => days <= 7,
            Self::Month => days <= 30,
        }
    }
}

impl FromStr for DateBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!("unknown date filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WishlistSort {
    #[default]
    Recent,
    Oldest,
    User,
    Product,
}

impl FromStr for WishlistSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "recent" => Ok(Self::Recent),
            "oldest" => Ok(Self::Oldest),
            "user" => Ok(Self::User),
            "product" => Ok(Self::Product),
            other => Err(format!("unknown wishlist sort: {other}")),
        }
    }
}

/// Search and filter state of the wishlist table.
///
/// Date buckets are relative, so the query carries the instant they are
/// measured from. Two queries built at different times compare unequal,
/// which resets paging like any other criteria change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistQuery {
    /// Matches customer first name, customer email, or product name.
    pub search: String,
    pub added: DateBucket,
    pub sort: WishlistSort,
    pub now: DateTime<Utc>,
}

impl WishlistQuery {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            search: String::new(),
            added: DateBucket::All,
            sort: WishlistSort::Recent,
            now,
        }
    }
}

fn first_name(item: &WishlistItem) -> &str {
    item.user.as_ref().map_or("", |u| u.first_name())
}

impl Criteria<WishlistItem> for WishlistQuery {
    fn matches(&self, item: &WishlistItem) -> bool {
        if let Some(term) = normalize_search(&self.search) {
            let email = item.user.as_ref().map_or("", |u| u.email());
            let hit = contains_folded(first_name(item), &term)
                || contains_folded(email, &term)
                || contains_folded(item.product.name(), &term);
            if !hit {
                return false;
            }
        }
        self.added.contains(item.added_at, self.now)
    }

    fn compare(&self, a: &WishlistItem, b: &WishlistItem) -> Ordering {
        match self.sort {
            WishlistSort::Recent => b.added_at.cmp(&a.added_at),
            WishlistSort::Oldest => a.added_at.cmp(&b.added_at),
            WishlistSort::User => cmp_folded(first_name(a), first_name(b)),
            WishlistSort::Product => cmp_folded(a.product.name(), b.product.name()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::{ProductRef, ProductSummary, UserRef, UserSummary};
    use crate::query::filter_sort;
    use crate::types::WishlistItemId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn item(id: i64, who: &str, product: &str, age: Duration) -> WishlistItem {
        WishlistItem {
            id: WishlistItemId::new(id),
            user: Some(UserRef::Summary(UserSummary {
                first_name: who.to_owned(),
                ..UserSummary::default()
            })),
            product: ProductRef::Summary(ProductSummary {
                name: product.to_owned(),
                ..ProductSummary::default()
            }),
            added_at: Some(now() - age),
        }
    }

    fn items() -> Vec<WishlistItem> {
        vec![
            item(1, "Zoya", "Tablet", Duration::hours(3)),
            item(2, "Arjun", "Earbuds", Duration::days(5)),
            item(3, "Meena", "Laptop", Duration::days(20)),
            item(4, "Arjun", "Smartwatch", Duration::days(90)),
        ]
    }

    #[test]
    fn test_date_buckets() {
        let mut query = WishlistQuery::new(now());
        let count = |q: &WishlistQuery| filter_sort(&items(), q).len();

        query.added = DateBucket::Today;
        assert_eq!(count(&query), 1);
        query.added = DateBucket::Week;
        assert_eq!(count(&query), 2);
        query.added = DateBucket::Month;
        assert_eq!(count(&query), 3);
        query.added = DateBucket::All;
        assert_eq!(count(&query), 4);
    }

    #[test]
    fn test_undated_rows_only_in_all() {
        assert!(DateBucket::All.contains(None, now()));
        assert!(!DateBucket::Month.contains(None, now()));
    }

    #[test]
    fn test_search_product_name() {
        let query = WishlistQuery {
            search: "lap".into(),
            ..WishlistQuery::new(now())
        };
        let hits = filter_sort(&items(), &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, WishlistItemId::new(3));
    }

    #[test]
    fn test_sort_by_user_is_stable() {
        let query = WishlistQuery {
            sort: WishlistSort::User,
            ..WishlistQuery::new(now())
        };
        let ids: Vec<i64> = filter_sort(&items(), &query).iter().map(|w| w.id.get()).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }
}
