//! Filter, sort and paginate pipeline for admin lists.
//!
//! Every admin table runs the same three steps over an in-memory copy of a
//! server list: keep the rows matching the active criteria, order them, then
//! cut out one page. The per-entity modules only describe *what* matches and
//! *how* to order; [`apply`] does the rest.
//!
//! Sorting is stable, so filtering before or after sorting yields the same
//! sequence. Pages are 1-based. An empty result has zero pages and every page
//! of it is empty.

mod offers;
mod orders;
mod products;
mod users;
mod wishlists;

pub use offers::{OfferQuery, OfferStatusFilter, UsageFilter};
pub use orders::{OrderQuery, OrderSort, OrderStatusFilter};
pub use products::{PriceRange, PriceRangeError, ProductQuery, ProductSort, ProductStatusFilter};
pub use users::{UserQuery, UserSort, UserStatusFilter};
pub use wishlists::{DateBucket, WishlistQuery, WishlistSort};

use std::cmp::Ordering;
use std::num::NonZeroUsize;

use serde::Serialize;

/// Predicate and ordering for one kind of row.
pub trait Criteria<T> {
    /// Whether `item` passes every active filter.
    fn matches(&self, item: &T) -> bool;

    /// Ordering for the current sort key. `Equal` keeps the incoming order.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// One page of a filtered, sorted list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number that was requested.
    pub page: usize,
    pub page_count: usize,
    /// Rows matching the criteria, across all pages.
    pub total: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.page_count
    }

    /// A previous page exists only when stepping back lands on real rows.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1 && self.page <= self.page_count + 1
    }
}

/// `ceil(total / page_size)`.
#[must_use]
pub const fn page_count(total: usize, page_size: NonZeroUsize) -> usize {
    total.div_ceil(page_size.get())
}

/// Cut page `page` (1-based) out of `items`.
///
/// Page 0 and pages past the end come back empty.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: NonZeroUsize) -> Page<T> {
    let page_count = page_count(items.len(), page_size);
    let slice = if page == 0 || page > page_count {
        &[][..]
    } else {
        let start = (page - 1) * page_size.get();
        let end = (start + page_size.get()).min(items.len());
        items.get(start..end).unwrap_or_default()
    };

    Page {
        items: slice.to_vec(),
        page,
        page_count,
        total: items.len(),
    }
}

/// Filter then stable-sort, returning the full matching sequence.
#[must_use]
pub fn filter_sort<T: Clone, C: Criteria<T>>(items: &[T], criteria: &C) -> Vec<T> {
    let mut rows: Vec<T> = items
        .iter()
        .filter(|item| criteria.matches(item))
        .cloned()
        .collect();
    rows.sort_by(|a, b| criteria.compare(a, b));
    rows
}

/// Run the whole pipeline and return one page.
#[must_use]
pub fn apply<T: Clone, C: Criteria<T>>(
    items: &[T],
    criteria: &C,
    page: usize,
    page_size: NonZeroUsize,
) -> Page<T> {
    paginate(&filter_sort(items, criteria), page, page_size)
}

/// Case-insensitive substring match against a lowercased needle.
pub(crate) fn contains_folded(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Case-insensitive ordering with a byte-wise tiebreak so results are total.
pub(crate) fn cmp_folded(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Trim and lowercase a search term; `None` when nothing is left.
pub(crate) fn normalize_search(term: &str) -> Option<String> {
    let term = term.trim();
    (!term.is_empty()).then(|| term.to_lowercase())
}

/// Criteria plus the current page for one table.
///
/// Any change to the criteria sends the table back to page 1, so a narrower
/// search never strands the user on a page that no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState<C> {
    criteria: C,
    page: usize,
    page_size: NonZeroUsize,
}

impl<C: PartialEq> ListState<C> {
    #[must_use]
    pub const fn new(criteria: C, page_size: NonZeroUsize) -> Self {
        Self {
            criteria,
            page: 1,
            page_size,
        }
    }

    #[must_use]
    pub const fn criteria(&self) -> &C {
        &self.criteria
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    /// Replace the criteria. Resets to page 1 when they differ.
    pub fn set_criteria(&mut self, criteria: C) {
        if criteria != self.criteria {
            self.criteria = criteria;
            self.page = 1;
        }
    }

    /// Edit the criteria in place. Resets to page 1 when anything changed.
    pub fn update<F>(&mut self, edit: F)
    where
        C: Clone,
        F: FnOnce(&mut C),
    {
        let mut next = self.criteria.clone();
        edit(&mut next);
        self.set_criteria(next);
    }

    /// Jump to a page; 0 is treated as 1.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: NonZeroUsize) {
        if page_size != self.page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    /// Run the pipeline for the current page.
    #[must_use]
    pub fn apply<T: Clone>(&self, items: &[T]) -> Page<T>
    where
        C: Criteria<T>,
    {
        apply(items, &self.criteria, self.page, self.page_size)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TWELVE: NonZeroUsize = NonZeroUsize::new(12).unwrap();

    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    struct Parity {
        even_only: bool,
        descending: bool,
    }

    impl Criteria<u32> for Parity {
        fn matches(&self, item: &u32) -> bool {
            !self.even_only || item % 2 == 0
        }

        fn compare(&self, a: &u32, b: &u32) -> Ordering {
            if self.descending { b.cmp(a) } else { Ordering::Equal }
        }
    }

    #[test]
    fn test_twenty_five_rows_make_three_pages() {
        let rows: Vec<u32> = (0..25).collect();
        let page = paginate(&rows, 3, TWELVE);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.items, vec![24]);
        assert_eq!(page.total, 25);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_empty_collection_has_no_pages() {
        let page = paginate::<u32>(&[], 1, TWELVE);
        assert_eq!(page.page_count, 0);
        assert!(page.items.is_empty());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_out_of_range_pages_are_empty() {
        let rows: Vec<u32> = (0..5).collect();
        assert!(paginate(&rows, 0, TWELVE).items.is_empty());
        assert!(paginate(&rows, 2, TWELVE).items.is_empty());
    }

    #[test]
    fn test_has_previous_only_when_previous_page_has_rows() {
        let rows: Vec<u32> = (0..5).collect();
        // One page of rows: page 2 steps back onto it, page 5 onto nothing
        assert!(paginate(&rows, 2, TWELVE).has_previous());
        assert!(!paginate(&rows, 5, TWELVE).has_previous());
        assert!(!paginate(&rows, 1, TWELVE).has_previous());
    }

    #[test]
    fn test_page_count_is_ceiling() {
        let three = NonZeroUsize::new(3).unwrap();
        assert_eq!(page_count(0, three), 0);
        assert_eq!(page_count(3, three), 1);
        assert_eq!(page_count(4, three), 2);
    }

    #[test]
    fn test_state_resets_page_on_criteria_change() {
        let mut state = ListState::new(Parity::default(), TWELVE);
        state.set_page(3);
        state.set_criteria(Parity::default());
        assert_eq!(state.page(), 3, "unchanged criteria keep the page");

        state.update(|c| c.even_only = true);
        assert_eq!(state.page(), 1);

        state.set_page(2);
        state.set_page_size(NonZeroUsize::new(5).unwrap());
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_state_apply() {
        let rows: Vec<u32> = (0..10).collect();
        let state = ListState::new(
            Parity {
                even_only: true,
                descending: true,
            },
            NonZeroUsize::new(2).unwrap(),
        );
        let page = state.apply(&rows);
        assert_eq!(page.items, vec![8, 6]);
        assert_eq!(page.page_count, 3);
    }
}
