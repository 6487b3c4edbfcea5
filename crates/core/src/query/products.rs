use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::{Criteria, cmp_folded, contains_folded, normalize_search};
use crate::models::Product;

/// Availability filter on the product table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductStatusFilter {
    #[default]
    All,
    Active,
    Inactive,
    /// Stock at or below the low-stock threshold.
    LowStock,
}

impl FromStr for ProductStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "low_stock" | "low-stock" => Ok(Self::LowStock),
            other => Err(format!("unknown product status filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Keep the server's order.
    #[default]
    None,
    PriceLow,
    PriceHigh,
    NameAsc,
    Newest,
    StockLow,
}

impl FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "price_low" | "price" => Ok(Self::PriceLow),
            "price_high" => Ok(Self::PriceHigh),
            "name_asc" | "name" => Ok(Self::NameAsc),
            "newest" => Ok(Self::Newest),
            "stock" | "stock_low" => Ok(Self::StockLow),
            other => Err(format!("unknown product sort: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid price range {0:?}, expected MIN-MAX or MIN-max")]
pub struct PriceRangeError(String);

/// Inclusive price band. `"25000-max"` has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Option<Decimal>,
}

impl PriceRange {
    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.min && self.max.is_none_or(|max| price <= max)
    }
}

impl FromStr for PriceRange {
    type Err = PriceRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PriceRangeError(s.to_owned());
        let (min, max) = s.trim().split_once('-').ok_or_else(err)?;
        let min: Decimal = min.trim().parse().map_err(|_| err())?;
        let max = match max.trim() {
            "max" | "" => None,
            m => Some(m.parse::<Decimal>().map_err(|_| err())?),
        };
        if max.is_some_and(|max| max < min) {
            return Err(err());
        }
        Ok(Self { min, max })
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}-{max}", self.min),
            None => write!(f, "{}-max", self.min),
        }
    }
}

/// Search and filter state of the product table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductQuery {
    /// Matches name or description, case-insensitively.
    pub search: String,
    /// Category slug; `None` means every category.
    pub category: Option<String>,
    pub price: Option<PriceRange>,
    pub status: ProductStatusFilter,
    pub sort: ProductSort,
}

impl Criteria<Product> for ProductQuery {
    fn matches(&self, p: &Product) -> bool {
        if let Some(term) = normalize_search(&self.search)
            && !(contains_folded(&p.name, &term) || contains_folded(&p.description, &term))
        {
            return false;
        }
        if let Some(slug) = self.category.as_deref()
            && p.category_slug() != Some(slug)
        {
            return false;
        }
        if let Some(range) = self.price
            && !range.contains(p.price)
        {
            return false;
        }
        match self.status {
            ProductStatusFilter::All => true,
            ProductStatusFilter::Active => p.available,
            ProductStatusFilter::Inactive => !p.available,
            ProductStatusFilter::LowStock => p.is_low_stock(),
        }
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self.sort {
            ProductSort::None => Ordering::Equal,
            ProductSort::PriceLow => a.price.cmp(&b.price),
            ProductSort::PriceHigh => b.price.cmp(&a.price),
            ProductSort::NameAsc => cmp_folded(&a.name, &b.name),
            ProductSort::Newest => b.created.cmp(&a.created),
            ProductSort::StockLow => a.stock.cmp(&b.stock),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroUsize;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::CategoryRef;
    use crate::query::{apply, filter_sort};
    use crate::types::ProductId;

    fn product(id: i64, name: &str, price: i64, stock: i64, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: String::new(),
            brand: String::new(),
            price: Decimal::from(price),
            actual_price: None,
            discount_percentage: Decimal::ZERO,
            offer_text: String::new(),
            stock,
            available: stock > 0,
            category: Some(CategoryRef::Slug(category.to_owned())),
            image_url: String::new(),
            image_urls: Vec::new(),
            created: Utc.timestamp_opt(1_700_000_000 + id * 60, 0).single(),
        }
    }

    fn catalog() -> Vec<Product> {
        (1..=25)
            .map(|i| {
                let category = if i % 3 == 0 { "laptops" } else { "smartphones" };
                product(i, &format!("Device {i:02}"), i * 1000, i % 7, category)
            })
            .collect()
    }

    #[test]
    fn test_unfiltered_catalog_pages() {
        let size = NonZeroUsize::new(12).unwrap();
        let page = apply(&catalog(), &ProductQuery::default(), 3, size);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn test_search_with_no_matches() {
        let query = ProductQuery {
            search: "toaster".into(),
            ..ProductQuery::default()
        };
        let page = apply(&catalog(), &query, 1, NonZeroUsize::new(12).unwrap());
        assert_eq!(page.page_count, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_search_matches_description() {
        let mut rows = catalog();
        rows[4].description = "Ships with a FAST charger".into();
        let query = ProductQuery {
            search: "fast".into(),
            ..ProductQuery::default()
        };
        let hits = filter_sort(&rows, &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, ProductId::new(5));
    }

    #[test]
    fn test_every_result_satisfies_every_predicate() {
        let rows = catalog();
        let query = ProductQuery {
            search: "device".into(),
            category: Some("smartphones".into()),
            price: Some("5000-20000".parse().unwrap()),
            status: ProductStatusFilter::LowStock,
            sort: ProductSort::PriceHigh,
        };
        let hits = filter_sort(&rows, &query);
        assert!(!hits.is_empty());
        for p in &hits {
            assert!(rows.contains(p));
            assert_eq!(p.category_slug(), Some("smartphones"));
            assert!(p.price >= Decimal::from(5000) && p.price <= Decimal::from(20000));
            assert!(p.stock <= 5);
        }
        assert!(hits.windows(2).all(|w| w[0].price >= w[1].price));
    }

    #[test]
    fn test_filter_and_sort_commute() {
        let rows = catalog();
        let query = ProductQuery {
            status: ProductStatusFilter::Active,
            sort: ProductSort::StockLow,
            ..ProductQuery::default()
        };

        let filter_first = filter_sort(&rows, &query);

        let mut sorted = rows;
        sorted.sort_by(|a, b| query.compare(a, b));
        let sort_first: Vec<Product> = sorted.into_iter().filter(|p| query.matches(p)).collect();

        assert_eq!(filter_first, sort_first);
    }

    #[test]
    fn test_newest_first() {
        let query = ProductQuery {
            sort: ProductSort::Newest,
            ..ProductQuery::default()
        };
        let hits = filter_sort(&catalog(), &query);
        assert_eq!(hits[0].id, ProductId::new(25));
    }

    #[test]
    fn test_price_range_parsing() {
        let open: PriceRange = "25000-max".parse().unwrap();
        assert!(open.contains(Decimal::from(1_000_000)));
        assert!(!open.contains(Decimal::from(24_999)));
        assert_eq!(open.to_string(), "25000-max");

        let closed: PriceRange = "1000-5000".parse().unwrap();
        assert!(closed.contains(Decimal::from(5000)));
        assert!(!closed.contains(Decimal::from(5001)));

        assert!("cheap".parse::<PriceRange>().is_err());
        assert!("5000-1000".parse::<PriceRange>().is_err());
    }
}
