use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CategoryRef, default_true, nullable};
use crate::types::{DisplayPrice, ProductId};

/// Stock at or below this level counts as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// A catalog product as returned by the product serializers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub slug: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub brand: String,
    #[serde(default, deserialize_with = "nullable")]
    pub price: Decimal,
    #[serde(default)]
    pub actual_price: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub discount_percentage: Decimal,
    #[serde(default, deserialize_with = "nullable")]
    pub offer_text: String,
    #[serde(default, deserialize_with = "nullable")]
    pub stock: i64,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl Product {
    #[must_use]
    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_ref().and_then(CategoryRef::slug)
    }

    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock <= LOW_STOCK_THRESHOLD
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    #[must_use]
    pub fn display_price(&self) -> DisplayPrice {
        DisplayPrice::new(self.price, self.actual_price, self.discount_percentage)
    }

    /// The landing image: the explicit `image_url`, else the first gallery image.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        if self.image_url.is_empty() {
            self.image_urls.first().map(String::as_str)
        } else {
            Some(&self.image_url)
        }
    }
}

/// The trimmed product shape embedded in admin order and wishlist rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductSummary {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub slug: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: String,
}

/// A product reference inside another record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Full(Box<Product>),
    Summary(ProductSummary),
    Id(ProductId),
}

impl ProductRef {
    #[must_use]
    pub fn id(&self) -> Option<ProductId> {
        match self {
            Self::Full(p) => Some(p.id),
            Self::Summary(s) => s.id,
            Self::Id(id) => Some(*id),
        }
    }

    /// Display name; empty when only an id is known.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Full(p) => &p.name,
            Self::Summary(s) => &s.name,
            Self::Id(_) => "",
        }
    }
}

impl Default for ProductRef {
    fn default() -> Self {
        Self::Summary(ProductSummary::default())
    }
}
