use rust_decimal::Decimal;
use serde::Serialize;

use super::{FormError, parse_decimal};
use crate::models::{Category, CategoryRef, Product};

/// Image slots on the product form; the first is the landing image.
pub const MAX_PRODUCT_IMAGES: usize = 5;

/// The product create/edit form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductDraft {
    pub name: String,
    pub price: String,
    pub actual_price: String,
    pub discount_percentage: String,
    pub offer_text: String,
    pub description: String,
    pub stock: String,
    /// Category slug.
    pub category: String,
    pub image_urls: Vec<String>,
}

/// Body of `POST /admin/products/create/` and `PUT /admin/products/update/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPayload {
    pub name: String,
    pub price: Decimal,
    pub actual_price: Option<Decimal>,
    pub discount_percentage: Decimal,
    pub offer_text: String,
    pub description: String,
    pub stock: i64,
    pub category: String,
    pub image_url: String,
    pub image_urls: Vec<String>,
}

impl ProductDraft {
    /// Prefill the edit form from an existing product.
    ///
    /// The form posts a slug, so a category known only by id is looked up
    /// in `categories`.
    #[must_use]
    pub fn from_product(product: &Product, categories: &[Category]) -> Self {
        let image_urls = if product.image_urls.is_empty() {
            product.primary_image().map(str::to_owned).into_iter().collect()
        } else {
            product
                .image_urls
                .iter()
                .take(MAX_PRODUCT_IMAGES)
                .cloned()
                .collect()
        };

        Self {
            name: product.name.clone(),
            price: product.price.to_string(),
            actual_price: product.actual_price.map(|p| p.to_string()).unwrap_or_default(),
            discount_percentage: product.discount_percentage.to_string(),
            offer_text: product.offer_text.clone(),
            description: product.description.clone(),
            stock: product.stock.to_string(),
            category: category_slug(product.category.as_ref(), categories),
            image_urls,
        }
    }

    /// Check required fields and parse numbers.
    ///
    /// # Errors
    ///
    /// Name and a non-zero price come first, then the category, then the
    /// numeric fields. Blank image slots are dropped before the count check.
    pub fn validate(&self) -> Result<ProductPayload, FormError> {
        let name = self.name.trim();
        let price = parse_decimal("Price", &self.price)?;
        let price = match price {
            Some(p) if !name.is_empty() && p > Decimal::ZERO => p,
            _ => return Err(FormError::NameAndPriceRequired),
        };

        let category = self.category.trim();
        if category.is_empty() {
            return Err(FormError::CategoryRequired);
        }

        let actual_price = parse_decimal("Actual price", &self.actual_price)?.filter(|p| !p.is_zero());
        let discount_percentage =
            parse_decimal("Discount", &self.discount_percentage)?.unwrap_or(Decimal::ZERO);
        if discount_percentage > Decimal::ONE_HUNDRED {
            return Err(FormError::DiscountOutOfRange);
        }

        let stock = match self.stock.trim() {
            "" => 0,
            raw => raw.parse::<i64>().map_err(|_| FormError::NotANumber {
                field: "Stock",
                value: raw.to_owned(),
            })?,
        };
        if stock < 0 {
            return Err(FormError::Negative { field: "Stock" });
        }

        let image_urls: Vec<String> = self
            .image_urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_owned)
            .collect();
        if image_urls.len() > MAX_PRODUCT_IMAGES {
            return Err(FormError::TooManyImages {
                max: MAX_PRODUCT_IMAGES,
            });
        }

        Ok(ProductPayload {
            name: name.to_owned(),
            price,
            actual_price,
            discount_percentage,
            offer_text: self.offer_text.trim().to_owned(),
            description: self.description.trim().to_owned(),
            stock,
            category: category.to_owned(),
            image_url: image_urls.first().cloned().unwrap_or_default(),
            image_urls,
        })
    }
}

fn category_slug(category: Option<&CategoryRef>, categories: &[Category]) -> String {
    match category {
        Some(CategoryRef::Id(id)) => categories
            .iter()
            .find(|c| c.id == *id)
            .map(|c| c.slug.clone())
            .unwrap_or_default(),
        Some(other) => other.slug().unwrap_or_default().to_owned(),
        None => String::new(),
    }
}
