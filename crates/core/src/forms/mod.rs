//! Draft state and client-side validation for the admin CRUD forms.
//!
//! A draft holds what the operator typed, as text. `validate` either rejects
//! it with a [`FormError`] (nothing is sent) or produces the JSON payload the
//! create/update endpoint expects.

mod category;
mod offer;
mod product;
mod user;

pub use category::{CategoryDraft, CategoryPayload, slugify};
pub use offer::{OfferDraft, OfferPayload};
pub use product::{MAX_PRODUCT_IMAGES, ProductDraft, ProductPayload};
pub use user::{UserDraft, UserPayload};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::EmailError;

/// A draft that cannot be submitted.
///
/// Display strings are the messages shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Name and price are required")]
    NameAndPriceRequired,

    #[error("Please select a category")]
    CategoryRequired,

    #[error("Category name is required")]
    CategoryNameRequired,

    #[error("Username and email are required")]
    UsernameAndEmailRequired,

    #[error("Password is required for new users")]
    PasswordRequired,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} cannot be negative")]
    Negative { field: &'static str },

    #[error("Discount must be between 0 and 100")]
    DiscountOutOfRange,

    #[error("At most {max} images are allowed")]
    TooManyImages { max: usize },

    #[error("Please fill in all required fields (Name and Code)")]
    OfferNameAndCodeRequired,

    #[error("Please select start and end dates")]
    OfferDatesRequired,

    #[error("End date must be after start date")]
    OfferEndBeforeStart,

    #[error("Please select at least one category for category-based offers")]
    OfferCategoryRequired,

    #[error("{field} is not a date: {value:?}")]
    InvalidDate { field: &'static str, value: String },
}

/// Parse an optional decimal field: blank means `None`.
pub(crate) fn parse_decimal(field: &'static str, raw: &str) -> Result<Option<Decimal>, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value: Decimal = raw.parse().map_err(|_| FormError::NotANumber {
        field,
        value: raw.to_owned(),
    })?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(FormError::Negative { field });
    }
    Ok(Some(value))
}
