//! Wire models for the storefront backend.
//!
//! These mirror the JSON the backend returns. The backend is loose about
//! optional fields (a blank text column may arrive as `""`, `null` or not at
//! all), so most fields default rather than fail deserialization.

mod cart;
mod category;
mod offer;
mod order;
mod product;
mod review;
mod stats;
mod user;
mod wishlist;

pub use cart::{Cart, CartItem};
pub use category::{Category, CategoryRef};
pub use offer::{Offer, OfferPriority, OfferType, UsageBucket};
pub use order::{Order, OrderItem};
pub use product::{Product, ProductRef, ProductSummary};
pub use review::Review;
pub use stats::AdminStats;
pub use user::{User, UserRef, UserSummary};
pub use wishlist::{CompareItem, WishlistItem};

use serde::{Deserialize, Deserializer, Serialize};

/// A list endpoint's body: either a bare array or a paginated envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Plain(Vec<T>),
    Paginated {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
    },
}

impl<T> ListResponse<T> {
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Plain(items) | Self::Paginated { results: items, .. } => items,
        }
    }
}

impl<T> From<ListResponse<T>> for Vec<T> {
    fn from(list: ListResponse<T>) -> Self {
        list.into_vec()
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

pub(crate) const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_accepts_both_shapes() {
        let plain: ListResponse<Category> =
            serde_json::from_str(r#"[{"id":1,"name":"Phones","slug":"phones"}]"#).unwrap();
        assert_eq!(plain.into_vec().len(), 1);

        let paged: ListResponse<Category> = serde_json::from_str(
            r#"{"count":2,"next":null,"results":[{"id":1,"name":"A","slug":"a"},{"id":2,"name":"B","slug":"b"}]}"#,
        )
        .unwrap();
        assert_eq!(paged.into_vec().len(), 2);
    }
}
