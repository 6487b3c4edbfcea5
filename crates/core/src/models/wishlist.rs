use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProductRef, UserRef};
use crate::types::{CompareItemId, WishlistItemId};

/// One product saved to one user's wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub product: ProductRef,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

/// One product on one user's comparison list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareItem {
    pub id: CompareItemId,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub product: ProductRef,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}
