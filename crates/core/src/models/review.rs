use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{UserRef, nullable};
use crate::types::ReviewId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    #[serde(default)]
    pub user: Option<UserRef>,
    pub rating: u8,
    #[serde(default, deserialize_with = "nullable")]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
