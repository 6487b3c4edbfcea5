use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{default_true, nullable};
use crate::types::UserId;

/// An account as listed by the admin user endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub first_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub last_name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
}

impl User {
    /// `"first last"`, trimmed; falls back to the username.
    #[must_use]
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_owned()
        }
    }
}

/// The user fields embedded in order and wishlist rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default, deserialize_with = "nullable")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub first_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub last_name: String,
}

/// A user reference inside another record: nested fields or a bare key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Summary(UserSummary),
    Id(UserId),
}

impl UserRef {
    #[must_use]
    pub const fn summary(&self) -> Option<&UserSummary> {
        match self {
            Self::Summary(s) => Some(s),
            Self::Id(_) => None,
        }
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        self.summary().map_or("", |s| s.first_name.as_str())
    }

    #[must_use]
    pub fn email(&self) -> &str {
        self.summary().map_or("", |s| s.email.as_str())
    }
}
