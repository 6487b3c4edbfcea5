use serde::{Deserialize, Serialize};

use super::nullable;
use crate::types::CategoryId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default, deserialize_with = "nullable")]
    pub icon: String,
}

/// How a product points at its category.
///
/// Full product serializers nest the category object; some admin listings
/// only carry the slug or the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Nested(Category),
    Id(CategoryId),
    Slug(String),
}

impl CategoryRef {
    /// The category slug, when the reference carries one.
    #[must_use]
    pub fn slug(&self) -> Option<&str> {
        match self {
            Self::Nested(c) => Some(&c.slug),
            Self::Slug(s) => Some(s),
            Self::Id(_) => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Nested(c) => Some(&c.name),
            Self::Slug(_) | Self::Id(_) => None,
        }
    }
}
