use serde::Serialize;

use super::FormError;
use crate::models::Category;
use crate::types::CategoryId;

/// Derive a URL slug from a display name.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, and trims dashes from both ends: `"Smart Home & IoT"` becomes
/// `"smart-home-iot"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// The category create/edit form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryDraft {
    pub editing: Option<CategoryId>,
    pub name: String,
    /// Left blank to derive it from the name.
    pub slug: String,
}

/// Body of `POST /admin/categories/create/` and `PUT /admin/categories/update/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPayload {
    pub name: String,
    pub slug: String,
}

impl CategoryDraft {
    #[must_use]
    pub fn edit(category: &Category) -> Self {
        Self {
            editing: Some(category.id),
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns [`FormError::CategoryNameRequired`] when the name is blank or
    /// has no characters a slug can be built from.
    pub fn validate(&self) -> Result<CategoryPayload, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::CategoryNameRequired);
        }
        let slug = match self.slug.trim() {
            "" => slugify(name),
            explicit => slugify(explicit),
        };
        if slug.is_empty() {
            return Err(FormError::CategoryNameRequired);
        }
        Ok(CategoryPayload {
            name: name.to_owned(),
            slug,
        })
    }
}
