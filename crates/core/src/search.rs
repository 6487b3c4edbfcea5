//! Recent search history.

use serde::{Deserialize, Serialize};

/// Most recent distinct search terms, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentSearches {
    terms: Vec<String>,
}

impl RecentSearches {
    /// Terms kept in storage.
    pub const CAPACITY: usize = 10;
    /// Terms shown under the search box.
    pub const SHOWN: usize = 5;

    /// Rebuild from stored terms, dropping blanks and duplicates.
    #[must_use]
    pub fn from_terms(terms: Vec<String>) -> Self {
        let mut recent = Self::default();
        for term in terms.into_iter().rev() {
            recent.push(&term);
        }
        recent
    }

    /// Move `term` to the front. Blank terms are ignored; an existing
    /// identical term is removed first.
    pub fn push(&mut self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }
        self.terms.retain(|t| t != term);
        self.terms.insert(0, term.to_owned());
        self.terms.truncate(Self::CAPACITY);
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// The slice shown to the user.
    #[must_use]
    pub fn shown(&self) -> &[String] {
        let end = self.terms.len().min(Self::SHOWN);
        self.terms.get(..end).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_and_deduped() {
        let mut recent = RecentSearches::default();
        recent.push("phone");
        recent.push("laptop");
        recent.push(" phone ");
        assert_eq!(recent.terms(), ["phone", "laptop"]);
    }

    #[test]
    fn test_capacity() {
        let mut recent = RecentSearches::default();
        for i in 0..15 {
            recent.push(&format!("term {i}"));
        }
        assert_eq!(recent.terms().len(), RecentSearches::CAPACITY);
        assert_eq!(recent.terms()[0], "term 14");
        assert_eq!(recent.shown().len(), RecentSearches::SHOWN);
    }

    #[test]
    fn test_blank_ignored() {
        let mut recent = RecentSearches::default();
        recent.push("   ");
        assert!(recent.is_empty());
    }

    #[test]
    fn test_from_terms_preserves_order() {
        let stored = vec!["c".to_owned(), "b".to_owned(), "c".to_owned(), "a".to_owned()];
        let recent = RecentSearches::from_terms(stored);
        assert_eq!(recent.terms(), ["c", "b", "a"]);
    }
}
