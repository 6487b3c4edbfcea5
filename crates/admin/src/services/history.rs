//! Client-side history: recent searches and recommendation interactions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use emporium_core::search::RecentSearches;
use emporium_core::simulation::{Interaction, InteractionKind, InteractionLog, RecommendationMetrics};
use emporium_core::types::ProductId;
use tracing::instrument;
use uuid::Uuid;

use crate::storage::{KeyValueStore, KeyValueStoreExt, StorageError, keys};

/// Reads and writes history entries in the injected store.
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn recent_searches(&self) -> Result<RecentSearches, StorageError> {
        let terms: Vec<String> = self.store.get_json(keys::RECENT_SEARCHES)?.unwrap_or_default();
        Ok(RecentSearches::from_terms(terms))
    }

    /// Remember `term` and return the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written.
    #[instrument(skip(self))]
    pub fn record_search(&self, term: &str) -> Result<RecentSearches, StorageError> {
        let mut recent = self.recent_searches()?;
        recent.push(term);
        self.store.set_json(keys::RECENT_SEARCHES, &recent)?;
        Ok(recent)
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn clear_searches(&self) -> Result<(), StorageError> {
        self.store.remove(keys::RECENT_SEARCHES)
    }

    /// This client's tracking session, created on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written.
    pub fn session_id(&self, now: DateTime<Utc>) -> Result<String, StorageError> {
        if let Some(existing) = self.store.get(keys::SESSION_ID)? {
            return Ok(existing);
        }
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
        let session = format!("session_{}_{suffix}", now.timestamp_millis());
        self.store.set(keys::SESSION_ID, &session)?;
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read or holds a malformed log.
    pub fn interactions(&self) -> Result<InteractionLog, StorageError> {
        let entries: Vec<Interaction> = self.store.get_json(keys::INTERACTIONS)?.unwrap_or_default();
        Ok(InteractionLog::from_entries(entries))
    }

    /// Append one interaction; only the newest hundred are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written.
    #[instrument(skip(self, now), fields(product_id = %product_id))]
    pub fn track(&self, product_id: ProductId, action: InteractionKind, now: DateTime<Utc>) -> Result<(), StorageError> {
        let session_id = self.session_id(now)?;
        let mut log = self.interactions()?;
        log.record(Interaction {
            product_id,
            action,
            timestamp: now,
            session_id,
        });
        self.store.set_json(keys::INTERACTIONS, &log)
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn metrics(&self) -> Result<RecommendationMetrics, StorageError> {
        Ok(self.interactions()?.metrics())
    }
}

impl std::fmt::Debug for HistoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryService").finish_non_exhaustive()
    }
}
