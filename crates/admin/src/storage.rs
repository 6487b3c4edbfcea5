//! Injected key-value storage for tokens and client-side history.
//!
//! Everything the client persists between runs goes through
//! [`KeyValueStore`]: the bearer tokens, the signed-in user, recent searches
//! and the recommendation interaction log. Values are strings; structured
//! values are stored as JSON via [`KeyValueStoreExt`].

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use emporium_core::models::User;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

/// Storage keys shared with the storefront web client.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const USER: &str = "user";
    pub const RECENT_SEARCHES: &str = "recentSearches";
    pub const INTERACTIONS: &str = "ml_interactions";
    pub const SESSION_ID: &str = "ml_session_id";
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored value is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key-value storage, internally synchronized.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// JSON helpers for any [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    /// Read and decode a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored text is not valid
    /// JSON for `T`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.get(key)?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StorageError::from)
    }

    /// Encode and store a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

/// Process-local storage. Used by tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object on disk.
///
/// The file is read once on open and rewritten in full on every change.
/// A missing file is an empty store; parent directories are created on the
/// first write. Each change is written to a sibling temp file and renamed
/// over the target, and the in-memory map only moves once that succeeds.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(keys = values.len(), "Opened state file");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;
        let raw = serde_json::to_string_pretty(values)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("state");
        let tmp = parent.join(format!(".{file_name}.tmp.{}", std::process::id()));
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(raw.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Apply `change` to a copy, persist the copy, then swap it in.
    fn commit<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = values.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.commit(|values| {
            values.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.commit(|values| values.remove(key).is_some())
    }
}

/// Typed access to the auth entries of a [`KeyValueStore`].
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The underlying store, for non-auth keys.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn access_token(&self) -> Result<Option<SecretString>, StorageError> {
        Ok(self.store.get(keys::ACCESS_TOKEN)?.map(SecretString::from))
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn refresh_token(&self) -> Result<Option<SecretString>, StorageError> {
        Ok(self.store.get(keys::REFRESH_TOKEN)?.map(SecretString::from))
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn set_access(&self, access: &SecretString) -> Result<(), StorageError> {
        self.store.set(keys::ACCESS_TOKEN, access.expose_secret())
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn set_tokens(&self, access: &SecretString, refresh: &SecretString) -> Result<(), StorageError> {
        self.set_access(access)?;
        self.store.set(keys::REFRESH_TOKEN, refresh.expose_secret())
    }

    /// Forget both tokens. The stored user is kept; see [`Self::clear_session`].
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(keys::ACCESS_TOKEN)?;
        self.store.remove(keys::REFRESH_TOKEN)
    }

    /// Forget both tokens and the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        self.clear()?;
        self.store.remove(keys::USER)
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read or the stored user is
    /// malformed.
    pub fn current_user(&self) -> Result<Option<User>, StorageError> {
        self.store.get_json(keys::USER)
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn set_user(&self, user: &User) -> Result<(), StorageError> {
        self.store.set_json(keys::USER, user)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        store.set_json(keys::RECENT_SEARCHES, &["phone", "laptop"]).unwrap();
        let terms: Vec<String> = store.get_json(keys::RECENT_SEARCHES).unwrap().unwrap();
        assert_eq!(terms, ["phone", "laptop"]);

        store.set(keys::RECENT_SEARCHES, "not json").unwrap();
        assert!(matches!(
            store.get_json::<Vec<String>>(keys::RECENT_SEARCHES),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStore::open(&path).unwrap();
        store.set(keys::ACCESS_TOKEN, "abc").unwrap();
        store.set("other", "1").unwrap();
        store.remove("other").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.get("other").unwrap(), None);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("state");
        let path = parent.join("state.json");

        let store = FileStore::open(&path).unwrap();
        store.set(keys::ACCESS_TOKEN, "old").unwrap();

        // A plain file where the directory was makes every later write fail
        std::fs::remove_dir_all(&parent).unwrap();
        std::fs::write(&parent, "").unwrap();

        assert!(matches!(store.set(keys::ACCESS_TOKEN, "new"), Err(StorageError::Io(_))));
        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("old"));
        assert!(matches!(store.remove(keys::ACCESS_TOKEN), Err(StorageError::Io(_))));
        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn test_file_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, ["state.json"]);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_token_store() {
        let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
        assert!(tokens.access_token().unwrap().is_none());

        tokens
            .set_tokens(&SecretString::from("a1"), &SecretString::from("r1"))
            .unwrap();
        assert_eq!(tokens.access_token().unwrap().unwrap().expose_secret(), "a1");
        assert_eq!(tokens.refresh_token().unwrap().unwrap().expose_secret(), "r1");

        tokens.clear().unwrap();
        assert!(tokens.access_token().unwrap().is_none());
        assert!(tokens.refresh_token().unwrap().is_none());
    }
}
