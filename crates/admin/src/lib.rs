//! Emporium Admin library.
//!
//! Client side of the Emporium storefront backend: a REST client with token
//! refresh, pluggable key-value storage, and the admin and storefront
//! workflows built on top of them.
//!
//! # Security
//!
//! The client holds bearer tokens with admin privileges. Tokens are kept as
//! [`secrecy::SecretString`] in memory and never appear in `Debug` output or
//! logs; persist them only through a [`storage::KeyValueStore`] you trust.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven client configuration
//! - [`storage`] - Key-value storage, token store
//! - [`api`] - REST client and endpoint wrappers
//! - [`services`] - Dashboard, CRUD console, cart, recommendations, history
//! - [`error`] - Unified error type and Sentry reporting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod storage;

pub use api::{ApiClient, ApiError, AuthState};
pub use config::{ClientConfig, ConfigError};
pub use error::AppError;
pub use storage::{FileStore, KeyValueStore, KeyValueStoreExt, MemoryStore, StorageError, TokenStore};
