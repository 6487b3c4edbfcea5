//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `EMPORIUM_API_URL` - Backend base URL (default: `http://localhost:8000/api`)
//! - `EMPORIUM_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `EMPORIUM_STATE_FILE` - Where tokens and history are kept (default: `.emporium/state.json`)
//! - `EMPORIUM_STRICT_TRANSITIONS` - Refuse out-of-flow order status changes (default: false)
//! - `EMPORIUM_LOG_JSON` - Emit JSON log lines instead of text (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate, 0.0 to 1.0 (default: 1.0)

use std::path::PathBuf;
use std::time::Duration;

use emporium_core::TransitionPolicy;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STATE_FILE: &str = ".emporium/state.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Settings for the API client, its storage and the CLI around it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; endpoint paths are appended to it.
    pub api_url: Url,
    pub request_timeout: Duration,
    /// JSON file backing the key-value store in the CLI.
    pub state_file: PathBuf,
    pub transition_policy: TransitionPolicy,
    pub log_json: bool,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            transition_policy: TransitionPolicy::Permissive,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to something unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to something unparseable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = match get("EMPORIUM_API_URL") {
            Some(raw) => parse_base_url(&raw)
                .map_err(|e| ConfigError::InvalidEnvVar("EMPORIUM_API_URL".to_string(), e))?,
            None => default_api_url(),
        };

        let timeout_secs: u64 = parse_or("EMPORIUM_TIMEOUT_SECS", get("EMPORIUM_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "EMPORIUM_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let strict = parse_bool("EMPORIUM_STRICT_TRANSITIONS", get("EMPORIUM_STRICT_TRANSITIONS"))?;
        let log_json = parse_bool("EMPORIUM_LOG_JSON", get("EMPORIUM_LOG_JSON"))?;

        let sentry_sample_rate: f32 = parse_or("SENTRY_SAMPLE_RATE", get("SENTRY_SAMPLE_RATE"), 1.0)?;
        if !(0.0..=1.0).contains(&sentry_sample_rate) {
            return Err(ConfigError::InvalidEnvVar(
                "SENTRY_SAMPLE_RATE".to_string(),
                "must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            state_file: get("EMPORIUM_STATE_FILE").map_or_else(|| PathBuf::from(DEFAULT_STATE_FILE), PathBuf::from),
            transition_policy: if strict {
                TransitionPolicy::Strict
            } else {
                TransitionPolicy::Permissive
            },
            log_json,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }

    /// Same settings, different backend.
    #[must_use]
    pub fn with_api_url(mut self, api_url: Url) -> Self {
        self.api_url = api_url;
        self
    }
}

fn default_api_url() -> Url {
    // Infallible: the constant is a valid absolute URL.
    parse_base_url(DEFAULT_API_URL).unwrap_or_else(|_| unreachable!("default API URL is valid"))
}

/// Parse a base URL and make sure it ends in `/` so joins append rather
/// than replace the last path segment.
///
/// # Errors
///
/// Returns a description of the problem if `raw` is not an absolute
/// `http`/`https` URL.
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |v| {
        v.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn parse_bool(key: &str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}
