//! REST client for the storefront backend.
//!
//! Every request carries `Authorization: Bearer <access_token>` when a token
//! is stored. A 401 triggers one refresh (`POST /auth/refresh/`) and one
//! replay of the original request; if the refresh itself fails the stored
//! tokens are cleared and [`AuthState::LoginRequired`] is published.
//!
//! # Endpoint groups
//!
//! - [`auth`] - login, registration, profile
//! - [`catalog`] - products, categories, reviews, home recommendations
//! - [`shopping`] - cart, wishlist, compare, checkout and orders
//! - [`offers`] - applying offers to the cart, and the admin offer desk
//! - [`admin`] - admin CRUD and analytics

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod offers;
pub mod shopping;

pub use admin::{AnalyticsSummary, StatusUpdate, ToggleResponse};
pub use auth::{LoginRequest, LoginResponse, ProfileUpdate, RegisterRequest};
pub use catalog::{NewReview, ProductParams};
pub use offers::{ApplyOfferResponse, ComboEligibility, OfferRedemption, OfferSelector, OfferUsage};
pub use shopping::{CancelResponse, CheckoutRequest};

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::instrument;
use url::Url;

use crate::config::ClientConfig;
use crate::storage::{KeyValueStore, StorageError, TokenStore};

const REFRESH_PATH: &str = "auth/refresh/";

/// Errors returned by [`ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connect, timeout, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the backend's message. `body` keeps the
    /// decoded JSON error body for endpoints that return machine-readable
    /// codes.
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// 401 that a refresh could not (or did not need to) fix.
    #[error("Unauthorized: sign in required")]
    Unauthorized,

    /// The refresh token was rejected; stored tokens have been cleared.
    #[error("Session expired: please sign in again")]
    SessionExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status behind the error, when there was a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized | Self::SessionExpired => Some(401),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// A field of the JSON error body, e.g. `code`.
    #[must_use]
    pub fn body_field(&self, key: &str) -> Option<&serde_json::Value> {
        match self {
            Self::Api { body: Some(body), .. } => body.get(key),
            _ => None,
        }
    }

    /// Whether the caller has to sign in again before retrying.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::SessionExpired)
    }
}

/// Sign-in state as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// An access token is stored.
    Authenticated,
    /// No tokens; nothing has gone wrong.
    LoggedOut,
    /// A refresh failed and tokens were cleared. The front end should send
    /// the user to the login screen.
    LoginRequired,
}

/// Generic `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// One request, kept whole so it can be replayed after a refresh.
struct Call<'a> {
    method: Method,
    path: &'a str,
    query: &'a [(&'a str, String)],
    body: Option<serde_json::Value>,
    /// Skip the bearer header and the refresh-on-401 handling.
    anonymous: bool,
}

impl<'a> Call<'a> {
    fn new(method: Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            query: &[],
            body: None,
            anonymous: false,
        }
    }
}

/// Storefront/admin REST client.
///
/// Cheap to clone; clones share the HTTP pool, token storage and auth-state
/// channel.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
    auth_state: watch::Sender<AuthState>,
    /// Serializes refreshes so concurrent 401s spend the refresh token once.
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// Build a client over `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or storage cannot
    /// be read.
    pub fn new(config: &ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("emporium/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let tokens = TokenStore::new(store);
        let initial = if tokens.access_token()?.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::LoggedOut
        };
        let (auth_state, _) = watch::channel(initial);

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.clone(),
                tokens,
                auth_state,
                refresh_lock: Mutex::new(()),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Token and user storage.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Subscribe to sign-in state changes.
    #[must_use]
    pub fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.inner.auth_state.subscribe()
    }

    /// The latest published sign-in state.
    #[must_use]
    pub fn current_auth_state(&self) -> AuthState {
        *self.inner.auth_state.borrow()
    }

    fn publish(&self, state: AuthState) {
        let previous = self.inner.auth_state.send_replace(state);
        if previous != state {
            tracing::debug!(?previous, ?state, "Auth state changed");
        }
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Call::new(Method::GET, path)).await
    }

    pub(crate) async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut call = Call::new(Method::GET, path);
        call.query = query;
        self.send(call).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut call = Call::new(Method::POST, path);
        call.body = Some(to_body(body)?);
        self.send(call).await
    }

    /// POST without a body (`/cart/add/{id}/` and friends).
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Call::new(Method::POST, path)).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut call = Call::new(Method::PUT, path);
        call.body = Some(to_body(body)?);
        self.send(call).await
    }

    /// PUT without a body (toggle and ban endpoints).
    pub(crate) async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Call::new(Method::PUT, path)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Call::new(Method::DELETE, path)).await
    }

    /// POST to an endpoint that issues tokens; no bearer, no refresh.
    pub(crate) async fn post_anonymous<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut call = Call::new(Method::POST, path);
        call.body = Some(to_body(body)?);
        call.anonymous = true;
        self.send(call).await
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Send once. Returns the response and the access token it carried.
    async fn dispatch(&self, call: &Call<'_>) -> Result<(reqwest::Response, Option<SecretString>), ApiError> {
        let url = self.url(call.path, call.query)?;
        let mut request = self.inner.http.request(call.method.clone(), url);

        let token = if call.anonymous {
            None
        } else {
            self.inner.tokens.access_token()?
        };
        if let Some(token) = &token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Ok((response, token))
    }

    /// Send, refreshing and replaying once on 401, then decode.
    async fn send<T: DeserializeOwned>(&self, call: Call<'_>) -> Result<T, ApiError> {
        let (response, sent_token) = self.dispatch(&call).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::handle_response(response).await;
        }
        if call.anonymous {
            // Bad credentials on login: keep the backend's message.
            let (status, message, body) = Self::error_parts(response).await;
            return Err(ApiError::Api { status, message, body });
        }

        if self.inner.tokens.refresh_token()?.is_none() {
            tracing::debug!(path = call.path, "401 with no refresh token");
            return Err(ApiError::Unauthorized);
        }

        self.refresh_session(sent_token.as_ref()).await?;

        let (replay, _) = self.dispatch(&call).await?;
        if replay.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = call.path, "Request still unauthorized after token refresh");
            return Err(ApiError::Unauthorized);
        }
        Self::handle_response(replay).await
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// If another request already refreshed while this one waited for the
    /// lock, the stored token differs from `stale` and nothing is sent.
    #[instrument(skip_all)]
    async fn refresh_session(&self, stale: Option<&SecretString>) -> Result<(), ApiError> {
        let _guard = self.inner.refresh_lock.lock().await;

        let current = self.inner.tokens.access_token()?;
        if let (Some(current), Some(stale)) = (&current, stale)
            && current.expose_secret() != stale.expose_secret()
        {
            return Ok(());
        }

        let Some(refresh) = self.inner.tokens.refresh_token()? else {
            return Err(ApiError::Unauthorized);
        };

        match self.request_refresh(&refresh).await {
            Ok(tokens) => {
                let access = SecretString::from(tokens.access);
                match tokens.refresh {
                    Some(rotated) => self.inner.tokens.set_tokens(&access, &SecretString::from(rotated))?,
                    None => self.inner.tokens.set_access(&access)?,
                }
                tracing::info!("Access token refreshed");
                self.publish(AuthState::Authenticated);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.inner.tokens.clear()?;
                self.publish(AuthState::LoginRequired);
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh: &SecretString) -> Result<RefreshResponse, ApiError> {
        let url = self.url(REFRESH_PATH, &[])?;
        let response = self
            .inner
            .http
            .post(url)
            .json(&RefreshRequest {
                refresh: refresh.expose_secret(),
            })
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Store a freshly issued token pair and mark the session signed in.
    pub(crate) fn store_session(&self, access: &str, refresh: &str) -> Result<(), ApiError> {
        self.inner
            .tokens
            .set_tokens(&SecretString::from(access.to_owned()), &SecretString::from(refresh.to_owned()))?;
        self.publish(AuthState::Authenticated);
        Ok(())
    }

    /// Forget tokens and user, and mark the session signed out.
    pub(crate) fn end_session(&self) -> Result<(), ApiError> {
        self.inner.tokens.clear_session()?;
        self.publish(AuthState::LoggedOut);
        Ok(())
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
                b"null"
            } else {
                &bytes
            };
            return serde_json::from_slice(body)
                .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Turn an error response into an [`ApiError`].
    async fn parse_error(response: reqwest::Response) -> ApiError {
        let (status, message, body) = Self::error_parts(response).await;
        match status {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(message),
            _ => ApiError::Api { status, message, body },
        }
    }

    async fn error_parts(response: reqwest::Response) -> (u16, String, Option<serde_json::Value>) {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_owned());
        let body = serde_json::from_str(&text).ok();
        (status.as_u16(), message, body)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("auth_state", &*self.inner.auth_state.borrow())
            .finish_non_exhaustive()
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Parse(format!("Failed to encode request: {e}")))
}

/// The human-readable part of an error body: `error`, then `detail`, then
/// `message`, else the raw text.
fn error_message(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(body)) = serde_json::from_str::<serde_json::Value>(text) {
        for key in ["error", "detail", "message"] {
            match body.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
                Some(v) if !v.is_null() => return Some(v.to_string()),
                _ => {}
            }
        }
    }
    Some(text.to_owned())
}
