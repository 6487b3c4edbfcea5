//! Login, registration and profile endpoints.

use std::fmt;

use emporium_core::models::User;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use tracing::instrument;

use super::{ApiClient, ApiError};

/// `POST /login/`. The backend accepts a username or an email in `username`.
#[derive(Serialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// `POST /register/`.
#[derive(Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    #[serde(serialize_with = "expose")]
    pub password_confirm: SecretString,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// `{user, refresh, access}` from `/login/` and `/register/`.
#[derive(Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user.username)
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// `PUT /profile/`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl ApiClient {
    /// Sign in and store the issued tokens and user.
    ///
    /// # Errors
    ///
    /// Bad credentials come back as [`ApiError::Api`] with status 401 and the
    /// backend's message ("Invalid credentials").
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> Result<User, ApiError> {
        let response: LoginResponse = self.post_anonymous("login/", request).await?;
        self.store_session(&response.access, &response.refresh)?;
        self.tokens().set_user(&response.user)?;
        tracing::info!(user_id = %response.user.id, "Signed in");
        Ok(response.user)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] with the field errors on a 400.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        let response: LoginResponse = self.post_anonymous("register/", request).await?;
        self.store_session(&response.access, &response.refresh)?;
        self.tokens().set_user(&response.user)?;
        tracing::info!(user_id = %response.user.id, "Registered");
        Ok(response.user)
    }

    /// Forget the stored tokens and user. Purely local.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<(), ApiError> {
        self.end_session()?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// The user stored at sign-in, without a network call.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn current_user(&self) -> Result<Option<User>, ApiError> {
        Ok(self.tokens().current_user()?)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<User, ApiError> {
        self.get("profile/").await
    }

    /// Update the profile and refresh the stored user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let user: User = self.put("profile/", update).await?;
        self.tokens().set_user(&user)?;
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_serializes_password_but_debug_redacts() {
        let request = LoginRequest {
            username: "asha".into(),
            password: SecretString::from("hunter2"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["password"], "hunter2");
        assert!(!format!("{request:?}").contains("hunter2"));
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            first_name: Some("Asha".into()),
            ..ProfileUpdate::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"first_name":"Asha"}"#);
    }
}
