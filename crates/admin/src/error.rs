//! Unified error handling for the admin client.

use emporium_core::models::User;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::services::{DashboardError, ServiceError};
use crate::storage::StorageError;

/// Application-level error type for admin front ends.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Local storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A workflow was refused or failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The dashboard could not be loaded at all.
    #[error("Dashboard error: {0}")]
    Dashboard(#[from] DashboardError),
}

impl AppError {
    /// Whether this error points at a fault rather than an operator decision
    /// or a validation message already shown to them.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) | Self::Dashboard(DashboardError::AllSourcesFailed) => true,
            Self::Api(e) | Self::Service(ServiceError::Api(e)) => !e.requires_login(),
            Self::Service(ServiceError::Storage(_)) => true,
            Self::Service(_) | Self::Dashboard(DashboardError::Cancelled) => false,
        }
    }

    /// Log the error, sending faults to Sentry.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin client error"
            );
        } else {
            tracing::warn!(error = %self, "Admin operation refused");
        }
    }
}

/// Set the Sentry user context from a signed-in user.
pub fn set_sentry_user(user: &User) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            username: Some(user.username.clone()),
            email: (!user.email.is_empty()).then(|| user.email.clone()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use emporium_core::forms::FormError;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config(ConfigError::MissingEnvVar("EMPORIUM_API_URL".to_string()));
        assert!(err.to_string().starts_with("Configuration error:"));

        let err = AppError::Service(ServiceError::OutOfStock);
        assert_eq!(err.to_string(), "This product is out of stock");
    }

    #[test]
    fn test_reportable_errors() {
        assert!(AppError::Dashboard(DashboardError::AllSourcesFailed).is_reportable());
        assert!(
            AppError::Api(ApiError::Api {
                status: 500,
                message: "boom".to_string(),
                body: None,
            })
            .is_reportable()
        );

        assert!(!AppError::Api(ApiError::SessionExpired).is_reportable());
        assert!(!AppError::Dashboard(DashboardError::Cancelled).is_reportable());
        assert!(!AppError::Service(ServiceError::NotConfirmed("delete".to_string())).is_reportable());
        assert!(!AppError::Service(ServiceError::Form(FormError::CategoryNameRequired)).is_reportable());
    }
}
