use std::fmt;

use serde::Serialize;

use super::FormError;
use crate::models::User;
use crate::types::{Email, UserId};

/// The user create/edit form.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct UserDraft {
    /// Set when editing an existing account.
    pub editing: Option<UserId>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Required on create; left blank on edit to keep the current password.
    pub password: String,
}

impl fmt::Debug for UserDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDraft")
            .field("editing", &self.editing)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /admin/users/create/` and `PUT /admin/users/update/{id}/`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct UserPayload {
    pub username: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl fmt::Debug for UserPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPayload")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl UserDraft {
    /// Prefill the edit form. The password stays blank.
    #[must_use]
    pub fn edit(user: &User) -> Self {
        Self {
            editing: Some(user.id),
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password: String::new(),
        }
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.editing.is_none()
    }

    /// # Errors
    ///
    /// Username and email must be present, new accounts need a password,
    /// and the email must look like an address.
    pub fn validate(&self) -> Result<UserPayload, FormError> {
        let username = self.username.trim();
        if username.is_empty() || self.email.trim().is_empty() {
            return Err(FormError::UsernameAndEmailRequired);
        }
        let password = self.password.trim();
        if self.is_new() && password.is_empty() {
            return Err(FormError::PasswordRequired);
        }
        let email = Email::parse(&self.email)?;

        Ok(UserPayload {
            username: username.to_owned(),
            email,
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            password: (!password.is_empty()).then(|| self.password.clone()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::EmailError;

    fn new_user() -> UserDraft {
        UserDraft {
            username: "devika".into(),
            email: "devika@shop.test".into(),
            password: "hunter22".into(),
            ..UserDraft::default()
        }
    }

    #[test]
    fn test_required_fields() {
        let mut d = new_user();
        d.email = "  ".into();
        assert_eq!(d.validate(), Err(FormError::UsernameAndEmailRequired));

        let mut d = new_user();
        d.password.clear();
        assert_eq!(d.validate(), Err(FormError::PasswordRequired));
    }

    #[test]
    fn test_edit_may_omit_password() {
        let mut d = new_user();
        d.editing = Some(UserId::new(4));
        d.password.clear();
        let payload = d.validate().unwrap();
        assert!(payload.password.is_none());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_email_shape() {
        let mut d = new_user();
        d.email = "devika".into();
        assert_eq!(d.validate(), Err(FormError::InvalidEmail(EmailError::AtSymbol)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?} {:?}", new_user(), new_user().validate().unwrap());
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("[REDACTED]"));
    }
}
