//! Account credentials.

use std::fmt;

use crate::error::CoreError;

/// Username and password for the provider account.
///
/// Validated once on construction and immutable afterwards. The password is
/// never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials after checking that neither field is blank.
    ///
    /// The username is trimmed; the password is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCredentials`] if either field is empty.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, CoreError> {
        let username = username.into().trim().to_string();
        let password = password.into();

        if username.is_empty() {
            return Err(CoreError::InvalidCredentials("username is required".into()));
        }
        if password.is_empty() {
            return Err(CoreError::InvalidCredentials("password is required".into()));
        }

        Ok(Self { username, password })
    }

    /// The account username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The account password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_rejected() {
        assert!(Credentials::new("", "secret").is_err());
        assert!(Credentials::new("   ", "secret").is_err());
        assert!(Credentials::new("user1", "").is_err());
    }

    #[test]
    fn test_username_trimmed() {
        let creds = Credentials::new("  user1 ", "secret").unwrap();
        assert_eq!(creds.username(), "user1");
        assert_eq!(creds.password(), "secret");
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("user1", "hunter2").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("user1"));
        assert!(!debug.contains("hunter2"));
    }
}
