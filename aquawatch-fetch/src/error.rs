//! Fetch error types.
//!
//! [`ProviderError`] is the closed set of failures an account client may
//! report. [`RefreshError`] is what a refresh cycle hands to the host: the
//! same errors, with authentication failures singled out.

use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Kind
// ============================================================================

/// Coarse classification of a refresh failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credentials rejected or session invalidated. Never retried automatically.
    Authentication,
    /// Anything else: network, provider outage, malformed data.
    Transient,
}

impl ErrorKind {
    /// Returns the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Transient => "transient",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Provider Error
// ============================================================================

/// Errors an account client may report.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the username/password pair.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The provider invalidated the current session.
    #[error("Session expired")]
    SessionExpired,

    /// The provider refused access to the account.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Rate limited by the provider.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after: Option<u64>,
    },

    /// Invalid response from the provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider service unavailable.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The fetch completed but the client holds no account data.
    #[error("No account data available")]
    NoData,
}

impl ProviderError {
    /// Returns true for the failures that mean the credentials must be re-entered.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::SessionExpired | Self::Unauthorized(_)
        )
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        if self.is_auth() {
            ErrorKind::Authentication
        } else {
            ErrorKind::Transient
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        use reqwest::StatusCode;

        match err.status() {
            Some(status) if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                ProviderError::Unauthorized(err.to_string())
            }
            Some(status) if status == StatusCode::TOO_MANY_REQUESTS => {
                ProviderError::RateLimited { retry_after: None }
            }
            _ => ProviderError::Http(err),
        }
    }
}

// ============================================================================
// Refresh Error
// ============================================================================

/// Outcome of a failed refresh cycle.
///
/// Converting a [`ProviderError`] into this type is the only place the
/// auth/non-auth split happens.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The provider rejected the credentials or session. The host must
    /// obtain new credentials; the original error is kept as the source.
    #[error("Re-authentication required: {source}")]
    ReauthRequired {
        /// The client error that triggered the condition.
        #[source]
        source: ProviderError,
    },

    /// Any other client failure, passed through as reported.
    #[error(transparent)]
    Provider(ProviderError),
}

impl From<ProviderError> for RefreshError {
    fn from(err: ProviderError) -> Self {
        if err.is_auth() {
            RefreshError::ReauthRequired { source: err }
        } else {
            RefreshError::Provider(err)
        }
    }
}

impl RefreshError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReauthRequired { .. } => ErrorKind::Authentication,
            Self::Provider(_) => ErrorKind::Transient,
        }
    }

    /// Returns true if the host must ask for new credentials.
    pub fn is_reauth_required(&self) -> bool {
        matches!(self, Self::ReauthRequired { .. })
    }

    /// The client error behind this failure.
    pub fn provider_error(&self) -> &ProviderError {
        match self {
            Self::ReauthRequired { source } => source,
            Self::Provider(err) => err,
        }
    }

    /// Unwraps into the client error behind this failure.
    pub fn into_provider_error(self) -> ProviderError {
        match self {
            Self::ReauthRequired { source } => source,
            Self::Provider(err) => err,
        }
    }
}
