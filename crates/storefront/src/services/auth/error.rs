//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] boutique_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but its email address is not confirmed yet.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Federated login with a provider that is not enabled.
    #[error("login provider not enabled: {0}")]
    ProviderNotAllowed(String),

    /// Session state missing or invalid.
    #[error("invalid session state")]
    InvalidSessionState,

    /// The identity provider is throttling this client.
    #[error("too many attempts, retry after {0} seconds")]
    RateLimited(u64),

    /// Backend request failed.
    #[error("backend error: {0}")]
    Backend(BackendError),
}

impl AuthError {
    /// Short code carried in `?error=` redirects back to the auth pages.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "invalid_email",
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailNotConfirmed => "email_not_confirmed",
            Self::UserAlreadyExists => "user_exists",
            Self::WeakPassword(_) => "weak_password",
            Self::ProviderNotAllowed(_) => "provider",
            Self::InvalidSessionState => "session",
            Self::RateLimited(_) => "rate_limited",
            Self::Backend(_) => "unavailable",
        }
    }
}

impl From<BackendError> for AuthError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::RateLimited(secs) => Self::RateLimited(secs),
            BackendError::Rejected { ref message, .. } => {
                let lower = message.to_lowercase();
                if lower.contains("not confirmed") {
                    Self::EmailNotConfirmed
                } else if lower.contains("already registered") || lower.contains("already exists") {
                    Self::UserAlreadyExists
                } else if lower.contains("password") && !lower.contains("invalid login") {
                    Self::WeakPassword(message.clone())
                } else if err.is_unauthorized() {
                    Self::InvalidCredentials
                } else {
                    Self::Backend(err)
                }
            }
            other => Self::Backend(other),
        }
    }
}
