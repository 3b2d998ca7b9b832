//! Authentication service.
//!
//! Password and federated (PKCE) login against the backend's identity
//! provider, plus the role lookup that turns a backend session into a
//! [`CurrentUser`].

mod error;

pub use error::AuthError;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};
use tracing::instrument;

use boutique_core::{Email, UserId};

use crate::backend::{AuthSession, BackendClient, SignUpOutcome};
use crate::config::BackendConfig;
use crate::models::CurrentUser;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of a PKCE code verifier (RFC 7636 allows 43..=128).
const CODE_VERIFIER_LENGTH: usize = 64;

/// Result of a registration.
#[derive(Debug)]
pub enum Registration {
    /// The account is usable immediately.
    SignedIn(CurrentUser),
    /// The identity provider sent a confirmation email first.
    PendingConfirmation(Email),
}

/// A federated login waiting for the provider's redirect.
#[derive(Debug)]
pub struct OAuthStart {
    /// Where to send the visitor.
    pub authorize_url: String,
    /// Verifier to keep in the session until the callback.
    pub code_verifier: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    backend: &'a BackendClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        if password.trim().is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self
            .backend
            .sign_in_with_password(email.as_str(), password)
            .await?;
        Ok(self.current_user(&session).await)
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn register_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Registration, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        match self.backend.sign_up(email.as_str(), password).await? {
            SignUpOutcome::SignedIn(session) => {
                Ok(Registration::SignedIn(self.current_user(&session).await))
            }
            SignUpOutcome::PendingConfirmation(_) => Ok(Registration::PendingConfirmation(email)),
        }
    }

    // =========================================================================
    // Federated Login
    // =========================================================================

    /// Start a federated login with `provider`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProviderNotAllowed` if the provider is not enabled.
    pub fn start_oauth(
        &self,
        config: &BackendConfig,
        provider: &str,
        redirect_to: &str,
    ) -> Result<OAuthStart, AuthError> {
        if !config.allows_provider(provider) {
            return Err(AuthError::ProviderNotAllowed(provider.to_string()));
        }

        let code_verifier = generate_code_verifier();
        let authorize_url = self.backend.authorize_url(
            provider,
            redirect_to,
            &code_challenge(&code_verifier),
        );
        Ok(OAuthStart {
            authorize_url,
            code_verifier,
        })
    }

    /// Finish a federated login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidSessionState` if the code was rejected.
    #[instrument(skip_all)]
    pub async fn finish_oauth(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<CurrentUser, AuthError> {
        let session = self
            .backend
            .exchange_code(auth_code, code_verifier)
            .await
            .map_err(|e| {
                if e.is_unauthorized() {
                    AuthError::InvalidSessionState
                } else {
                    AuthError::from(e)
                }
            })?;
        Ok(self.current_user(&session).await)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Revoke the user's backend session. Failures are logged and ignored.
    pub async fn logout(&self, user: &CurrentUser) {
        if let Err(e) = self.backend.sign_out(user.access_token()).await {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to revoke backend session");
        }
    }

    /// Build the session user, looking up the role in the profiles table.
    ///
    /// A missing or unreadable profile leaves the user a customer.
    async fn current_user(&self, session: &AuthSession) -> CurrentUser {
        let user_id = UserId::new(session.user.id);
        let profile = match self
            .backend
            .fetch_profile(&session.access_token, user_id)
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, %user_id, "Failed to fetch profile, defaulting role");
                None
            }
        };
        CurrentUser::from_session(session, profile.as_ref())
    }
}

/// Random PKCE code verifier.
#[must_use]
pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(CODE_VERIFIER_LENGTH)
        .map(char::from)
        .collect()
}

/// S256 challenge for a code verifier.
#[must_use]
pub fn code_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.trim().is_empty() || password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_code_challenge_matches_rfc7636_example() {
        assert_eq!(
            code_challenge("dBjftJeZ4CVP-mJ92IFxNa6hrgp8DA9ZbOwCoA6HbnA"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_code_verifier_shape() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), CODE_VERIFIER_LENGTH);
        assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(verifier, generate_code_verifier());
    }

    #[test]
    fn test_validate_password() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("          "),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_start_oauth_checks_provider() {
        let config = test_config();
        let backend = BackendClient::new(&config.backend);
        let service = AuthService::new(&backend);

        let start = service
            .start_oauth(&config.backend, "google", "http://localhost:3000/auth/callback")
            .unwrap_or_else(|e| panic!("google is allowed: {e}"));
        assert!(start.authorize_url.contains("provider=google"));
        assert!(
            start
                .authorize_url
                .contains(&code_challenge(&start.code_verifier))
        );

        assert!(matches!(
            service.start_oauth(&config.backend, "github", "http://localhost:3000/auth/callback"),
            Err(AuthError::ProviderNotAllowed(_))
        ));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_email_before_calling_backend() {
        let config = test_config();
        let backend = BackendClient::new(&config.backend);
        let result = AuthService::new(&backend)
            .login_with_password("not-an-email", "password123")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidEmail(_))));
    }

    #[tokio::test]
    async fn test_login_rejects_blank_password_before_calling_backend() {
        let config = test_config();
        let backend = BackendClient::new(&config.backend);
        let result = AuthService::new(&backend)
            .login_with_password("ana@example.com", "   \t ")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }
}
