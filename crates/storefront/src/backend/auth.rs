//! Identity provider endpoints (`/auth/v1`).
//!
//! # Federated login flow
//!
//! 1. Generate a PKCE verifier, keep it in the visitor session
//! 2. Redirect to [`BackendClient::authorize_url`] with the verifier's challenge
//! 3. The provider redirects back with `?code=...`
//! 4. Exchange code + verifier with [`BackendClient::exchange_code`]

use reqwest::Method;
use tracing::instrument;

use super::types::{AuthSession, PasswordCredentials, PkceExchange, RefreshGrant, SignUpOutcome};
use super::{BackendClient, BackendError};

impl BackendClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` for wrong credentials or an unconfirmed
    /// email, or a transport error.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let request = self
            .request(Method::POST, "/auth/v1/token?grant_type=password", None)
            .json(&PasswordCredentials { email, password });
        self.send_json(request).await
    }

    /// Create a password account.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` when the email is taken or the
    /// password does not meet the project's rules.
    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, BackendError> {
        let request = self
            .request(Method::POST, "/auth/v1/signup", None)
            .json(&PasswordCredentials { email, password });
        self.send_json(request).await
    }

    /// URL that starts a federated login with `provider`.
    #[must_use]
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String {
        format!(
            "{}/auth/v1/authorize?\
            provider={}&\
            redirect_to={}&\
            code_challenge={}&\
            code_challenge_method=s256",
            self.base_url(),
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
            urlencoding::encode(code_challenge)
        )
    }

    /// Exchange a federated login code for a session.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` if the code or verifier is invalid or
    /// expired.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<AuthSession, BackendError> {
        let request = self
            .request(Method::POST, "/auth/v1/token?grant_type=pkce", None)
            .json(&PkceExchange {
                auth_code,
                code_verifier,
            });
        self.send_json(request).await
    }

    /// Trade a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` if the refresh token was revoked or
    /// already used.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let request = self
            .request(Method::POST, "/auth/v1/token?grant_type=refresh_token", None)
            .json(&RefreshGrant { refresh_token });
        self.send_json(request).await
    }

    /// Revoke the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; callers treat this as best effort.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let request = self.request(Method::POST, "/auth/v1/logout", Some(access_token));
        self.send(request).await.map(|_| ())
    }

    /// Check that the identity service answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), BackendError> {
        let request = self.request(Method::GET, "/auth/v1/health", None);
        self.send(request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::BackendConfig;

    fn client() -> BackendClient {
        BackendClient::new(&BackendConfig {
            url: "https://abc.backend.co/".to_string(),
            anon_key: SecretString::from("anon"),
            products_table: "products".to_string(),
            profiles_table: "profiles".to_string(),
            storage_bucket: "product-images".to_string(),
            oauth_providers: vec!["google".to_string()],
        })
    }

    #[test]
    fn test_authorize_url_encodes_parameters() {
        let url = client().authorize_url(
            "google",
            "http://localhost:3000/auth/callback",
            "abc-_123",
        );
        assert_eq!(
            url,
            "https://abc.backend.co/auth/v1/authorize?provider=google&\
             redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback&\
             code_challenge=abc-_123&code_challenge_method=s256"
        );
    }

    #[tokio::test]
    async fn test_unreachable_refresh_is_not_a_refusal() {
        let config = crate::config::tests::test_config();
        let result = BackendClient::new(&config.backend)
            .refresh_session("refresh-456")
            .await;
        assert!(matches!(result, Err(BackendError::Http(_))));
        assert!(!result.is_err_and(|e| e.is_unauthorized()));
    }
}
