//! Backend-as-a-service client.
//!
//! # Architecture
//!
//! - One `reqwest` client shared by every request (cheap to clone via `Arc`)
//! - The backend is the source of truth - products, profiles and images live
//!   there, the storefront only caches the product list (see [`crate::catalog`])
//! - Every request carries the project's anon key as `apikey`; requests made on
//!   behalf of a signed-in user carry the user's access token as the bearer so
//!   row-level security applies
//!
//! # APIs
//!
//! ## Auth (`/auth/v1`)
//! - Password sign-in and sign-up
//! - Federated login via the authorization-code flow with PKCE
//!
//! ## Tables (`/rest/v1`)
//! - `products` CRUD, `profiles` lookup by user id
//!
//! ## Storage (`/storage/v1`)
//! - Product image upload and public URLs
//!
//! # Example
//!
//! ```rust,ignore
//! use boutique_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend);
//!
//! let session = client.sign_in_with_password("shopper@example.com", "hunter22").await?;
//! let products = client.list_products().await?;
//! ```

mod auth;
mod storage;
mod tables;
pub mod types;

pub use storage::object_path_for_upload;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;

use crate::config::BackendConfig;

/// Upper bound for a single backend call, uploads included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend refused the request (bad credentials, validation, policy).
    #[error("Rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The backend failed with a server-side status.
    #[error("Backend returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },
}

impl BackendError {
    /// Whether the backend refused the caller's credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Rejected {
                status: 400 | 401 | 403,
                ..
            }
        )
    }
}

/// Error payload shapes returned by the auth, table and storage APIs.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Pick the most descriptive message out of an error response body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.msg.or(b.message).or(b.error_description).or(b.error))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Map a non-success status and body to a [`BackendError`].
fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> BackendError {
    let message = error_message(body);
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited(retry_after.unwrap_or(1)),
        s if s.is_client_error() => BackendError::Rejected {
            status: s.as_u16(),
            message,
        },
        s => BackendError::Status {
            status: s.as_u16(),
            message,
        },
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the backend-as-a-service project.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    products_table: String,
    profiles_table: String,
    storage_bucket: String,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::builder()
                    .timeout(REQUEST_TIMEOUT)
                    .build()
                    .unwrap_or_default(),
                base_url: config.url.trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
                products_table: config.products_table.clone(),
                profiles_table: config.profiles_table.clone(),
                storage_bucket: config.storage_bucket.clone(),
            }),
        }
    }

    /// Project base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Build a request with the project key and a bearer token.
    ///
    /// Without a user token the anon key doubles as the bearer.
    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let anon_key = self.inner.anon_key.expose_secret();
        let bearer = token.unwrap_or(anon_key);
        self.inner
            .client
            .request(method, format!("{}{path}", self.inner.base_url))
            .header("apikey", anon_key)
            .bearer_auth(bearer)
    }

    /// Send a request and check the status, returning the body text.
    async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let body = response.text().await?;

        if !status.is_success() {
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned server error"
                );
            } else {
                tracing::debug!(status = %status, "Backend rejected request");
            }
            return Err(status_error(status, retry_after, &body));
        }

        Ok(body)
    }

    /// Send a request and parse the JSON response.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }
}
