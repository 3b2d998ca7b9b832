//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The session holds the
//! visitor's view state: signed-in user, bag and wishlist.

use serde::{Serialize, de::DeserializeOwned};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::StorefrontConfig;
use crate::error::AppError;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "boutique_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
///
/// View state is lost when the process restarts.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Read a session value, falling back to its default when absent or unreadable.
pub async fn load_or_default<T>(session: &Session, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match session.get::<T>(key).await {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, key, "Failed to read session value");
            T::default()
        }
    }
}

/// Write a session value.
///
/// # Errors
///
/// Returns `AppError::Internal` if the session cannot be modified.
pub async fn store<T>(session: &Session, key: &str, value: &T) -> Result<(), AppError>
where
    T: Serialize + Send + Sync,
{
    session
        .insert(key, value)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))
}
