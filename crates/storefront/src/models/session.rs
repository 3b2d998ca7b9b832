//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use boutique_core::{Email, Role, UserId};

use crate::backend::{AuthSession, ProfileRow};

/// Seconds before expiry at which an access token counts as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Session-stored user identity.
///
/// Built from the identity provider's session plus the role from the
/// user's profile record.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity provider user ID.
    pub id: UserId,
    /// User's email address, when the provider shared one.
    pub email: Option<Email>,
    /// Role from the profile record; `Customer` when absent.
    pub role: Role,
    /// Name to greet the user with.
    pub display_name: Option<String>,
    /// `email` for password accounts, the provider name otherwise.
    pub provider: Option<String>,
    /// Bearer token for user-scoped backend requests.
    access_token: String,
    /// Token for obtaining a new access token.
    #[serde(default)]
    refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default)]
    expires_in: Option<i64>,
    /// Unix timestamp when the access token was obtained.
    #[serde(default)]
    obtained_at: i64,
}

impl CurrentUser {
    /// Combine a backend session with the user's profile record.
    #[must_use]
    pub fn from_session(session: &AuthSession, profile: Option<&ProfileRow>) -> Self {
        let user = &session.user;
        let display_name = profile
            .and_then(|p| p.full_name.clone())
            .filter(|n| !n.trim().is_empty())
            .or_else(|| user.display_name());

        Self {
            id: UserId::new(user.id),
            email: user.email.as_deref().and_then(|e| Email::parse(e).ok()),
            role: Role::from_profile(profile.and_then(|p| p.role.as_deref())),
            display_name,
            provider: user.app_metadata.provider.clone(),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_in: session.expires_in,
            obtained_at: Utc::now().timestamp(),
        }
    }

    /// Token to act as this user against the backend.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Token to trade for a new access token, if the provider issued one.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Check if the access token is expired (with 60s buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    fn is_expired_at(&self, now: i64) -> bool {
        self.expires_in.is_some_and(|expires_in| {
            let expires_at = self.obtained_at.saturating_add(expires_in);
            now >= expires_at.saturating_sub(EXPIRY_MARGIN_SECS)
        })
    }

    /// Take the tokens of a refreshed session; identity and role are kept.
    pub fn apply_refresh(&mut self, session: &AuthSession) {
        self.access_token.clone_from(&session.access_token);
        if session.refresh_token.is_some() {
            self.refresh_token.clone_from(&session.refresh_token);
        }
        self.expires_in = session.expires_in;
        self.obtained_at = Utc::now().timestamp();
    }

    /// Whether the user may use the admin panel.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Name shown in the navigation: display name, email, or a fallback.
    #[must_use]
    pub fn greeting_name(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.email.as_ref().map(|e| e.local_part().to_string()))
            .unwrap_or_else(|| "there".to_string())
    }
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("display_name", &self.display_name)
            .field("provider", &self.provider)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Session keys for view state.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the shopping bag.
    pub const BAG: &str = "bag";

    /// Key for the wishlist.
    pub const WISHLIST: &str = "wishlist";

    /// Key for the PKCE code verifier of a federated login in progress.
    pub const PKCE_VERIFIER: &str = "pkce_verifier";

    /// Key for the provider of a federated login in progress.
    pub const OAUTH_PROVIDER: &str = "oauth_provider";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(json: &str) -> AuthSession {
        serde_json::from_str(json).unwrap()
    }

    const SESSION: &str = r#"{
        "access_token": "token-123",
        "user": {
            "id": "2f1b6c1e-8f0a-4f7e-9a53-1f6a3c0b9d11",
            "email": "Ada@Example.COM",
            "app_metadata": {"provider": "google"},
            "user_metadata": {"name": "ada"}
        }
    }"#;

    #[test]
    fn test_role_defaults_to_customer_without_profile() {
        let user = CurrentUser::from_session(&session(SESSION), None);
        assert_eq!(user.role, Role::Customer);
        assert!(!user.is_admin());
        assert_eq!(user.display_name.as_deref(), Some("ada"));
        assert_eq!(user.email.as_ref().map(Email::as_str), Some("Ada@example.com"));
    }

    #[test]
    fn test_profile_sets_role_and_name() {
        let profile = ProfileRow {
            role: Some("admin".to_string()),
            full_name: Some("Ada Lovelace".to_string()),
        };
        let user = CurrentUser::from_session(&session(SESSION), Some(&profile));
        assert!(user.is_admin());
        assert_eq!(user.greeting_name(), "Ada Lovelace");
        assert_eq!(user.access_token(), "token-123");
    }

    const EXPIRING_SESSION: &str = r#"{
        "access_token": "token-123",
        "refresh_token": "refresh-456",
        "expires_in": 3600,
        "user": {"id": "2f1b6c1e-8f0a-4f7e-9a53-1f6a3c0b9d11"}
    }"#;

    #[test]
    fn test_debug_redacts_tokens() {
        let user = CurrentUser::from_session(&session(EXPIRING_SESSION), None);
        let debug = format!("{user:?}");
        assert!(!debug.contains("token-123"));
        assert!(!debug.contains("refresh-456"));
    }

    #[test]
    fn test_token_expires_a_minute_early() {
        let mut user = CurrentUser::from_session(&session(EXPIRING_SESSION), None);
        user.obtained_at = 1_000_000;
        assert!(!user.is_expired_at(1_000_000));
        assert!(!user.is_expired_at(1_003_539));
        assert!(user.is_expired_at(1_003_540));
        assert!(user.is_expired_at(1_010_000));
    }

    #[test]
    fn test_fresh_token_is_not_expired() {
        let user = CurrentUser::from_session(&session(EXPIRING_SESSION), None);
        assert!(!user.is_expired());
        assert_eq!(user.refresh_token(), Some("refresh-456"));
    }

    #[test]
    fn test_token_without_lifetime_never_expires() {
        let mut user = CurrentUser::from_session(&session(SESSION), None);
        user.obtained_at = 0;
        assert!(!user.is_expired_at(i64::MAX));
        assert_eq!(user.refresh_token(), None);
    }

    #[test]
    fn test_apply_refresh_keeps_identity() {
        let profile = ProfileRow {
            role: Some("admin".to_string()),
            full_name: None,
        };
        let mut user = CurrentUser::from_session(&session(EXPIRING_SESSION), Some(&profile));
        user.obtained_at = 0;
        assert!(user.is_expired());

        let refreshed = session(
            r#"{"access_token": "token-789", "expires_in": 3600,
                "user": {"id": "2f1b6c1e-8f0a-4f7e-9a53-1f6a3c0b9d11"}}"#,
        );
        user.apply_refresh(&refreshed);
        assert_eq!(user.access_token(), "token-789");
        assert_eq!(user.refresh_token(), Some("refresh-456"));
        assert!(user.is_admin());
        assert!(!user.is_expired());
    }

    #[test]
    fn test_sessions_stored_before_refresh_support_still_load() {
        let stored = serde_json::json!({
            "id": "2f1b6c1e-8f0a-4f7e-9a53-1f6a3c0b9d11",
            "email": null,
            "role": "customer",
            "display_name": null,
            "provider": null,
            "access_token": "token-123"
        });
        let user: CurrentUser = serde_json::from_value(stored).unwrap();
        assert!(!user.is_expired());
        assert_eq!(user.refresh_token(), None);
    }

    #[test]
    fn test_survives_session_serialization() {
        let user = CurrentUser::from_session(&session(SESSION), None);
        let value = serde_json::to_value(&user).unwrap();
        let back: CurrentUser = serde_json::from_value(value).unwrap();
        assert_eq!(back.access_token(), "token-123");
        assert_eq!(back.id, user.id);
    }
}
