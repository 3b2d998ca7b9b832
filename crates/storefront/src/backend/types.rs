//! Wire types for the backend's auth, table and storage APIs.

use boutique_core::ProductId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Auth Types
// ─────────────────────────────────────────────────────────────────────────────

/// Session returned by a successful sign-in or code exchange.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    /// Bearer token for user-scoped requests.
    pub access_token: String,
    /// Token for obtaining a new access token.
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: Option<i64>,
    /// The signed-in user.
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish()
    }
}

/// A user as known to the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AuthUser {
    /// Name to greet the user with, if the provider supplied one.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        self.user_metadata
            .full_name
            .clone()
            .or_else(|| self.user_metadata.name.clone())
            .filter(|n| !n.trim().is_empty())
    }
}

/// Provider-controlled metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppMetadata {
    /// `email` for password accounts, the provider name otherwise.
    pub provider: Option<String>,
}

/// User-editable metadata; federated providers fill in the name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
    pub name: Option<String>,
}

/// Result of a sign-up request.
///
/// Projects with email confirmation turned off answer with a session; the
/// others answer with the new user and send a confirmation email.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    PendingConfirmation(AuthUser),
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct PkceExchange<'a> {
    pub auth_code: &'a str,
    pub code_verifier: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Table Types
// ─────────────────────────────────────────────────────────────────────────────

/// A row of the products table.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sold: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Column values written when creating or editing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub subcategory: Option<String>,
    pub availability: Option<String>,
    /// `None` leaves the stored image untouched on update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub sold: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct SoldPatch {
    pub sold: bool,
}

/// A row of the profiles table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileRow {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_row_from_table_json() {
        let json = r#"{
            "id": 12,
            "title": "Linen Shirt",
            "description": null,
            "price": 49.5,
            "category": "Clothing",
            "subcategory": "Shirts",
            "availability": "Ships in 2 days",
            "image_url": "https://cdn.test/p.jpg",
            "sold": false,
            "created_at": "2024-05-01T10:00:00+00:00"
        }"#;
        let row: ProductRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.id, ProductId::new(12));
        assert_eq!(row.price, Decimal::new(495, 1));
        assert!(row.description.is_none());
        assert!(row.created_at.is_some());
    }

    #[test]
    fn test_product_row_defaults_missing_columns() {
        let row: ProductRow = serde_json::from_str(r#"{"id":1,"title":"Scarf","price":10}"#).unwrap();
        assert!(!row.sold);
        assert!(row.category.is_none());
    }

    #[test]
    fn test_product_input_skips_unchanged_image() {
        let input = ProductInput {
            title: "Scarf".to_string(),
            description: String::new(),
            price: Decimal::new(1000, 2),
            category: "Accessories".to_string(),
            subcategory: None,
            availability: None,
            image_url: None,
            sold: false,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert!(value.get("image_url").is_none());
        assert_eq!(value["price"], "10.00");
        assert!(value["subcategory"].is_null());
    }

    #[test]
    fn test_sign_up_outcome_variants() {
        let pending: SignUpOutcome = serde_json::from_str(
            r#"{"id":"2f1b6c1e-8f0a-4f7e-9a53-1f6a3c0b9d11","email":"a@b.c"}"#,
        )
        .unwrap();
        assert!(matches!(pending, SignUpOutcome::PendingConfirmation(_)));

        let signed_in: SignUpOutcome = serde_json::from_str(
            r#"{"access_token":"t","expires_in":3600,
                "user":{"id":"2f1b6c1e-8f0a-4f7e-9a53-1f6a3c0b9d11","email":"a@b.c",
                        "app_metadata":{"provider":"email"}}}"#,
        )
        .unwrap();
        assert!(matches!(signed_in, SignUpOutcome::SignedIn(_)));
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let user: AuthUser = serde_json::from_str(
            r#"{"id":"2f1b6c1e-8f0a-4f7e-9a53-1f6a3c0b9d11",
                "user_metadata":{"full_name":"Ada Lovelace","name":"ada"}}"#,
        )
        .unwrap();
        assert_eq!(user.display_name().as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_auth_session_debug_redacts_tokens() {
        let session: AuthSession = serde_json::from_str(
            r#"{"access_token":"very-secret","refresh_token":"also-secret",
                "user":{"id":"2f1b6c1e-8f0a-4f7e-9a53-1f6a3c0b9d11"}}"#,
        )
        .unwrap();
        let debug = format!("{session:?}");
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("also-secret"));
    }
}
