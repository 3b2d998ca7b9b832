//! Integration tests for the Boutique storefront.
//!
//! The tests drive a running storefront over HTTP and are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the storefront against a backend project
//! cargo run -p boutique-storefront
//!
//! # Run integration tests
//! cargo test -p boutique-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `STOREFRONT_BASE_URL` - defaults to `http://localhost:3000`
//! - `TEST_PRODUCT_ID` - an unsold product, for the bag tests
//! - `TEST_CUSTOMER_EMAIL` / `TEST_CUSTOMER_PASSWORD` - a confirmed customer

use boutique_core::ProductId;
use reqwest::{Client, redirect};

/// Base URL of the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// A visitor: a cookie-keeping client that does not follow redirects, so
/// tests can assert on `Location`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn visitor() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Product used by the bag tests, from `TEST_PRODUCT_ID`.
#[must_use]
pub fn test_product_id() -> Option<ProductId> {
    std::env::var("TEST_PRODUCT_ID")
        .ok()
        .and_then(|id| id.trim().parse::<i64>().ok())
        .map(ProductId::new)
}

/// Credentials of a confirmed customer account, if configured.
#[must_use]
pub fn customer_credentials() -> Option<(String, String)> {
    let email = std::env::var("TEST_CUSTOMER_EMAIL").ok()?;
    let password = std::env::var("TEST_CUSTOMER_PASSWORD").ok()?;
    Some((email, password))
}

/// `Location` header of a response, or an empty string.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
