//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOUTIQUE_BASE_URL` - Public URL for the storefront (used for OAuth redirects)
//! - `BACKEND_URL` - Base URL of the backend-as-a-service project
//! - `BACKEND_ANON_KEY` - Public (anon) API key of the backend project
//!
//! ## Optional
//! - `BOUTIQUE_HOST` - Bind address (default: 127.0.0.1)
//! - `BOUTIQUE_PORT` - Listen port (default: 3000)
//! - `BOUTIQUE_STORE_NAME` - Store name shown in the header (default: Boutique)
//! - `BOUTIQUE_CURRENCY` - ISO currency of catalog prices (default: USD)
//! - `BOUTIQUE_CATALOG_TTL_SECS` - Product list cache lifetime (default: 60)
//! - `BACKEND_PRODUCTS_TABLE` - Products table (default: products)
//! - `BACKEND_PROFILES_TABLE` - Profiles table (default: profiles)
//! - `BACKEND_STORAGE_BUCKET` - Bucket for product images (default: product-images)
//! - `BACKEND_OAUTH_PROVIDERS` - Comma-separated federated login providers (default: google)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use boutique_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront (no trailing slash)
    pub base_url: String,
    /// Store-facing settings
    pub store: StoreConfig,
    /// Backend-as-a-service settings
    pub backend: BackendConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Store presentation settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name shown in the header and page titles
    pub name: String,
    /// Currency every catalog price is expressed in
    pub currency: CurrencyCode,
    /// How long a fetched product list is served before refetching
    pub catalog_ttl: Duration,
}

/// Backend-as-a-service configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project base URL (no trailing slash)
    pub url: String,
    /// Public anon key, sent as `apikey` on every request
    pub anon_key: SecretString,
    /// Products table name
    pub products_table: String,
    /// Profiles table name
    pub profiles_table: String,
    /// Storage bucket holding product images
    pub storage_bucket: String,
    /// Allowed federated login providers
    pub oauth_providers: Vec<String>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("products_table", &self.products_table)
            .field("profiles_table", &self.profiles_table)
            .field("storage_bucket", &self.storage_bucket)
            .field("oauth_providers", &self.oauth_providers)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("BOUTIQUE_HOST", "127.0.0.1")?;
        let port = parse_env("BOUTIQUE_PORT", "3000")?;
        let base_url = get_url("BOUTIQUE_BASE_URL")?;

        Ok(Self {
            host,
            port,
            base_url,
            store: StoreConfig::from_env()?,
            backend: BackendConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_secs: u64 = parse_env("BOUTIQUE_CATALOG_TTL_SECS", "60")?;
        let currency = get_env_or_default("BOUTIQUE_CURRENCY", "USD")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOUTIQUE_CURRENCY".to_string(), e))?;

        Ok(Self {
            name: get_env_or_default("BOUTIQUE_STORE_NAME", "Boutique"),
            currency,
            catalog_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: get_url("BACKEND_URL")?,
            anon_key: get_validated_secret("BACKEND_ANON_KEY")?,
            products_table: get_env_or_default("BACKEND_PRODUCTS_TABLE", "products"),
            profiles_table: get_env_or_default("BACKEND_PROFILES_TABLE", "profiles"),
            storage_bucket: get_env_or_default("BACKEND_STORAGE_BUCKET", "product-images"),
            oauth_providers: parse_provider_list(&get_env_or_default(
                "BACKEND_OAUTH_PROVIDERS",
                "google",
            )),
        })
    }

    /// Whether `provider` is on the federated login allow-list.
    #[must_use]
    pub fn allows_provider(&self, provider: &str) -> bool {
        self.oauth_providers.iter().any(|p| p == provider)
    }

    /// Origin (scheme, host, port) of the backend, used in the CSP header.
    #[must_use]
    pub fn origin(&self) -> String {
        Url::parse(&self.url).map_or_else(
            |_| self.url.clone(),
            |url| url.origin().ascii_serialization(),
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a required absolute http(s) URL, normalized without a trailing slash.
fn get_url(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    normalize_url(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

fn normalize_url(value: &str) -> Result<String, String> {
    let url = Url::parse(value.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Split a comma-separated provider list into lower-cased, de-duplicated names.
fn parse_provider_list(value: &str) -> Vec<String> {
    let mut providers: Vec<String> = Vec::new();
    for name in value.split(',').map(|s| s.trim().to_ascii_lowercase()) {
        if !name.is_empty() && !providers.contains(&name) {
            providers.push(name);
        }
    }
    providers
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a key is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the backend dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
