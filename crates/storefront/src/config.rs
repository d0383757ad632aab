//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `PAYPAL_CLIENT_ID` / `PAYPAL_APP_SECRET` - Enable PayPal checkout
//! - `PAYPAL_API_URL` - PayPal REST base (default: sandbox)
//! - `STRIPE_SECRET_KEY` / `STRIPE_WEBHOOK_SECRET` - Enable Stripe checkout
//! - `STRIPE_API_URL` - Stripe REST base (default: <https://api.stripe.com>)
//! - `PAYMENT_METHODS` - Comma separated list (default: `PayPal, Stripe, CashOnDelivery`)
//! - `DEFAULT_PAYMENT_METHOD` - Preselected method (default: `PayPal`)
//! - `STORE_CURRENCY` - ISO code sent to processors (default: CAD)
//! - `PAGE_SIZE` - Rows per listing page (default: 12)
//! - `LATEST_PRODUCTS_LIMIT` - Products on the latest strip (default: 4)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use prostore_core::catalog::{LATEST_PRODUCTS_LIMIT, PAGE_SIZE};
use prostore_core::{CurrencyCode, PaymentMethod};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_PAYPAL_API_URL: &str = "https://api-m.sandbox.paypal.com";
const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
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
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// PayPal REST credentials, if PayPal checkout is enabled
    pub paypal: Option<PayPalConfig>,
    /// Stripe credentials, if card checkout is enabled
    pub stripe: Option<StripeConfig>,
    /// Catalog and checkout settings
    pub store: StoreConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// PayPal REST API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct PayPalConfig {
    /// API base URL (sandbox or live)
    pub api_url: Url,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for PayPalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPalConfig")
            .field("api_url", &self.api_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// API base URL
    pub api_url: Url,
    /// Secret API key (`sk_...`)
    pub secret_key: SecretString,
    /// Webhook endpoint signing secret (`whsec_...`)
    pub webhook_secret: SecretString,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_url", &self.api_url.as_str())
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

/// Catalog and checkout settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Payment methods offered at checkout
    pub payment_methods: Vec<PaymentMethod>,
    /// Method preselected for users who have not chosen one
    pub default_payment_method: PaymentMethod,
    /// Currency sent to payment processors
    pub currency: CurrencyCode,
    /// Rows per listing page
    pub page_size: u32,
    /// Products on the latest strip
    pub latest_products_limit: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            payment_methods: PaymentMethod::ALL.to_vec(),
            default_payment_method: PaymentMethod::default(),
            currency: CurrencyCode::default(),
            page_size: PAGE_SIZE,
            latest_products_limit: LATEST_PRODUCTS_LIMIT,
        }
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
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            paypal: PayPalConfig::from_env()?,
            stripe: StripeConfig::from_env()?,
            store: StoreConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PayPalConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(client_id) = get_optional_env("PAYPAL_CLIENT_ID") else {
            return Ok(None);
        };
        Ok(Some(Self {
            api_url: get_url("PAYPAL_API_URL", DEFAULT_PAYPAL_API_URL)?,
            client_id,
            client_secret: get_validated_secret("PAYPAL_APP_SECRET")?,
        }))
    }
}

impl StripeConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(secret_key) = get_optional_env("STRIPE_SECRET_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&secret_key, "STRIPE_SECRET_KEY")?;
        Ok(Some(Self {
            api_url: get_url("STRIPE_API_URL", DEFAULT_STRIPE_API_URL)?,
            secret_key: SecretString::from(secret_key),
            webhook_secret: get_validated_secret("STRIPE_WEBHOOK_SECRET")?,
        }))
    }
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let payment_methods = match get_optional_env("PAYMENT_METHODS") {
            Some(raw) => parse_payment_methods(&raw)?,
            None => defaults.payment_methods,
        };
        let default_payment_method: PaymentMethod =
            parse_env("DEFAULT_PAYMENT_METHOD", PaymentMethod::default().as_str())?;
        if !payment_methods.contains(&default_payment_method) {
            return Err(ConfigError::InvalidEnvVar(
                "DEFAULT_PAYMENT_METHOD".to_string(),
                format!("{default_payment_method} is not listed in PAYMENT_METHODS"),
            ));
        }

        Ok(Self {
            payment_methods,
            default_payment_method,
            currency: parse_env("STORE_CURRENCY", CurrencyCode::default().code())?,
            page_size: parse_env("PAGE_SIZE", &defaults.page_size.to_string())?,
            latest_products_limit: parse_env(
                "LATEST_PRODUCTS_LIMIT",
                &defaults.latest_products_limit.to_string(),
            )?,
        })
    }

    /// Whether `method` is offered at checkout.
    #[must_use]
    pub fn accepts(&self, method: PaymentMethod) -> bool {
        self.payment_methods.contains(&method)
    }
}

fn parse_payment_methods(raw: &str) -> Result<Vec<PaymentMethod>, ConfigError> {
    let methods = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PaymentMethod::from_str)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::InvalidEnvVar("PAYMENT_METHODS".to_string(), e))?;

    if methods.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "PAYMENT_METHODS".to_string(),
            "at least one payment method is required".to_string(),
        ));
    }
    Ok(methods)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if unset.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value does not parse.
pub fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn get_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    parse_env(key, default)
}

/// Validate that a session secret meets minimum length requirements.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` if the secret is too short.
pub fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
///
/// # Errors
///
/// Returns `ConfigError` if unset, a placeholder, or low entropy.
pub fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_placeholder_secrets_rejected() {
        for placeholder in ["your-paypal-secret", "changeme123", "sk_test_xxxxxxxxxxxx"] {
            assert!(matches!(
                validate_secret_strength(placeholder, "TEST_VAR"),
                Err(ConfigError::InsecureSecret(_, _))
            ));
        }
    }

    #[test]
    fn test_random_secret_accepted() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "S").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(32)), "S").is_ok());
    }

    #[test]
    fn test_parse_payment_methods() {
        let methods = parse_payment_methods("PayPal, Stripe").unwrap();
        assert_eq!(methods, vec![PaymentMethod::PayPal, PaymentMethod::Stripe]);
        assert!(parse_payment_methods("PayPal, Bitcoin").is_err());
        assert!(parse_payment_methods(" , ").is_err());
    }

    #[test]
    fn test_store_defaults() {
        let store = StoreConfig::default();
        assert_eq!(store.page_size, 12);
        assert_eq!(store.latest_products_limit, 4);
        assert_eq!(store.currency, CurrencyCode::CAD);
        assert!(store.accepts(PaymentMethod::CashOnDelivery));
    }

    #[test]
    fn test_payment_configs_redact_secrets() {
        let paypal = PayPalConfig {
            api_url: Url::parse(DEFAULT_PAYPAL_API_URL).unwrap(),
            client_id: "client_id_value".to_string(),
            client_secret: SecretString::from("super_secret_paypal"),
        };
        let stripe = StripeConfig {
            api_url: Url::parse(DEFAULT_STRIPE_API_URL).unwrap(),
            secret_key: SecretString::from("sk_live_super_secret"),
            webhook_secret: SecretString::from("whsec_super_secret"),
        };

        let debug_output = format!("{paypal:?} {stripe:?}");
        assert!(debug_output.contains("client_id_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret"));
    }
}
