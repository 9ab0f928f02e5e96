//! Shell configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GAMEKART_BASE_URL` - Public URL of the shell
//! - `GAMEKART_BACKEND_URL` - REST backend base URL
//!
//! ## Optional
//! - `GAMEKART_HOST` - Bind address (default: 127.0.0.1)
//! - `GAMEKART_PORT` - Listen port (default: 3000)
//! - `GAMEKART_BACKEND_PUBLIC_URL` - Backend URL as seen by browsers (default: backend URL)
//! - `GAMEKART_BACKEND_SESSION_COOKIE` - Backend session cookie name (default: connect.sid)
//! - `GAMEKART_BACKEND_TIMEOUT_SECS` - Timeout for every backend call (default: 15)
//! - `GAMEKART_FREE_SHIPPING_THRESHOLD` - Subtotal that ships free (default: 10000)
//! - `GAMEKART_FLAT_SHIPPING_FEE` - Shipping below the threshold (default: 99)
//! - `GAMEKART_TAX_RATE` - Tax as a fraction of the subtotal (default: 0.18)
//! - `GAMEKART_CURRENCY` - ISO 4217 code (default: INR)
//! - `GAMEKART_CURRENCY_PRECISION` - Decimal places for money (default: 2)
//! - `GAMEKART_PROJECTION_TTL_SECS` - Order list cache lifetime (default: 60)
//! - `GAMEKART_IDENTITY_TTL_SECS` - Resolved identity cache lifetime (default: 30)
//! - `GAMEKART_CATALOG_PATH` - Product catalog JSON (default: crates/web/catalog.json)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

use gamekart_core::{CurrencyCode, PricingConfig};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where the REST backend lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL the shell calls.
    pub url: Url,
    /// Base URL browsers are sent to (Google sign-in).
    pub public_url: Url,
    /// Name of the backend's session cookie.
    pub session_cookie: String,
    pub timeout: Duration,
}

/// Web shell configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the shell
    pub base_url: String,
    pub backend: BackendConfig,
    pub pricing: PricingConfig,
    pub projection_ttl: Duration,
    pub identity_ttl: Duration,
    pub catalog_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let base_url = env.required("GAMEKART_BASE_URL")?;
        env.parse_value::<Url>("GAMEKART_BASE_URL", &base_url)?;

        let backend_url: Url = env.parse_value(
            "GAMEKART_BACKEND_URL",
            &env.required("GAMEKART_BACKEND_URL")?,
        )?;
        let backend_public_url = match env.optional("GAMEKART_BACKEND_PUBLIC_URL") {
            Some(value) => env.parse_value("GAMEKART_BACKEND_PUBLIC_URL", &value)?,
            None => backend_url.clone(),
        };

        let pricing = PricingConfig {
            free_shipping_threshold: env.parse_or("GAMEKART_FREE_SHIPPING_THRESHOLD", "10000")?,
            flat_shipping_fee: env.parse_or("GAMEKART_FLAT_SHIPPING_FEE", "99")?,
            tax_rate: env.parse_or::<Decimal>("GAMEKART_TAX_RATE", "0.18")?,
            currency: env.parse_or::<CurrencyCode>("GAMEKART_CURRENCY", "INR")?,
            precision: env.parse_or("GAMEKART_CURRENCY_PRECISION", "2")?,
        };
        pricing.validate().map_err(|e| {
            ConfigError::InvalidEnvVar("GAMEKART_PRICING".to_string(), e.to_string())
        })?;

        Ok(Self {
            host: env.parse_or("GAMEKART_HOST", "127.0.0.1")?,
            port: env.parse_or("GAMEKART_PORT", "3000")?,
            base_url,
            backend: BackendConfig {
                url: backend_url,
                public_url: backend_public_url,
                session_cookie: env.or_default("GAMEKART_BACKEND_SESSION_COOKIE", "connect.sid"),
                timeout: env.seconds("GAMEKART_BACKEND_TIMEOUT_SECS", "15")?,
            },
            pricing,
            projection_ttl: env.seconds("GAMEKART_PROJECTION_TTL_SECS", "60")?,
            identity_ttl: env.seconds("GAMEKART_IDENTITY_TTL_SECS", "30")?,
            catalog_path: PathBuf::from(
                env.or_default("GAMEKART_CATALOG_PATH", "crates/web/catalog.json"),
            ),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the shell is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; blank counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_value<T>(&self, key: &str, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.parse_value(key, &self.or_default(key, default))
    }

    fn seconds(&self, key: &str, default: &str) -> Result<Duration, ConfigError> {
        let secs: u64 = self.parse_or(key, default)?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be at least 1 second".to_string(),
            ));
        }
        Ok(Duration::from_secs(secs))
    }
}
