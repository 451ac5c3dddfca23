//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SELLER_CONSOLE_API_BASE_URL` - Base URL of the order backend
//!
//! ## Optional
//! - `SELLER_CONSOLE_API_TOKEN` - Bearer token for backend requests
//! - `SELLER_CONSOLE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SELLER_CONSOLE_EXCHANGE_RATE` - USD to INR rate used for profit (default: 84)
//! - `SELLER_CONSOLE_COMMISSION_RATE` - Marketplace commission rate (default: 0.15)

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use seller_console_core::ProfitConfig;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Console configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct ConsoleConfig {
    /// Backend base URL
    pub api_base_url: Url,
    /// Bearer token, if one is configured
    pub api_token: Option<SecretString>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Profit calculation parameters
    pub profit: ProfitConfig,
}

impl std::fmt::Debug for ConsoleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .field("profit", &self.profit)
            .finish()
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_env::<Url>(
            "SELLER_CONSOLE_API_BASE_URL",
            &get_required_env("SELLER_CONSOLE_API_BASE_URL")?,
        )?;
        let api_token = get_optional_env("SELLER_CONSOLE_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);
        let timeout_secs = parse_env::<u64>(
            "SELLER_CONSOLE_REQUEST_TIMEOUT_SECS",
            &get_env_or_default(
                "SELLER_CONSOLE_REQUEST_TIMEOUT_SECS",
                &DEFAULT_TIMEOUT_SECS.to_string(),
            ),
        )?;
        let exchange_rate = parse_rate(
            "SELLER_CONSOLE_EXCHANGE_RATE",
            ProfitConfig::DEFAULT_EXCHANGE_RATE,
        )?;
        let commission_rate = parse_rate(
            "SELLER_CONSOLE_COMMISSION_RATE",
            ProfitConfig::DEFAULT_COMMISSION_RATE,
        )?;
        if commission_rate > Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "SELLER_CONSOLE_COMMISSION_RATE".to_string(),
                "must be between 0 and 1".to_string(),
            ));
        }

        Ok(Self {
            api_base_url,
            api_token,
            request_timeout: Duration::from_secs(timeout_secs),
            profit: ProfitConfig {
                exchange_rate,
                commission_rate,
            },
        })
    }

    /// Configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            api_token: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            profit: ProfitConfig::default(),
        }
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
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a non-negative decimal rate, falling back to `default` when unset.
fn parse_rate(key: &str, default: Decimal) -> Result<Decimal, ConfigError> {
    let Some(value) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = parse_env::<Decimal>(key, &value)?;
    if rate.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(rate)
}
