//! Configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `CART_API_BASE_URL` | required |
//! | `CART_API_TOKEN` | unset |
//! | `CART_USER_ID` | unset |
//! | `CART_CACHE_PATH` | unset (in-memory cache) |
//! | `CART_ORDER_SETTLE_MS` | `300` |
//! | `CART_FORCE_REFRESH_MS` | `500` |
//! | `CART_CHANNEL_CAPACITY` | `32` |

use crate::cart_actor::SyncSettings;
use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart synchronizer configuration.
#[derive(Clone)]
pub struct SyncConfig {
    /// Root of the cart and order API, without a trailing slash
    pub api_base_url: String,
    /// Bearer token to sign in with at startup
    pub api_token: Option<SecretString>,
    /// Account id to sign in with at startup
    pub user_id: Option<String>,
    /// File to mirror the cart into
    pub cache_path: Option<PathBuf>,
    pub order_settle_delay: Duration,
    pub force_refresh_delay: Duration,
    /// Mailbox capacity of the cart actor
    pub channel_capacity: usize,
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("user_id", &self.user_id)
            .field("cache_path", &self.cache_path)
            .field("order_settle_delay", &self.order_settle_delay)
            .field("force_refresh_delay", &self.force_refresh_delay)
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CART_API_BASE_URL` is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = get_required_env(&lookup, "CART_API_BASE_URL")?;
        let api_token = get_optional_env(&lookup, "CART_API_TOKEN").map(SecretString::from);
        let user_id = get_optional_env(&lookup, "CART_USER_ID");
        let cache_path = get_optional_env(&lookup, "CART_CACHE_PATH").map(PathBuf::from);
        let order_settle_ms: u64 = get_parsed_or_default(&lookup, "CART_ORDER_SETTLE_MS", 300)?;
        let force_refresh_ms: u64 = get_parsed_or_default(&lookup, "CART_FORCE_REFRESH_MS", 500)?;
        let channel_capacity: usize = get_parsed_or_default(&lookup, "CART_CHANNEL_CAPACITY", 32)?;

        if channel_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CART_CHANNEL_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_token,
            user_id,
            cache_path,
            order_settle_delay: Duration::from_millis(order_settle_ms),
            force_refresh_delay: Duration::from_millis(force_refresh_ms),
            channel_capacity,
        })
    }

    pub fn settings(&self) -> SyncSettings {
        SyncSettings {
            order_settle_delay: self.order_settle_delay,
            force_refresh_delay: self.force_refresh_delay,
        }
    }
}

fn get_required_env(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    get_optional_env(lookup, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Empty values count as unset.
fn get_optional_env(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn get_parsed_or_default<T>(
    lookup: impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(lookup, key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
