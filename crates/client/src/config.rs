//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PHARMACY_API_URL` - Backend base URL (default: `http://localhost:5000/api`)
//! - `PHARMACY_SESSION_FILE` - Session store path (default: `.pharmacy-session.json`)
//! - `PHARMACY_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `PHARMACY_SIGNUP_PASSWORD_POLICY` - `lenient` or `strict` (default: lenient)
//! - `PHARMACY_SIGNUP_EMAIL_POLICY` - `shape` or `reject-disposable` (default: shape)
//! - `PHARMACY_SIGNUP_PHONE_POLICY` - `presence` or `ethiopian` (default: presence)
//! - `PHARMACY_LOG_JSON` - Emit JSON logs when set to a truthy value
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::signup::SignupPolicy;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_SESSION_FILE: &str = ".pharmacy-session.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API root
    pub api_url: Url,
    /// Where the session store lives
    pub session_file: PathBuf,
    /// Timeout for every backend request
    pub http_timeout: Duration,
    /// Strictness of the signup wizard's field checks
    pub signup_policy: SignupPolicy,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` naming the first bad variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url: Url = parse_var(
            "PHARMACY_API_URL",
            &get("PHARMACY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "PHARMACY_API_URL".to_string(),
                format!("unsupported scheme '{}'", api_url.scheme()),
            ));
        }

        let session_file = get("PHARMACY_SESSION_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

        let timeout_secs: u64 = get("PHARMACY_HTTP_TIMEOUT_SECS")
            .map(|value| parse_var("PHARMACY_HTTP_TIMEOUT_SECS", &value))
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PHARMACY_HTTP_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let signup_policy = SignupPolicy {
            email: optional_var(&get, "PHARMACY_SIGNUP_EMAIL_POLICY")?.unwrap_or_default(),
            password: optional_var(&get, "PHARMACY_SIGNUP_PASSWORD_POLICY")?.unwrap_or_default(),
            phone: optional_var(&get, "PHARMACY_SIGNUP_PHONE_POLICY")?.unwrap_or_default(),
        };

        let log_json = get("PHARMACY_LOG_JSON").is_some_and(|value| is_truthy(&value));

        Ok(Self {
            api_url,
            session_file,
            http_timeout: Duration::from_secs(timeout_secs),
            signup_policy,
            log_json,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn optional_var<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key).map(|value| parse_var(key, &value)).transpose()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
