//! Estimator configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ESTIMATOR_API_BASE_URL` - Catalog service base URL (default: `https://mdinteriorchoice.com/api`)
//! - `ESTIMATOR_API_TOKEN` - Bearer token sent with every catalog request
//! - `ESTIMATOR_SESSION_FILE` - Where the logged-in identity is kept (default: `.md-estimator/session.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Catalog service used when `ESTIMATOR_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "https://mdinteriorchoice.com/api";

/// Session file used when `ESTIMATOR_SESSION_FILE` is not set.
pub const DEFAULT_SESSION_FILE: &str = ".md-estimator/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Estimator application configuration.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Remote catalog service configuration
    pub catalog: CatalogConfig,
    /// File holding the persisted session identity
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Remote catalog service configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL the `/items` endpoints hang off
    pub base_url: Url,
    /// Optional bearer token
    pub api_token: Option<SecretString>,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl EstimatorConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let catalog = CatalogConfig::from_env()?;
        let session_file =
            PathBuf::from(get_env_or_default("ESTIMATOR_SESSION_FILE", DEFAULT_SESSION_FILE));

        Ok(Self {
            catalog,
            session_file,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl CatalogConfig {
    /// Build a configuration for the given base URL without a token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("ESTIMATOR_API_BASE_URL", base_url)?,
            api_token: None,
        })
    }

    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_env_or_default("ESTIMATOR_API_BASE_URL", DEFAULT_API_BASE_URL);
        let api_token = get_optional_env("ESTIMATOR_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);

        Ok(Self {
            base_url: parse_base_url("ESTIMATOR_API_BASE_URL", &base_url)?,
            api_token,
        })
    }

    /// URL of the item collection, e.g. `https://host/api/items`.
    #[must_use]
    pub fn items_url(&self) -> String {
        format!("{}/items", self.base_url.as_str().trim_end_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and check a base URL.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_items_url_without_trailing_slash() {
        let config = CatalogConfig::new("https://mdinteriorchoice.com/api").unwrap();
        assert_eq!(config.items_url(), "https://mdinteriorchoice.com/api/items");
    }

    #[test]
    fn test_items_url_with_trailing_slash() {
        let config = CatalogConfig::new("http://127.0.0.1:8080/").unwrap();
        assert_eq!(config.items_url(), "http://127.0.0.1:8080/items");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            CatalogConfig::new("not a url"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            CatalogConfig::new("ftp://example.org/api"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_catalog_config_debug_redacts_token() {
        let mut config = CatalogConfig::new("https://mdinteriorchoice.com/api").unwrap();
        config.api_token = Some(SecretString::from("super_secret_catalog_token"));

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("mdinteriorchoice.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_catalog_token"));
    }
}
