//! services/dashboard/src/config.rs
//!
//! Defines the dashboard's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub admin_api_url: String,
    pub ocr_api_url: String,
    pub api_key: Option<String>,
    pub credentials_path: PathBuf,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub max_upload_bytes: u64,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Backend endpoints ---
        let admin_api_url = base_url(&lookup, "ADMIN_API_URL", "http://localhost:8421")?;
        let ocr_api_url = base_url(&lookup, "OCR_API_URL", "http://localhost:8420")?;

        let api_key = lookup("JAISON_API_KEY").filter(|k| !k.trim().is_empty());

        let credentials_path = match lookup("JAISON_CREDENTIALS_PATH") {
            Some(path) => PathBuf::from(path),
            None => lookup("HOME")
                .map(|home| PathBuf::from(home).join(".jaison").join("credentials"))
                .ok_or_else(|| ConfigError::MissingVar("JAISON_CREDENTIALS_PATH".to_string()))?,
        };

        // --- Timing and limits ---
        let poll_interval = Duration::from_millis(number(&lookup, "POLL_INTERVAL_MS", 2000)?);
        let request_timeout = Duration::from_secs(number(&lookup, "REQUEST_TIMEOUT_SECS", 30)?);
        let max_upload_bytes = number(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "WARN".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            admin_api_url,
            ocr_api_url,
            api_key,
            credentials_path,
            poll_interval,
            request_timeout,
            max_upload_bytes,
            log_level,
        })
    }
}

fn base_url(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<String, ConfigError> {
    let url = lookup(key).unwrap_or_else(|| default.to_string());
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not an http(s) URL", url),
        ));
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn number(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::InvalidValue(
                key.to_string(),
                format!("'{}' is not a positive integer", raw),
            )),
            Ok(value) => Ok(value),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_backends() {
        let config = Config::from_lookup(lookup(&[("HOME", "/home/ada")])).unwrap();
        assert_eq!(config.admin_api_url, "http://localhost:8421");
        assert_eq!(config.ocr_api_url, "http://localhost:8420");
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.credentials_path, PathBuf::from("/home/ada/.jaison/credentials"));
        assert_eq!(config.log_level, Level::WARN);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("ADMIN_API_URL", "https://admin.example.com/"),
            ("JAISON_API_KEY", "jk_123"),
            ("JAISON_CREDENTIALS_PATH", "/tmp/creds"),
            ("POLL_INTERVAL_MS", "500"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.admin_api_url, "https://admin.example.com");
        assert_eq!(config.api_key.as_deref(), Some("jk_123"));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup(&[("HOME", "/h"), ("POLL_INTERVAL_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "POLL_INTERVAL_MS"));

        let err = Config::from_lookup(lookup(&[("HOME", "/h"), ("OCR_API_URL", "localhost:8420")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "OCR_API_URL"));

        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }
}
