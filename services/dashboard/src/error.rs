//! services/dashboard/src/error.rs
//!
//! Defines the primary error type for the dashboard service.

use crate::config::ConfigError;
use jaison_core::ports::PortError;
use jaison_core::result::ResultError;
use jaison_core::session::SessionError;

/// The primary error type for the `dashboard` service.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("{0}")]
    Port(#[from] PortError),

    /// Represents a session operation failure, already phrased for the user.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// A completed job whose extracted data could not be read.
    #[error("{0}")]
    Result(#[from] ResultError),

    /// A processing job that ended without usable data.
    #[error("{0}")]
    Processing(String),

    #[error("One or more services are unavailable")]
    Unhealthy,

    #[error("You are not logged in. Run `jaison auth login` first.")]
    NotLoggedIn,

    #[error("No API key configured. Set JAISON_API_KEY or run `keys use <secret>` in the shell.")]
    MissingApiKey,

    /// Represents an error building the underlying HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a malformed JSON document supplied by the user.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Represents a standard Input/Output error (e.g., reading a file to upload).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_keep_the_backend_wording() {
        let err = DashboardError::from(PortError::Unauthorized(Some("API key is inactive".to_string())));
        assert!(matches!(err, DashboardError::Port(_)));
        assert_eq!(err.to_string(), "API key is inactive");
    }

    #[test]
    fn user_supplied_json_errors_are_labelled() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = DashboardError::from(parse);
        assert!(matches!(err, DashboardError::Json(_)));
        assert!(err.to_string().starts_with("Invalid JSON: "));
    }
}
