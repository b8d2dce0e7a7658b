//! Error types for the APOD wallpaper updater.
//!
//! Every pipeline stage owns a narrow error enum next to its code. This module
//! aggregates them into [`ApodError`], the type surfaced by the CLI.

use thiserror::Error;

use crate::apod::FetchError;
use crate::config::ConfigError;

/// Errors that can occur during application execution.
#[derive(Debug, Error)]
pub enum ApodError {
    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The metadata record could not be fetched.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    /// Scheduler registration failed.
    #[error("Schedule error: {0}")]
    Schedule(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err: ApodError = ConfigError::MissingCredential("NASA_API_KEY").into();
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("NASA_API_KEY"));
    }

    #[test]
    fn test_fetch_error_from_conversion() {
        let err: ApodError = FetchError::Status { status: 403, body: String::new() }.into();
        assert!(matches!(err, ApodError::Fetch(FetchError::Status { status: 403, .. })));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err: ApodError = io_err.into();
        assert!(matches!(err, ApodError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_schedule_error_display() {
        let err = ApodError::Schedule("crontab rejected the table".to_string());
        assert_eq!(err.to_string(), "Schedule error: crontab rejected the table");
    }

    #[test]
    fn test_error_is_debug() {
        let err = ApodError::Schedule("crontab missing".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Schedule"));
    }
}
