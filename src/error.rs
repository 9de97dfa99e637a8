//! Custom error types for the application.
//!
//! This module defines the primary error type, `RecorderError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the failures this system can actually produce.
//!
//! ## Error Hierarchy
//!
//! - **`Config`**: Wraps errors from the `config` crate, typically file parsing
//!   or format issues in the configuration files.
//! - **`Configuration`**: Semantic errors in configuration that pass parsing but
//!   are logically incorrect (an empty field name, a stream name that does not
//!   follow the namespace convention, a channel map that disagrees with the
//!   instrument's declaration). These are raised at construction time, never
//!   deferred.
//! - **`InvalidLogLevel`** / **`InvalidDataType`**: Rejections of caller-supplied
//!   values outside their allowed domains, also raised at construction time.
//! - **`UnknownStream`**: A usage error raised at call time when a measurement
//!   is requested for a stream name the instrument never declared.
//! - **`Instrument`** / **`Server`**: Failures crossing the device or telemetry
//!   boundary.
//!
//! By using `#[from]`, `RecorderError` can be seamlessly created from underlying
//! error types, simplifying error handling throughout the application with the
//! `?` operator.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, RecorderError>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("Invalid logging level '{0}': expected a level name or one of 10, 15, 20, 30, 40, 50")]
    InvalidLogLevel(String),

    #[error("Invalid stream data type '{0}': expected one of int, float, bool, str")]
    InvalidDataType(String),

    #[error("Stream name '{0}' is not a stream managed by this instrument")]
    UnknownStream(String),

    #[error("Stream '{0}' has nothing measured to post")]
    NothingMeasured(String),

    #[error("Instrument error: {0}")]
    Instrument(String),

    #[error("Origin server error: {0}")]
    Server(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RecorderError::Instrument("power meter timed out".to_string());
        assert_eq!(err.to_string(), "Instrument error: power meter timed out");
    }

    #[test]
    fn test_unknown_stream_display() {
        let err = RecorderError::UnknownStream("Hybrid_magnetometer".to_string());
        assert_eq!(
            err.to_string(),
            "Stream name 'Hybrid_magnetometer' is not a stream managed by this instrument"
        );
    }

    #[test]
    fn test_invalid_level_mentions_domain() {
        let err = RecorderError::InvalidLogLevel("verbose".to_string());
        assert!(err.to_string().contains("10, 15, 20, 30, 40, 50"));
    }
}
