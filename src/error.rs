//! Error types for the MarketBasket engine
//!
//! This module provides the crate-wide error hierarchy:
//! - `thiserror` for ergonomic error definitions
//! - Domain-specific variants for actionable error handling
//! - Proper error context and source chaining
//!
//! Note that "no rule matched this basket" is deliberately *not* an error:
//! the recommendation engine resolves it through the popularity fallback.

use std::borrow::Cow;
use thiserror::Error;

/// Result type alias for MarketBasket operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the MarketBasket engine
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Configuration error: {message}")]
    Config {
        message: Cow<'static, str>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        key: &'static str,
        message: Cow<'static, str>,
    },

    // ========================================================================
    // Threshold Errors
    // ========================================================================
    #[error("Invalid threshold {name}={value}: {message}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        message: Cow<'static, str>,
    },

    // ========================================================================
    // Input Errors
    // ========================================================================
    #[error("Malformed input at {location}: {message}")]
    MalformedInput {
        location: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("Unknown item id {item}: not in catalog range {min}..={max}")]
    UnknownItem { item: u32, min: u32, max: u32 },

    // ========================================================================
    // I/O and Serialization Errors
    // ========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    // ========================================================================
    // Constructors for common error patterns
    // ========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid threshold error
    pub fn invalid_threshold(
        name: &'static str,
        value: f64,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidThreshold {
            name,
            value,
            message: message.into(),
        }
    }

    /// Create a malformed input error
    pub fn malformed(
        location: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::MalformedInput {
            location: location.into(),
            message: message.into(),
        }
    }

    // ========================================================================
    // Error Classification
    // ========================================================================

    /// Returns true if this error was caused by bad caller input
    /// (as opposed to an environment/I/O failure)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidThreshold { .. }
                | Error::MalformedInput { .. }
                | Error::UnknownItem { .. }
                | Error::InvalidConfig { .. }
        )
    }

    /// Get error code for logs and structured reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } | Error::InvalidConfig { .. } => "CONFIG_ERROR",
            Error::InvalidThreshold { .. } => "INVALID_THRESHOLD",
            Error::MalformedInput { .. } => "MALFORMED_INPUT",
            Error::UnknownItem { .. } => "UNKNOWN_ITEM",
            Error::Io(_) => "IO_ERROR",
            Error::Csv(_) | Error::Json(_) => "SERIALIZATION_ERROR",
            Error::Other(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(Error::invalid_threshold("min_support", 0.0, "must be > 0").is_input_error());
        assert!(Error::malformed("line 3", "missing consequent").is_input_error());
        assert!(Error::UnknownItem {
            item: 99,
            min: 1,
            max: 48
        }
        .is_input_error());
        assert!(
            !Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")).is_input_error()
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::invalid_threshold("min_support", -1.0, "out of range").error_code(),
            "INVALID_THRESHOLD"
        );
        assert_eq!(
            Error::malformed("baskets.csv:2", "empty basket").error_code(),
            "MALFORMED_INPUT"
        );
        assert_eq!(Error::config("missing data dir").error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_threshold_error_display() {
        let err = Error::invalid_threshold("min_support", 0.0, "must be in (0, 1]");
        let msg = err.to_string();
        assert!(msg.contains("min_support"));
        assert!(msg.contains("must be in (0, 1]"));
    }
}
