//! Unified error handling for the carousel crate
//!
//! Domain-specific errors (controller, store, configuration) stay usable on
//! their own; this module consolidates them into a single [`Error`] enum for
//! use across module boundaries, with a coarse [`ErrorCategory`] and a
//! recoverability hint for callers that degrade instead of aborting.

use std::io;
use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::controller::ControllerError;
pub use crate::models::ValidationError;
pub use crate::store::StoreError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Resource controller (host) failures
    Controller,
    /// Persistence failures
    Storage,
    /// Configuration loading/validation failures
    Config,
    /// Network failures
    Network,
    /// Scheduler lifecycle failures
    Scheduler,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the carousel crate
#[derive(Error, Debug)]
pub enum Error {
    /// Resource controller errors
    #[error("controller error: {0}")]
    Controller(#[from] ControllerError),

    /// State store errors
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Standalone validation errors
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Scheduler lifecycle errors
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a scheduler lifecycle error
    pub fn scheduler(msg: impl Into<String>) -> Self {
        Self::Scheduler(msg.into())
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Controller(_) => ErrorCategory::Controller,
            Self::Store(_) => ErrorCategory::Storage,
            Self::Config(ConfigError::Fetch { .. }) | Self::Http(_) => ErrorCategory::Network,
            Self::Config(_) | Self::Validation(_) => ErrorCategory::Config,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Json(_) => ErrorCategory::Config,
            Self::Io(_) => ErrorCategory::Storage,
        }
    }

    /// Check if this error is recoverable (rotation can keep running)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Host and network hiccups are transient by nature.
            Self::Controller(_) | Self::Http(_) => true,
            Self::Config(ConfigError::Fetch { .. }) => true,
            Self::Io(_) => true,
            Self::Store(_) => false,
            Self::Config(_) | Self::Validation(_) => false,
            Self::Scheduler(_) => false,
            Self::Json(_) => false,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ResourceId;

    #[test]
    fn test_error_category() {
        let controller = Error::Controller(ControllerError::UnknownResource(ResourceId(1)));
        assert_eq!(controller.category(), ErrorCategory::Controller);

        let validation = Error::Validation(ValidationError {
            errors: vec!["pages[0].url must be a non-empty string.".into()],
        });
        assert_eq!(validation.category(), ErrorCategory::Config);

        let scheduler = Error::scheduler("shut down");
        assert_eq!(scheduler.category(), ErrorCategory::Scheduler);
    }

    #[test]
    fn test_is_recoverable() {
        let controller = Error::Controller(ControllerError::Other("host busy".into()));
        assert!(controller.is_recoverable());

        let validation = Error::Validation(ValidationError {
            errors: vec!["bad".into()],
        });
        assert!(!validation.is_recoverable());
    }

    #[test]
    fn test_conversions() {
        let store_err: Error = StoreError::Other("oops".into()).into();
        assert!(matches!(store_err, Error::Store(_)));

        let config_err: Error = ConfigError::Missing("localConfig").into();
        assert!(matches!(config_err, Error::Config(_)));
    }
}
