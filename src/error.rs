//! Error types
//!
//! The animation core never fails at runtime; only loading configuration can.

use thiserror::Error;

/// Errors raised while loading or validating [`Settings`](crate::Settings)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        ConfigError::Invalid { field, reason }
    }
}
