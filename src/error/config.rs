// Configuration validation errors

use crate::error::ErrorCode;
use std::fmt;

/// Configuration error code constants
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// A configuration field holds an unusable value
    pub const INVALID: i32 = 4001;
}

/// Raised by `AppConfig::validate` when a loaded value cannot drive the monitor
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::Invalid { .. } => ConfigErrorCodes::INVALID,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::Invalid { field, reason } => {
                format!("Invalid config value for {}: {}", field, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
