//! Error types for the analyzer
//!
//! Only structural problems surface as errors: a bad configuration or an
//! input container that is not a sequence. Defects in individual records are
//! counted by the validator and never reach this type.

use thiserror::Error;

/// Analyzer error types
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// A configuration value failed validation
    #[error("Invalid configuration `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The input container itself is unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Layered configuration could not be read or deserialized
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyzerError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        AnalyzerError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;
