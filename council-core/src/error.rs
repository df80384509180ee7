//! Error types for the Council synthesis core.
//!
//! Uses `thiserror` for public API error types. The judging pipeline itself is
//! total: only weighted aggregation over an empty set and configuration
//! validation surface errors to the caller.

use std::path::PathBuf;

/// Top-level error type for the Council core library.
#[derive(Debug, thiserror::Error)]
pub enum CouncilError {
    #[error("Weighting error: {0}")]
    Weighting(#[from] WeightingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the weighting and aggregation math.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightingError {
    #[error("Cannot compute a weighted average of zero values")]
    EmptyInput,
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `CouncilError`.
pub type Result<T> = std::result::Result<T, CouncilError>;
