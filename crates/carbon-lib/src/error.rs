//! Error types for the analytics core

use thiserror::Error;

/// Errors returned by analytics operations
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Singular matrix: degenerate training data (pivot {pivot:e} at column {column})")]
    SingularMatrix { column: usize, pivot: f64 },

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;
