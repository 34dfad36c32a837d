//! Error types for Medgate

use thiserror::Error;

/// Main error type for Medgate operations
#[derive(Error, Debug)]
pub enum MedgateError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Gateway/HTTP server errors
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Upstream model server errors
    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// Result type alias for Medgate operations
pub type Result<T> = std::result::Result<T, MedgateError>;
