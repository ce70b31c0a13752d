//! Core error types for `MeterBar`.

use thiserror::Error;

/// Core error type for `MeterBar` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Provider name did not match any known provider.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Invalid data from API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
