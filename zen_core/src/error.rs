//! Error types for the zen_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zen_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Exercise timing rejected at sequencer construction or reconfiguration.
    ///
    /// Never raised while an exercise is running.
    #[error("Invalid exercise configuration: {0}")]
    InvalidConfiguration(String),

    /// Application configuration error (paths, session order, clock rate)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted state error
    #[error("State error: {0}")]
    State(String),
}
