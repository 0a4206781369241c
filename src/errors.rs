use std::result::Result as StdResult;

use thiserror::Error;

/// Error type for the engine's caller-facing boundaries.
///
/// Data-shape problems inside a snapshot (bad dates, orphan links) never surface here; the
/// engine recovers from those locally. Only invalid caller parameters and I/O at the
/// persistence/config edges are reported.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("Transaction `{0}` is not a recurring series")]
    NotRecurring(String),
}

pub type Result<T> = StdResult<T, EngineError>;

/// User-facing CLI error wrapper.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Usage: {0}")]
    Usage(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serde(err.to_string())
    }
}
