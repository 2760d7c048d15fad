//! Error type for supervisor operations.

/// Result type for supervisor operations.
pub type GenServerResult<T> = Result<T, GenServerError>;

/// Error type for supervisor operations.
#[derive(Debug, thiserror::Error)]
pub enum GenServerError {
    #[error("Name already registered: {0}")]
    NameAlreadyRegistered(String),

    #[error("Failed to start monitor: {0}")]
    MonitorSpawn(#[from] ractor::SpawnErr),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),
}
