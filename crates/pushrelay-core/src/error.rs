//! PushRelay error type.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PushRelayError>;

/// All errors surfaced by PushRelay components.
#[derive(Debug, Error)]
pub enum PushRelayError {
    /// Configuration loading/parsing problems.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid caller input rejected before any provider call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Push provider reported an error (API-level).
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP transport failure talking to an external service.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Chat/LLM layer failure.
    #[error("Chat error: {0}")]
    Chat(String),

    /// Local storage (SQLite) failure.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
