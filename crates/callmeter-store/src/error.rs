//! Error types for metric storage backends.

/// Errors that can occur while persisting or loading metric records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The metrics file could not be opened, read, or appended to.
    #[error("metrics file error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialised, or a stored line could not be parsed.
    #[error("metrics serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The Redis server rejected a command or could not be reached.
    #[error("metrics redis error: {0}")]
    Redis(#[from] redis::RedisError),
}
