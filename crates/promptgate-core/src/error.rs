//! Error types for PromptGate

/// Result type alias using PromptGate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for PromptGate operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing policy fields. Fatal at startup, rejected but
    /// non-fatal at reload.
    #[error("configuration error: {0}")]
    Config(String),

    /// Embedding capability missing or failed. Degrades semantic checking
    /// only, never fatal.
    #[error("oracle error: {0}")]
    Oracle(String),

    /// Matcher construction errors (regex/automaton compilation)
    #[error("filter error: {0}")]
    Filter(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new oracle error
    pub fn oracle(msg: impl Into<String>) -> Self {
        Self::Oracle(msg.into())
    }

    /// Create a new filter error
    pub fn filter(msg: impl Into<String>) -> Self {
        Self::Filter(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
