//! Error types for Rolegate

/// The main error type for Rolegate operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RolegateError {
    #[error("Not initialized")]
    NotInitialized,

    #[error("Already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("Already bootstrapped")]
    AlreadyBootstrapped,

    #[error("role {role} lacks {required} on {controller}")]
    Forbidden {
        role: u64,
        controller: String,
        required: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Corrupted record: {0}")]
    Corrupted(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for Rolegate operations
pub type Result<T> = std::result::Result<T, RolegateError>;

/// Convert any storage-level error to RolegateError
pub fn err<E: std::error::Error>(e: E) -> RolegateError {
    RolegateError::Storage(e.to_string())
}
