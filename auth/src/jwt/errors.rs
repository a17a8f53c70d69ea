use thiserror::Error;

/// Error type for JWT operations.
#[derive(Debug, Clone, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Failed to decode token: {0}")]
    DecodingFailed(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token scope mismatch: expected {expected}, got {actual}")]
    ScopeMismatch { expected: String, actual: String },

    #[error("Token signer misconfigured: {0}")]
    Misconfigured(String),
}
