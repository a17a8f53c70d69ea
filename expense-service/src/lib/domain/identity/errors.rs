use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for display name validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Name must not be empty")]
    Empty,

    #[error("Name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for plaintext password policy failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password must not be empty")]
    Empty,

    #[error("Password too long: maximum {max} bytes")]
    TooLong { max: usize },
}

/// Error raised by a federated identity verifier.
///
/// Any variant means the assertion is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FederatedAuthError {
    #[error("Malformed assertion: {0}")]
    Malformed(String),

    #[error("Assertion rejected: {0}")]
    Rejected(String),

    #[error("Identity provider unreachable: {0}")]
    Unreachable(String),
}

/// Error for notification dispatch
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Failed to build message: {0}")]
    InvalidMessage(String),

    #[error("Failed to deliver message: {0}")]
    DeliveryFailed(String),
}

/// Top-level error for all identity operations
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    #[error("Missing identity assertion")]
    MissingAssertion,

    // Domain-level errors
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Federated authentication failed: {0}")]
    FederatedAuthFailed(#[from] FederatedAuthError),

    // Infrastructure errors
    #[error("Password error: {0}")]
    Password(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<auth::PasswordError> for IdentityError {
    fn from(err: auth::PasswordError) -> Self {
        IdentityError::Password(err.to_string())
    }
}

impl From<auth::JwtError> for IdentityError {
    fn from(err: auth::JwtError) -> Self {
        IdentityError::Token(err.to_string())
    }
}
