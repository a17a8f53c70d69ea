//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure:
//! - Password hashing (Argon2id, tunable cost)
//! - Scoped JWT issuance and validation (session and reset tokens, one secret each)
//! - Authentication coordination
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ## Scoped Tokens
//! ```
//! use auth::{TokenScope, TokenService};
//! use chrono::Duration;
//!
//! let tokens = TokenService::new(
//!     b"session_secret_at_least_32_bytes_long",
//!     b"reset_secret_at_least_32_bytes_long!!",
//!     Duration::days(1),
//!     Duration::minutes(15),
//! )
//! .unwrap();
//!
//! let reset = tokens.issue("user123", TokenScope::Reset).unwrap();
//! assert!(tokens.verify(&reset, TokenScope::Session).is_err());
//! assert_eq!(tokens.verify(&reset, TokenScope::Reset).unwrap().sub, "user123");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod tokens;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenScope;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use tokens::TokenService;
