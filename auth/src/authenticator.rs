use std::sync::OnceLock;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::TokenScope;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::tokens::TokenService;

const DECOY_PASSWORD: &str = "decoy-password-never-assigned";

/// Authentication coordinator combining password verification and token issuance.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    tokens: TokenService,
    decoy_digest: OnceLock<String>,
}

/// Result of successful authentication.
pub struct AuthenticationResult {
    /// Session token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator from a configured hasher and token service.
    pub fn new(password_hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            password_hasher,
            tokens,
            decoy_digest: OnceLock::new(),
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password and issue a session token for `subject`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash could not be parsed
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        let is_valid = self.password_hasher.verify(password, stored_hash)?;

        if !is_valid {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(subject, TokenScope::Session)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Verify `password` against a decoy digest hashed with the configured cost.
    ///
    /// For login attempts with no stored digest to compare against: the
    /// rejection then costs as much as a wrong password. The decoy is hashed
    /// on first use and reused afterwards.
    ///
    /// # Errors
    /// * `PasswordError` - Decoy hashing or verification failed
    pub fn verify_decoy(&self, password: &str) -> Result<(), PasswordError> {
        let digest = match self.decoy_digest.get() {
            Some(digest) => digest,
            None => {
                let digest = self.password_hasher.hash(DECOY_PASSWORD)?;
                self.decoy_digest.get_or_init(|| digest)
            }
        };

        self.password_hasher.verify(password, digest).map(|_| ())
    }

    /// Whether the decoy digest has been computed.
    pub fn has_decoy_digest(&self) -> bool {
        self.decoy_digest.get().is_some()
    }

    /// Issue a session token without password verification.
    ///
    /// For identities established by other means (fresh registration,
    /// federated login).
    pub fn issue_session_token(&self, subject: &str) -> Result<String, JwtError> {
        self.tokens.issue(subject, TokenScope::Session)
    }

    /// Issue a short-lived password reset token.
    pub fn issue_reset_token(&self, subject: &str) -> Result<String, JwtError> {
        self.tokens.issue(subject, TokenScope::Reset)
    }

    /// Validate a session token and return its claims.
    pub fn validate_session_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.tokens.verify(token, TokenScope::Session)
    }

    /// Validate a reset token and return its claims.
    pub fn validate_reset_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.tokens.verify(token, TokenScope::Reset)
    }

    /// Underlying token service, for callers that need explicit times or lifetimes.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn authenticator() -> Authenticator {
        let tokens = TokenService::new(
            b"session_secret_at_least_32_bytes_long",
            b"reset_secret_at_least_32_bytes_long!!",
            Duration::days(1),
            Duration::minutes(15),
        )
        .expect("valid token service");
        let hasher = PasswordHasher::with_cost(1024, 1, 1).expect("valid parameters");

        Authenticator::new(hasher, tokens)
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = authenticator();

        let password = "my_password";
        let hash = authenticator
            .hash_password(password)
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate(password, &hash, "user123")
            .expect("Authentication failed");

        let claims = authenticator
            .validate_session_token(&result.access_token)
            .expect("Token validation failed");
        assert_eq!(claims.sub, "user123");
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = authenticator();

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        let result = authenticator.authenticate("wrong_password", &hash, "user123");
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_token_is_not_a_session() {
        let authenticator = authenticator();

        let reset = authenticator.issue_reset_token("user123").unwrap();

        assert!(authenticator.validate_session_token(&reset).is_err());
        assert_eq!(
            authenticator.validate_reset_token(&reset).unwrap().sub,
            "user123"
        );
    }

    #[test]
    fn test_verify_decoy_hashes_once() {
        let authenticator = authenticator();
        assert!(!authenticator.has_decoy_digest());

        authenticator.verify_decoy("guess").expect("decoy verification");
        let digest = authenticator.decoy_digest.get().cloned();
        authenticator.verify_decoy("another guess").expect("decoy verification");

        assert!(authenticator.has_decoy_digest());
        assert!(digest.as_deref().unwrap().starts_with("$argon2id$"));
        assert_eq!(authenticator.decoy_digest.get().cloned(), digest);
    }

    #[test]
    fn test_validate_invalid_token() {
        let authenticator = authenticator();

        assert!(authenticator
            .validate_session_token("invalid.token.here")
            .is_err());
    }
}
