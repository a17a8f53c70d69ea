use chrono::Duration;
use chrono::Utc;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::TokenScope;

/// Issues and verifies scoped, time-bounded tokens.
///
/// Session and reset tokens are signed with different secrets. Nothing is
/// stored server-side: a token is valid while its signature checks out under
/// the expected scope's secret and its `exp` has not passed.
pub struct TokenService {
    session: JwtHandler,
    reset: JwtHandler,
    session_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Arguments
    /// * `session_secret` - Signing secret for session tokens
    /// * `reset_secret` - Signing secret for reset tokens
    /// * `session_ttl` - Validity of session tokens
    /// * `reset_ttl` - Validity of reset tokens
    ///
    /// # Errors
    /// * `Misconfigured` - Secrets are empty or identical, or a ttl is not positive
    pub fn new(
        session_secret: &[u8],
        reset_secret: &[u8],
        session_ttl: Duration,
        reset_ttl: Duration,
    ) -> Result<Self, JwtError> {
        if session_secret.is_empty() || reset_secret.is_empty() {
            return Err(JwtError::Misconfigured(
                "signing secrets must not be empty".to_string(),
            ));
        }
        if session_secret == reset_secret {
            return Err(JwtError::Misconfigured(
                "session and reset tokens must use different secrets".to_string(),
            ));
        }
        if session_ttl <= Duration::zero() || reset_ttl <= Duration::zero() {
            return Err(JwtError::Misconfigured(
                "token lifetimes must be positive".to_string(),
            ));
        }

        Ok(Self {
            session: JwtHandler::new(session_secret),
            reset: JwtHandler::new(reset_secret),
            session_ttl,
            reset_ttl,
        })
    }

    /// Configured lifetime of tokens in `scope`.
    pub fn ttl(&self, scope: TokenScope) -> Duration {
        match scope {
            TokenScope::Session => self.session_ttl,
            TokenScope::Reset => self.reset_ttl,
        }
    }

    /// Issue a token for `subject` with the scope's configured lifetime.
    pub fn issue(&self, subject: &str, scope: TokenScope) -> Result<String, JwtError> {
        self.issue_at(subject, scope, self.ttl(scope), Utc::now().timestamp())
    }

    /// Issue a token with an explicit lifetime and issue time.
    pub fn issue_at(
        &self,
        subject: &str,
        scope: TokenScope,
        ttl: Duration,
        issued_at: i64,
    ) -> Result<String, JwtError> {
        let claims = Claims::new(subject, scope, issued_at, ttl);
        self.handler(scope).encode(&claims)
    }

    /// Verify a token against the expected scope at the current time.
    pub fn verify(&self, token: &str, expected: TokenScope) -> Result<Claims, JwtError> {
        self.verify_at(token, expected, Utc::now().timestamp())
    }

    /// Verify a token against the expected scope at `now`.
    ///
    /// # Errors
    /// * `DecodingFailed` - Malformed, forged, or signed with another scope's secret
    /// * `ScopeMismatch` - Signature is valid but the scope claim differs
    /// * `TokenExpired` - `exp` is before `now`
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenScope,
        now: i64,
    ) -> Result<Claims, JwtError> {
        let claims: Claims = self.handler(expected).decode(token)?;

        if claims.scope != expected {
            return Err(JwtError::ScopeMismatch {
                expected: expected.to_string(),
                actual: claims.scope.to_string(),
            });
        }

        if claims.is_expired(now) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }

    fn handler(&self, scope: TokenScope) -> &JwtHandler {
        match scope {
            TokenScope::Session => &self.session,
            TokenScope::Reset => &self.reset,
        }
    }
}
