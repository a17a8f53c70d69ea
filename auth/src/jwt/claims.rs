use std::fmt;

use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

/// Purpose a token was issued for.
///
/// Each scope is signed with its own secret and the scope is also carried as a
/// claim, so a token from one scope never verifies under the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    /// General API access for a logged-in user.
    Session,
    /// Permission to replace one user's password.
    Reset,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Session => "session",
            TokenScope::Reset => "reset",
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims carried by every token this library issues.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token purpose
    pub scope: TokenScope,
}

impl Claims {
    /// Build claims for `subject` issued at `issued_at` and valid for `ttl`.
    pub fn new(subject: impl ToString, scope: TokenScope, issued_at: i64, ttl: Duration) -> Self {
        Self {
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at + ttl.num_seconds(),
            scope,
        }
    }

    /// Check if token is expired.
    ///
    /// A token is still valid at exactly its `exp` second.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}
