use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::identity::errors::EmailError;
use crate::identity::errors::NameError;
use crate::identity::errors::PasswordPolicyError;
use crate::identity::errors::UserIdError;

/// User identity aggregate.
///
/// Owned exclusively by the credential store. Created on registration or on
/// the first federated login, mutated only by a password reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: DisplayName,
    pub email: EmailAddress,
    pub credential: Credential,
    pub federated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New account created through the password path.
    pub fn registered(name: DisplayName, email: EmailAddress, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name,
            email,
            credential: Credential::Password(password_hash),
            federated: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// New account auto-provisioned from a verified federated identity.
    pub fn provisioned(identity: FederatedIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: identity.name,
            email: identity.email,
            credential: Credential::Federated,
            federated: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Stored secret of a user identity.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Argon2 PHC digest of the user's password.
    Password(String),
    /// Federated-only account with no usable password.
    Federated,
}

impl Credential {
    /// Digest usable for password comparison, if any.
    pub fn password_hash(&self) -> Option<&str> {
        match self {
            Credential::Password(hash) => Some(hash),
            Credential::Federated => None,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password(_) => f.write_str("Password(<redacted>)"),
            Credential::Federated => f.write_str("Federated"),
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type
///
/// Trimmed, non-empty, at most 100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    const MAX_LENGTH: usize = 100;

    pub fn new(name: String) -> Result<Self, NameError> {
        let name = name.trim();
        let length = name.chars().count();
        if length == 0 {
            Err(NameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validated with an RFC 5322 parser and normalized to trimmed lowercase, so
/// equality on this type is the case-insensitive identity of an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the `@`.
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted from a caller.
///
/// Never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MAX_BYTES: usize = 1024;

    /// # Errors
    /// * `Empty` - Password is empty
    /// * `TooLong` - Password exceeds 1024 bytes
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        if password.is_empty() {
            Err(PasswordPolicyError::Empty)
        } else if password.len() > Self::MAX_BYTES {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_BYTES,
            })
        } else {
            Ok(Self(password))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Identity vouched for by a federated identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    pub email: EmailAddress,
    pub name: DisplayName,
    /// Provider-side subject identifier
    pub subject: String,
}

/// Authenticated user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Command to register a new password account
#[derive(Debug)]
pub struct RegisterCommand {
    pub name: DisplayName,
    pub email: EmailAddress,
    pub password: Password,
}

impl RegisterCommand {
    pub fn new(name: DisplayName, email: EmailAddress, password: Password) -> Self {
        Self {
            name,
            email,
            password,
        }
    }
}

/// Command to log in with email and password.
///
/// The email stays raw: a malformed address must fail the same way as an
/// unknown one.
#[derive(Debug)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

/// Command to authenticate with a federated identity assertion
#[derive(Debug)]
pub struct FederatedLoginCommand {
    pub assertion: String,
}

/// Command to replace a password using a reset token
#[derive(Debug)]
pub struct ResetPasswordCommand {
    pub token: String,
    pub new_password: Password,
}
