use async_trait::async_trait;

use crate::identity::errors::FederatedAuthError;
use crate::identity::errors::IdentityError;
use crate::identity::errors::NotificationError;
use crate::identity::models::AuthSession;
use crate::identity::models::Credential;
use crate::identity::models::EmailAddress;
use crate::identity::models::FederatedIdentity;
use crate::identity::models::FederatedLoginCommand;
use crate::identity::models::LoginCommand;
use crate::identity::models::RegisterCommand;
use crate::identity::models::ResetPasswordCommand;
use crate::identity::models::User;
use crate::identity::models::UserId;

/// Port for the authentication flow.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new password account and open a session for it.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered (any letter case)
    /// * `DatabaseError` - Store operation failed
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, IdentityError>;

    /// Verify email and password and open a session.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, malformed email, wrong password
    ///   or federated-only account; callers cannot tell these apart
    /// * `DatabaseError` - Store operation failed
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, IdentityError>;

    /// Open a session from a third-party identity assertion, provisioning the
    /// account on first use.
    ///
    /// # Errors
    /// * `MissingAssertion` - Empty assertion
    /// * `FederatedAuthFailed` - Verifier rejected the assertion
    /// * `DatabaseError` - Store operation failed
    async fn federated_login(
        &self,
        command: FederatedLoginCommand,
    ) -> Result<AuthSession, IdentityError>;

    /// Issue a reset token for `email` and dispatch the reset link.
    ///
    /// # Errors
    /// * `NotFound` - No account for this email, unless unknown accounts are concealed
    /// * `DatabaseError` - Store operation failed
    async fn request_password_reset(&self, email: EmailAddress) -> Result<(), IdentityError>;

    /// Replace the password of the account named by a reset token.
    ///
    /// # Errors
    /// * `InvalidOrExpiredToken` - Token malformed, expired, from another scope,
    ///   or naming an account that no longer exists
    /// * `DatabaseError` - Store operation failed
    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), IdentityError>;

    /// Retrieve a user by identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Store operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, IdentityError>;

    /// Validate a session token and return the subject it names.
    ///
    /// Performs no store lookup.
    ///
    /// # Errors
    /// * `InvalidOrExpiredToken` - Any verification failure
    fn resolve_session(&self, token: &str) -> Result<UserId, IdentityError>;
}

/// Persistence operations for user identities.
///
/// Each operation is atomic on a single record.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered; enforced by the store
    /// * `DatabaseError` - Store operation failed
    async fn insert(&self, user: User) -> Result<User, IdentityError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, IdentityError>;

    /// Retrieve user by normalized email address.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, IdentityError>;

    /// Overwrite the stored credential of a user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Store operation failed
    async fn update_credential(
        &self,
        id: &UserId,
        credential: &Credential,
    ) -> Result<(), IdentityError>;
}

/// Verifies identity assertions issued by a trusted third party.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + 'static {
    /// Validate `assertion` and extract the identity it vouches for.
    ///
    /// Fails closed: any doubt about the assertion is an error.
    async fn verify(&self, assertion: &str) -> Result<FederatedIdentity, FederatedAuthError>;
}

/// Outbound message channel used for reset links.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Send a message. Delivery is best-effort; success means handed off,
    /// not received.
    async fn send(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError>;
}
