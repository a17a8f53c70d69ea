use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::TokenScope;

use crate::identity::errors::IdentityError;
use crate::identity::models::AuthSession;
use crate::identity::models::Credential;
use crate::identity::models::EmailAddress;
use crate::identity::models::FederatedLoginCommand;
use crate::identity::models::LoginCommand;
use crate::identity::models::RegisterCommand;
use crate::identity::models::ResetPasswordCommand;
use crate::identity::models::User;
use crate::identity::models::UserId;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::IdentityVerifier;
use crate::identity::ports::Notifier;
use crate::identity::ports::UserRepository;

const RESET_SUBJECT: &str = "Reset your password";

/// Policy knobs for the forgot-password flow.
#[derive(Debug, Clone)]
pub struct PasswordResetSettings {
    /// Reset links are `<link_base_url>/<token>`
    pub link_base_url: String,
    /// Answer unknown emails like known ones instead of with `NotFound`
    pub conceal_unknown_accounts: bool,
}

/// Domain service implementation for the authentication flow.
///
/// Concrete implementation of AuthServicePort with dependency injection.
/// Port parameters may be unsized so the binary can plug trait objects.
pub struct AuthService<UR, FV, N>
where
    UR: UserRepository + ?Sized,
    FV: IdentityVerifier + ?Sized,
    N: Notifier + ?Sized,
{
    repository: Arc<UR>,
    verifier: Arc<FV>,
    notifier: Arc<N>,
    authenticator: Arc<Authenticator>,
    reset_settings: PasswordResetSettings,
}

impl<UR, FV, N> AuthService<UR, FV, N>
where
    UR: UserRepository + ?Sized,
    FV: IdentityVerifier + ?Sized,
    N: Notifier + ?Sized,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store
    /// * `verifier` - Federated identity verifier
    /// * `notifier` - Channel for reset links
    /// * `authenticator` - Password hasher and token service
    /// * `reset_settings` - Forgot-password policy
    pub fn new(
        repository: Arc<UR>,
        verifier: Arc<FV>,
        notifier: Arc<N>,
        authenticator: Arc<Authenticator>,
        reset_settings: PasswordResetSettings,
    ) -> Self {
        Self {
            repository,
            verifier,
            notifier,
            authenticator,
            reset_settings,
        }
    }

    fn open_session(&self, user: User) -> Result<AuthSession, IdentityError> {
        let token = self
            .authenticator
            .issue_session_token(&user.id.to_string())?;
        Ok(AuthSession { user, token })
    }

    // Argon2 blocks; run it off the async workers.
    async fn hash_password(&self, password: String) -> Result<String, IdentityError> {
        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| IdentityError::Unknown(e.to_string()))?
            .map_err(IdentityError::from)
    }

    async fn verify_password(
        &self,
        password: String,
        stored_hash: String,
        subject: String,
    ) -> Result<String, IdentityError> {
        let authenticator = Arc::clone(&self.authenticator);
        let result = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, &stored_hash, &subject)
        })
        .await
        .map_err(|e| IdentityError::Unknown(e.to_string()))?;

        match result {
            Ok(authenticated) => Ok(authenticated.access_token),
            Err(AuthenticationError::InvalidCredentials) => Err(IdentityError::InvalidCredentials),
            Err(AuthenticationError::PasswordError(e)) => Err(e.into()),
            Err(AuthenticationError::JwtError(e)) => Err(e.into()),
        }
    }

    /// Fail a login that has no stored digest to check, after spending the
    /// same hashing work as a wrong password would.
    async fn reject_login(&self, password: String) -> IdentityError {
        let authenticator = Arc::clone(&self.authenticator);
        match tokio::task::spawn_blocking(move || authenticator.verify_decoy(&password)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Decoy password verification failed"),
            Err(e) => tracing::error!(error = %e, "Decoy password verification panicked"),
        }
        IdentityError::InvalidCredentials
    }

    fn reset_message(&self, token: &str) -> String {
        let link = format!(
            "{}/{}",
            self.reset_settings.link_base_url.trim_end_matches('/'),
            token
        );
        let minutes = self
            .authenticator
            .tokens()
            .ttl(TokenScope::Reset)
            .num_minutes();

        format!(
            "<p>Click <a href=\"{}\">here</a> to reset your password. It expires in {} mins.</p>",
            link, minutes
        )
    }
}

#[async_trait]
impl<UR, FV, N> AuthServicePort for AuthService<UR, FV, N>
where
    UR: UserRepository + ?Sized,
    FV: IdentityVerifier + ?Sized,
    N: Notifier + ?Sized,
{
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, IdentityError> {
        // Early exit saves a hash; the store's constraint stays authoritative.
        if self
            .repository
            .find_by_email(&command.email)
            .await?
            .is_some()
        {
            return Err(IdentityError::EmailAlreadyExists(command.email.to_string()));
        }

        let password_hash = self
            .hash_password(command.password.expose().to_string())
            .await?;
        let user = User::registered(command.name, command.email, password_hash);

        let created_user = self.repository.insert(user).await?;
        tracing::info!(user_id = %created_user.id, "User registered");

        self.open_session(created_user)
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthSession, IdentityError> {
        let Ok(email) = EmailAddress::new(command.email) else {
            return Err(self.reject_login(command.password).await);
        };

        let Some(user) = self.repository.find_by_email(&email).await? else {
            return Err(self.reject_login(command.password).await);
        };

        let Some(stored_hash) = user.credential.password_hash().map(str::to_string) else {
            tracing::debug!(user_id = %user.id, "Password login attempted on federated account");
            return Err(self.reject_login(command.password).await);
        };

        let token = self
            .verify_password(command.password, stored_hash, user.id.to_string())
            .await
            .inspect_err(|e| {
                if matches!(e, IdentityError::InvalidCredentials) {
                    tracing::debug!(user_id = %user.id, "Password mismatch");
                }
            })?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(AuthSession { user, token })
    }

    async fn federated_login(
        &self,
        command: FederatedLoginCommand,
    ) -> Result<AuthSession, IdentityError> {
        if command.assertion.trim().is_empty() {
            return Err(IdentityError::MissingAssertion);
        }

        let identity = self
            .verifier
            .verify(&command.assertion)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Federated assertion rejected"))?;

        let user = match self.repository.find_by_email(&identity.email).await? {
            Some(user) => user,
            None => {
                let email = identity.email.clone();
                match self.repository.insert(User::provisioned(identity)).await {
                    Ok(user) => {
                        tracing::info!(user_id = %user.id, "Federated user provisioned");
                        user
                    }
                    // Lost a race with a concurrent first login for the same email.
                    Err(IdentityError::EmailAlreadyExists(_)) => self
                        .repository
                        .find_by_email(&email)
                        .await?
                        .ok_or_else(|| {
                            IdentityError::DatabaseError(format!(
                                "user vanished after duplicate insert: {}",
                                email
                            ))
                        })?,
                    Err(e) => return Err(e),
                }
            }
        };

        tracing::info!(user_id = %user.id, "Federated login");
        self.open_session(user)
    }

    async fn request_password_reset(&self, email: EmailAddress) -> Result<(), IdentityError> {
        let user = match self.repository.find_by_email(&email).await? {
            Some(user) => user,
            None if self.reset_settings.conceal_unknown_accounts => {
                tracing::debug!("Password reset requested for unknown account");
                return Ok(());
            }
            None => return Err(IdentityError::NotFound(email.to_string())),
        };

        let token = self.authenticator.issue_reset_token(&user.id.to_string())?;
        let body = self.reset_message(&token);

        match self.notifier.send(&user.email, RESET_SUBJECT, &body).await {
            Ok(()) => tracing::info!(user_id = %user.id, "Password reset link dispatched"),
            Err(e) => tracing::error!(
                user_id = %user.id,
                error = %e,
                "Failed to dispatch password reset link"
            ),
        }

        Ok(())
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), IdentityError> {
        let claims = self
            .authenticator
            .validate_reset_token(&command.token)
            .map_err(|e| {
                tracing::debug!(error = %e, "Reset token rejected");
                IdentityError::InvalidOrExpiredToken
            })?;
        let user_id =
            UserId::from_string(&claims.sub).map_err(|_| IdentityError::InvalidOrExpiredToken)?;

        let password_hash = self
            .hash_password(command.new_password.expose().to_string())
            .await?;

        match self
            .repository
            .update_credential(&user_id, &Credential::Password(password_hash))
            .await
        {
            Ok(()) => {
                tracing::info!(user_id = %user_id, "Password reset");
                Ok(())
            }
            Err(IdentityError::NotFound(_)) => Err(IdentityError::InvalidOrExpiredToken),
            Err(e) => Err(e),
        }
    }

    async fn get_user(&self, id: &UserId) -> Result<User, IdentityError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound(id.to_string()))
    }

    fn resolve_session(&self, token: &str) -> Result<UserId, IdentityError> {
        let claims = self
            .authenticator
            .validate_session_token(token)
            .map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                IdentityError::InvalidOrExpiredToken
            })?;

        UserId::from_string(&claims.sub).map_err(|_| IdentityError::InvalidOrExpiredToken)
    }
}
