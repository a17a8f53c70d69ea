use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::identity::models::Credential;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::User;
use crate::domain::identity::models::UserId;
use crate::domain::identity::ports::UserRepository;
use crate::identity::errors::IdentityError;

/// Process-local credential store.
///
/// Email uniqueness is checked and the record written under one write lock,
/// so concurrent inserts for the same email cannot both succeed. Contents are
/// lost on restart.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> Result<User, IdentityError> {
        let mut users = self.users.write().await;

        if users.values().any(|existing| existing.email == user.email) {
            return Err(IdentityError::EmailAlreadyExists(user.email.to_string()));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, IdentityError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, IdentityError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn update_credential(
        &self,
        id: &UserId,
        credential: &Credential,
    ) -> Result<(), IdentityError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;

        user.credential = credential.clone();
        user.updated_at = Utc::now();
        Ok(())
    }
}
