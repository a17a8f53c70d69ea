use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::identity::models::Credential;
use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::User;
use crate::domain::identity::models::UserId;
use crate::domain::identity::ports::UserRepository;
use crate::identity::errors::IdentityError;

/// Stored in the non-null `password_hash` column for federated-only accounts.
/// Not a PHC string, so it can never verify as a password.
const FEDERATED_CREDENTIAL_MARKER: &str = "!federated";

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    is_federated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = IdentityError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let credential = if row.password_hash == FEDERATED_CREDENTIAL_MARKER {
            Credential::Federated
        } else {
            Credential::Password(row.password_hash)
        };

        Ok(User {
            id: UserId(row.id),
            name: DisplayName::new(row.name)?,
            email: EmailAddress::new(row.email)?,
            credential,
            federated: row.is_federated,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn stored_credential(credential: &Credential) -> &str {
    match credential {
        Credential::Password(hash) => hash,
        Credential::Federated => FEDERATED_CREDENTIAL_MARKER,
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: User) -> Result<User, IdentityError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_federated, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.0)
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(stored_credential(&user.credential))
        .bind(user.federated)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT)
                {
                    return IdentityError::EmailAlreadyExists(user.email.to_string());
                }
            }
            IdentityError::DatabaseError(e.to_string())
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, IdentityError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, is_federated, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, IdentityError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, is_federated, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn update_credential(
        &self,
        id: &UserId,
        credential: &Credential,
    ) -> Result<(), IdentityError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(stored_credential(credential))
        .execute(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
