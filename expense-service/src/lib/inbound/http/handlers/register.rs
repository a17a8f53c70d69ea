use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::SessionData;
use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Password;
use crate::domain::identity::models::RegisterCommand;
use crate::inbound::http::router::AppState;
use crate::identity::errors::EmailError;
use crate::identity::errors::NameError;
use crate::identity::errors::PasswordPolicyError;

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<ApiSuccess<SessionData>, ApiError> {
    let session = state
        .auth_service
        .register(body.try_into_command()?)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        SessionData {
            user: (&session.user).into(),
            token: session.token,
        },
    ))
}

/// HTTP request body for registration (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterRequestError {
    #[error("Invalid name: {0}")]
    Name(#[from] NameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, ParseRegisterRequestError> {
        let name = DisplayName::new(self.name)?;
        let email = EmailAddress::new(self.email)?;
        let password = Password::new(self.password)?;
        Ok(RegisterCommand::new(name, email, password))
    }
}

impl From<ParseRegisterRequestError> for ApiError {
    fn from(err: ParseRegisterRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_request_normalizes_email() {
        let command = request("Ana", " Ana@X.com", "pw1")
            .try_into_command()
            .unwrap();

        assert_eq!(command.name.as_str(), "Ana");
        assert_eq!(command.email.as_str(), "ana@x.com");
    }

    #[test]
    fn test_each_field_is_validated() {
        assert!(matches!(
            request("", "ana@x.com", "pw1").try_into_command(),
            Err(ParseRegisterRequestError::Name(_))
        ));
        assert!(matches!(
            request("Ana", "ana", "pw1").try_into_command(),
            Err(ParseRegisterRequestError::Email(_))
        ));
        assert!(matches!(
            request("Ana", "ana@x.com", "").try_into_command(),
            Err(ParseRegisterRequestError::Password(_))
        ));
    }
}
