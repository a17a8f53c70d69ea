use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::identity::errors::IdentityError;
use crate::identity::models::User;

pub mod federated_login;
pub mod forgot_password;
pub mod get_profile;
pub mod health;
pub mod login;
pub mod register;
pub mod reset_password;

/// JSON body extractor whose rejections use the API error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::UnprocessableEntity(rejection.body_text())
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidUserId(_)
            | IdentityError::InvalidName(_)
            | IdentityError::InvalidEmail(_)
            | IdentityError::InvalidPassword(_)
            | IdentityError::MissingAssertion => ApiError::UnprocessableEntity(err.to_string()),
            IdentityError::EmailAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            IdentityError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            IdentityError::NotFound(_) => ApiError::NotFound("User not found".to_string()),
            IdentityError::InvalidOrExpiredToken => {
                ApiError::BadRequest("Invalid or expired token".to_string())
            }
            IdentityError::FederatedAuthFailed(_) => {
                ApiError::Unauthorized("Federated authentication failed".to_string())
            }
            IdentityError::Password(_)
            | IdentityError::Token(_)
            | IdentityError::DatabaseError(_)
            | IdentityError::Unknown(_) => {
                tracing::error!(error = %err, "Request failed");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Plain acknowledgement payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Public view of a user; never carries the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub federated: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            federated: user.federated,
            created_at: user.created_at,
        }
    }
}

/// Session payload returned by every login-like route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionData {
    pub token: String,
    pub user: UserData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::errors::FederatedAuthError;
    use crate::identity::errors::NameError;

    #[test]
    fn test_validation_errors_are_unprocessable() {
        let err = ApiError::from(IdentityError::InvalidName(NameError::Empty));
        assert!(matches!(err, ApiError::UnprocessableEntity(_)));
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = ApiError::from(IdentityError::DatabaseError(
            "connection refused to 10.0.0.5".to_string(),
        ));
        assert_eq!(
            err,
            ApiError::InternalServerError("Internal server error".to_string())
        );
    }

    #[test]
    fn test_federated_failure_hides_cause() {
        let err = ApiError::from(IdentityError::FederatedAuthFailed(
            FederatedAuthError::Rejected("audience mismatch".to_string()),
        ));
        assert_eq!(
            err,
            ApiError::Unauthorized("Federated authentication failed".to_string())
        );
    }

    #[test]
    fn test_token_failures_collapse() {
        let err = ApiError::from(IdentityError::InvalidOrExpiredToken);
        assert_eq!(
            err,
            ApiError::BadRequest("Invalid or expired token".to_string())
        );
    }
}
