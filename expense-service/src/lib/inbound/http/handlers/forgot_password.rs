use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::identity::models::EmailAddress;
use crate::inbound::http::router::AppState;

pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequestBody>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let email =
        EmailAddress::new(body.email).map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    state.auth_service.request_password_reset(email).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Reset link sent to your email"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgotPasswordRequestBody {
    email: String,
}
