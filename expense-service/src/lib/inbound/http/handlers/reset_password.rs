use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::identity::models::Password;
use crate::domain::identity::models::ResetPasswordCommand;
use crate::inbound::http::router::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ApiJson(body): ApiJson<ResetPasswordRequestBody>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let new_password =
        Password::new(body.password).map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    state
        .auth_service
        .reset_password(ResetPasswordCommand {
            token,
            new_password,
        })
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Password updated"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequestBody {
    password: String,
}
