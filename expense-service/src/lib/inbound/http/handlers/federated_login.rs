use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::SessionData;
use crate::domain::identity::models::FederatedLoginCommand;
use crate::inbound::http::router::AppState;

/// Exchanges a Google ID token for a session, creating the account on first use.
pub async fn federated_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<FederatedLoginRequestBody>,
) -> Result<ApiSuccess<SessionData>, ApiError> {
    let session = state
        .auth_service
        .federated_login(FederatedLoginCommand {
            assertion: body.token,
        })
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        SessionData {
            user: (&session.user).into(),
            token: session.token,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FederatedLoginRequestBody {
    /// Identity provider assertion
    token: String,
}
