use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use super::handlers::ApiError;
use crate::domain::identity::models::UserId;
use crate::inbound::http::router::AppState;

const NO_TOKEN: &str = "Access denied. No token provided.";
const INVALID_TOKEN: &str = "Invalid token.";

/// Extension type to store the authenticated user in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Authorization gate for protected routes.
///
/// Accepts only session-scope tokens presented as `Bearer <token>`. The
/// gate does not touch the credential store; downstream handlers resolve
/// [`AuthenticatedUser`] themselves.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer_token(&req)
        .ok_or_else(|| ApiError::Unauthorized(NO_TOKEN.to_string()).into_response())?;

    let user_id = state.auth_service.resolve_session(token).map_err(|e| {
        tracing::warn!(error = %e, "Session token rejected");
        ApiError::Unauthorized(INVALID_TOKEN.to_string()).into_response()
    })?;

    req.extensions_mut().insert(AuthenticatedUser { user_id });

    Ok(next.run(req).await)
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req
        .headers()
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    // Scheme names are case-insensitive
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
