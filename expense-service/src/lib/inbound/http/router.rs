use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::InvalidHeaderValue;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::federated_login::federated_login;
use super::handlers::forgot_password::forgot_password;
use super::handlers::get_profile::get_profile;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::register::register;
use super::handlers::reset_password::reset_password;
use super::middleware::require_session;
use crate::domain::identity::ports::AuthServicePort;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
}

/// Build the HTTP API.
///
/// # Arguments
/// * `auth_service` - Authentication flow
/// * `allowed_origin` - Frontend origin allowed with credentials; any origin when `None`
///
/// # Errors
/// * `InvalidHeaderValue` - `allowed_origin` is not a valid header value
pub fn create_router(
    auth_service: Arc<dyn AuthServicePort>,
    allowed_origin: Option<&str>,
) -> Result<Router, InvalidHeaderValue> {
    let cors = cors_layer(allowed_origin)?;
    let state = AppState { auth_service };

    let public_routes = Router::new()
        .route("/", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/federated-login", post(federated_login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password/:token", post(reset_password));

    let protected_routes = Router::new()
        .route("/api/profile", get(get_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    // Headers are left out of the span: they carry bearer tokens
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(ServiceBuilder::new().layer(trace_layer).layer(cors))
        .with_state(state))
}

fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer, InvalidHeaderValue> {
    let Some(origin) = allowed_origin else {
        return Ok(CorsLayer::permissive());
    };

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(HeaderValue::from_str(origin)?))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
        .allow_credentials(true))
}
