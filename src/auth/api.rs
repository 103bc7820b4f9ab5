//! HTTP endpoints for the authentication service.

use crate::auth::{
    models::{LoginRequest, TokenResponse, User},
    service::{AuthError, AuthService},
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub auth: Arc<AuthService>,
}

/// Build the application router.
pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/api/auth", post(login).get(whoami))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Login endpoint - POST /api/auth
async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    info!("Login attempt: {}", payload.username);

    let token = state
        .auth
        .authenticate(&payload.username, &payload.password)
        .await?;

    info!("Login successful: {}", payload.username);

    Ok(Json(TokenResponse { token }))
}

/// Current user endpoint - GET /api/auth
///
/// Takes the token from the Authorization header; a `Bearer ` prefix is
/// tolerated. A missing header fails the same way as a bad token.
async fn whoami(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<User>, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.strip_prefix("Bearer ").unwrap_or(s).trim())
        .ok_or(AuthError::InvalidCredentials)?;

    let user = state.auth.resolve(token).await?;

    Ok(Json(user))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
