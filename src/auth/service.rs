//! Core authentication contract: credential verification, token issuance,
//! and token resolution.

use crate::auth::{jwt::TokenSigner, models::User, user_store::UserStore};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tokio::task;
use tracing::warn;
use uuid::Uuid;

/// Authentication failures as seen by clients.
///
/// Every credential or token problem collapses into `InvalidCredentials`, so
/// a response never reveals whether the username exists, the password was
/// wrong, or the token was forged.
#[derive(Debug)]
pub enum AuthError {
    InvalidCredentials,
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Internal(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "bad credentials".to_string())
            }
            AuthError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Verifies credentials against the user store and issues/resolves signed
/// tokens. Stateless: the authentication path only reads user records.
pub struct AuthService {
    store: Arc<UserStore>,
    signer: Arc<TokenSigner>,
}

impl AuthService {
    pub fn new(store: Arc<UserStore>, signer: Arc<TokenSigner>) -> Self {
        Self { store, signer }
    }

    /// Verify a username/password pair and issue a signed token asserting the
    /// user's id.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let Some(user) = self.store.get_user_by_username(username)? else {
            warn!("Failed login attempt: {}", username);
            return Err(AuthError::InvalidCredentials);
        };

        // bcrypt verification is deliberately expensive; keep it off the
        // async worker threads.
        let supplied = password.to_string();
        let stored_hash = user.password_hash.clone();
        let valid = task::spawn_blocking(move || bcrypt::verify(&supplied, &stored_hash))
            .await
            .map_err(|e| AuthError::Internal(e.into()))?
            .map_err(|e| AuthError::Internal(e.into()))?;

        if !valid {
            warn!("Failed login attempt: {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.signer.sign(&user.id)?)
    }

    /// Resolve a bearer token back to the user it asserts.
    pub async fn resolve(&self, token: &str) -> Result<User, AuthError> {
        let claims = self
            .signer
            .verify(token)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidCredentials)?;

        // A valid signature naming a missing user is indistinguishable from a
        // forged token.
        self.store
            .get_user_by_id(&id)?
            .ok_or(AuthError::InvalidCredentials)
    }
}
