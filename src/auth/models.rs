//! Authentication data structures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub created_at: String,
}

/// JWT claims payload. Carries only the user id; tokens have no expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (user id)
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Partial update for a stored user.
///
/// Fields left as `None` are untouched. The password hash is recomputed only
/// when `password` carries a new plaintext; a username-only update must leave
/// the stored hash byte-identical.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
}
