//! Authentication: credential storage, token issuance, and the HTTP surface.

pub mod api;
pub mod jwt;
pub mod models;
pub mod service;
pub mod user_store;

pub use api::AuthState;
pub use jwt::TokenSigner;
pub use service::{AuthError, AuthService};
pub use user_store::UserStore;
