//! Acme Auth - minimal username/password authentication service.
//!
//! Registers users, verifies credentials, issues bearer tokens, and resolves
//! tokens back to users.

use acme_auth::auth::{api, AuthService, AuthState, TokenSigner, UserStore};
use anyhow::{Context, Result};
use dotenv::dotenv;
use std::{env, path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    // A missing signing secret is a startup-fatal misconfiguration, never a
    // per-request error.
    let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

    let db_path = resolve_data_path(env::var("AUTH_DB_PATH").ok(), "auth.db");
    let store = Arc::new(UserStore::new(&db_path)?);
    info!("User store initialized at: {}", db_path);

    if env_truthy("AUTH_SEED") {
        let users = store.reset_and_seed()?;
        info!("Seeded {} demo users", users.len());
    }

    let signer = Arc::new(TokenSigner::new(&jwt_secret));
    let auth = Arc::new(AuthService::new(store, signer));
    let app = api::router(AuthState { auth });

    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn env_truthy(var: &str) -> bool {
    env::var(var)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(false)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "acme_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Treat relative paths as relative to the crate directory, not the caller's
/// cwd.
fn resolve_data_path(configured: Option<String>, default_name: &str) -> String {
    let raw = configured
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default_name.to_string());

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    base.join(p).to_string_lossy().to_string()
}

fn load_env() {
    let _ = dotenv();
}
