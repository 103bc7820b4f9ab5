//! Integration tests for the auth HTTP surface.
//!
//! Drives the axum router directly with `tower::ServiceExt::oneshot` against
//! a seeded temporary SQLite store, covering the lucy/larry/moe scenario.

use acme_auth::auth::{api, models::User, AuthService, AuthState, TokenSigner, UserStore};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "test-secret-key-12345";

fn seeded_app() -> (Router, Vec<User>, NamedTempFile) {
    let temp = NamedTempFile::new().unwrap();
    let store = Arc::new(UserStore::new(temp.path().to_str().unwrap()).unwrap());
    let users = store.reset_and_seed().unwrap();
    let signer = Arc::new(TokenSigner::new(TEST_SECRET));
    let auth = Arc::new(AuthService::new(store, signer));
    (api::router(AuthState { auth }), users, temp)
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap()
}

fn whoami_request(authorization: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/api/auth")
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn login_with_valid_credentials_returns_token() {
    let (app, _users, _temp) = seeded_app();

    let response = app
        .oneshot(login_request("larry", "larry_pw"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let (app, _users, _temp) = seeded_app();

    let response = app.oneshot(login_request("larry", "wrong")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "bad credentials");
}

#[tokio::test]
async fn unknown_username_fails_identically_to_wrong_password() {
    let (app, _users, _temp) = seeded_app();

    let wrong_password = app
        .clone()
        .oneshot(login_request("larry", "wrong"))
        .await
        .unwrap();
    let unknown_user = app
        .oneshot(login_request("no_such_user", "wrong"))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_user).await);
}

#[tokio::test]
async fn token_round_trips_to_the_user() {
    let (app, _users, _temp) = seeded_app();

    let login = app
        .clone()
        .oneshot(login_request("larry", "larry_pw"))
        .await
        .unwrap();
    let token = body_json(login).await["token"].as_str().unwrap().to_string();

    let response = app.oneshot(whoami_request(&token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "larry");
    // The hash must never appear in a response.
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn bearer_prefix_is_tolerated() {
    let (app, users, _temp) = seeded_app();
    let larry = users.iter().find(|u| u.username == "larry").unwrap();

    let token = TokenSigner::new(TEST_SECRET).sign(&larry.id).unwrap();
    let response = app
        .oneshot(whoami_request(&format!("Bearer {}", token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "larry");
}

#[tokio::test]
async fn token_signed_with_different_secret_is_rejected() {
    let (app, users, _temp) = seeded_app();
    let larry = users.iter().find(|u| u.username == "larry").unwrap();

    let forged = TokenSigner::new("some-other-secret").sign(&larry.id).unwrap();
    let response = app.oneshot(whoami_request(&forged)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "bad credentials");
}

#[tokio::test]
async fn token_for_missing_user_is_rejected() {
    let (app, _users, _temp) = seeded_app();

    // Valid signature, but the id names nobody in the store.
    let token = TokenSigner::new(TEST_SECRET).sign(&Uuid::new_v4()).unwrap();
    let response = app.oneshot(whoami_request(&token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "bad credentials");
}

#[tokio::test]
async fn missing_authorization_header_is_rejected() {
    let (app, _users, _temp) = seeded_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "bad credentials");
}

#[tokio::test]
async fn health_check_is_public() {
    let (app, _users, _temp) = seeded_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
