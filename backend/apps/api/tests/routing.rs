//! Assembled application routing

use std::path::Path;
use std::sync::Arc;

use api::settings::Settings;
use api::{account_mailer, build_app, cors_layer};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use platform::mail::MemoryTransport;
use serde_json::{Value, json};
use tower::ServiceExt;
use users::{InMemoryUserRepository, UsersAppState, UsersConfig};

fn app() -> (Router, MemoryTransport) {
    let settings = Settings::default();
    let config = Arc::new(UsersConfig {
        allowed_hosts: vec!["accounts.example.com".to_string()],
        ..UsersConfig::development()
    });
    let transport = MemoryTransport::new();
    let mailer = account_mailer(
        &settings,
        Path::new("/nonexistent"),
        transport.clone(),
        config.clone(),
    );
    let state = UsersAppState::new(InMemoryUserRepository::new(), mailer, config);

    (build_app(state, cors_layer(&settings.cors)), transport)
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::HOST, "accounts.example.com")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_then_login_through_custom_route() {
    let (app, transport) = app();

    let (status, body) = post(
        app.clone(),
        "/auth/users/",
        json!({ "email": "new@user.com", "password": "Sturdy#Lamp42" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "new@user.com");
    assert_eq!(transport.outbox().len(), 1);

    let (status, body) = post(
        app,
        "/auth/jwt/create/",
        json!({ "email": "new@user.com", "password": "Sturdy#Lamp42" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["detail"],
        "Your account is not verified. A verification email has been sent to your inbox."
    );

    let outbox = transport.outbox();
    assert_eq!(outbox.len(), 2);
    assert_eq!(outbox[1].to, vec!["new@user.com".to_string()]);
    assert!(outbox[1].text_body.contains("http://accounts.example.com/#/activate/"));
}

#[tokio::test]
async fn test_error_body_is_problem_json() {
    let (app, _) = app();

    let (status, body) = post(
        app,
        "/auth/jwt/create/",
        json!({ "email": "nobody@user.com", "password": "whatever" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert_eq!(
        body["detail"],
        "No active account found with the given credentials"
    );
    assert!(body["title"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _) = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/jwt/create/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let (app, _) = app();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/auth/jwt/create/")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
}
