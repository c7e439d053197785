// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use ecotrack::config::Config;
use ecotrack::db::Database;
use ecotrack::routes::create_router;
use ecotrack::services::MealAnalyzer;
use ecotrack::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> Database {
    Database::firestore("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

#[allow(dead_code)]
pub fn app_with(config: Config, db: Database) -> (axum::Router, Arc<AppState>) {
    let meal_analyzer = MealAnalyzer::from_config(&config);
    let state = Arc::new(AppState {
        config,
        db,
        meal_analyzer,
    });

    (create_router(state.clone()), state)
}

/// Create a test app backed by an empty in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    app_with(Config::test_default(), Database::in_memory())
}

/// Create a test app whose database is unreachable.
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>) {
    app_with(Config::test_default(), Database::new_offline())
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    ecotrack::middleware::auth::create_jwt(user_id, signing_key).unwrap()
}

/// Send a request and decode the JSON response (Null for empty bodies).
#[allow(dead_code)]
pub async fn send_json(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Register an account and return its token and user ID.
#[allow(dead_code)]
pub async fn register(app: &axum::Router, email: &str, password: &str) -> (String, String) {
    let (status, body) = send_json(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// Log an activity as `token`, returning status and body.
#[allow(dead_code)]
pub async fn log_activity(app: &axum::Router, token: &str, body: Value) -> (StatusCode, Value) {
    send_json(app, Method::POST, "/api/activities", Some(token), Some(body)).await
}
