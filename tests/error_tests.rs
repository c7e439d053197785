// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side failures, health, and response headers.

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::send_json;

#[tokio::test]
async fn test_health_check() {
    let (app, _) = common::create_offline_app();

    let (status, body) = send_json(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["build_id"].as_str().is_some());
}

#[tokio::test]
async fn test_database_failure_is_generic_server_error() {
    let (app, _) = common::create_offline_app();

    let (status, body) = send_json(&app, Method::GET, "/api/leaderboard", None, None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_validation_runs_before_storage() {
    let (app, state) = common::create_offline_app();
    let token = common::create_test_jwt("offline-user", &state.config.jwt_signing_key);

    let (status, _) = common::log_activity(
        &app,
        &token,
        json!({"type": "bicycle", "data": {"distance": 1}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = common::log_activity(
        &app,
        &token,
        json!({"type": "food", "data": {"mealType": "Vegan"}}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
}

#[tokio::test]
async fn test_register_with_store_down() {
    let (app, _) = common::create_offline_app();

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"email": "down@example.com", "password": "password123"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let (app, _) = common::create_test_app();

    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .uri("/api/emission-factors")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("cache-control").unwrap(), "no-store");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
}
