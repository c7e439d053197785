// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: registration, login, profile, and goal.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::user::normalize_email;
use crate::models::{User, UserProfile};
use crate::services::credentials::{hash_password, verify_password};
use crate::AppState;

/// Routes that issue credentials (no auth required).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

/// Routes for the signed-in user (auth applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/me", get(get_me))
        .route("/api/auth/goal", put(update_goal))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token plus profile, returned by register and login.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub target_kg: f64,
}

fn issue_session(state: &AppState, user: &User) -> Result<AuthResponse> {
    let token = create_jwt(&user.id, &state.config.jwt_signing_key)?;
    Ok(AuthResponse {
        token,
        user: user.profile(),
    })
}

/// Create an account and sign it in.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    req.email = normalize_email(&req.email);
    req.validate()?;

    let password_hash = hash_password(&req.password)?;
    let user = User::new(&req.email, password_hash);

    state.db.create_user(&user).await.inspect_err(|e| {
        if matches!(e, AppError::Conflict(_)) {
            tracing::info!(email = %user.email, "Registration for existing email rejected");
        }
    })?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(issue_session(&state, &user)?)))
}

/// Exchange email and password for a session token.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    req.email = normalize_email(&req.email);
    req.validate()?;

    let Some(user) = state.db.find_user_by_email(&req.email).await? else {
        tracing::info!("Login for unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "Login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(issue_session(&state, &user)?))
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile.profile()))
}

/// Set the monthly carbon budget.
async fn update_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<GoalRequest>,
) -> Result<Json<UserProfile>> {
    if !req.target_kg.is_finite() || req.target_kg <= 0.0 {
        return Err(AppError::BadRequest(
            "target_kg must be a positive number".to_string(),
        ));
    }

    let updated = state
        .db
        .update_target_kg(&user.user_id, req.target_kg)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.user_id, target_kg = req.target_kg, "Goal updated");

    Ok(Json(updated.profile()))
}
