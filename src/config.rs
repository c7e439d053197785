// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development. In production the
//! signing key and Gemini API key arrive as environment variables injected
//! by the deployment.

use std::env;
use std::str::FromStr;

/// Default Gemini REST endpoint (v1beta `generateContent`).
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    /// Google Cloud Firestore (or its emulator).
    Firestore,
    /// Process-local store; data is lost on restart.
    Memory,
}

impl FromStr for DatabaseBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(DatabaseBackend::Firestore),
            "memory" => Ok(DatabaseBackend::Memory),
            _ => Err(ConfigError::Invalid("DATABASE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Document store selection
    pub database_backend: DatabaseBackend,
    /// Gemini model used for meal estimation
    pub gemini_model: String,
    /// Gemini REST base URL
    pub gemini_api_url: String,
    /// Mount the development-only `/api/admin/*` routes
    pub enable_admin_routes: bool,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Gemini API key; meal estimation falls back to a constant without it
    pub gemini_api_key: Option<String>,
}

impl Config {
    /// Config for tests: in-memory store, admin routes on, no Gemini key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 5000,
            database_backend: DatabaseBackend::Memory,
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            enable_admin_routes: true,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            gemini_api_key: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            database_backend: env::var("DATABASE_BACKEND")
                .map(|v| v.parse())
                .unwrap_or(Ok(DatabaseBackend::Firestore))?,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            gemini_api_url: env::var("GEMINI_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string()),
            enable_admin_routes: env::var("ENABLE_ADMIN_ROUTES")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .trim()
                .as_bytes()
                .to_vec(),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
