// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! EcoTrack API Server
//!
//! Carbon-footprint tracking: users log activities, the server computes
//! emissions and eco-points, and a leaderboard ranks the results.

use ecotrack::{config::Config, db::Database, services::MealAnalyzer, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.database_backend,
        "Starting EcoTrack API"
    );

    let db = Database::connect(&config).await?;

    let meal_analyzer = MealAnalyzer::from_config(&config);
    if !meal_analyzer.is_configured() {
        tracing::warn!("GEMINI_API_KEY not set; meal estimates will use the fallback value");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        meal_analyzer,
    });

    // Build router
    let app = ecotrack::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ecotrack=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}
