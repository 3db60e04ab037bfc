//! Service status handlers

use axum::{extract::State, http::Uri, Json};
use chrono::Local;
use serde::Serialize;
use shared::BARANGAYS;

use crate::error::AppError;
use crate::AppState;

#[derive(Serialize)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
    pub version: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct BarangaysResponse {
    pub barangays: Vec<String>,
}

/// Root endpoint
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok".to_string(),
        message: "mosKITA Dengue Forecast API".to_string(),
        model_loaded: state.models.snapshot().is_model_loaded(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.models.snapshot().is_model_loaded(),
        timestamp: Local::now().to_rfc3339(),
    })
}

/// Barangays covered by the forecasts
pub async fn list_barangays() -> Json<BarangaysResponse> {
    Json(BarangaysResponse {
        barangays: BARANGAYS.iter().map(|b| b.to_string()).collect(),
    })
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {}", uri.path()))
}
