//! HTTP handlers for forecast endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{
    BatchPredictionResult, ModelSelfTest, PredictionRequest, PredictionResponse, WeeklyRiskMap,
};

use crate::error::{AppError, AppResult};
use crate::services::ForecastService;
use crate::AppState;

fn service(state: &AppState) -> ForecastService {
    ForecastService::new(state.models.snapshot())
}

/// Four-week forecast for one barangay
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictionRequest>,
) -> AppResult<Json<PredictionResponse>> {
    let response = service(&state).predict(&request)?;
    Ok(Json(response))
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchPredictionResult>,
}

/// Forecasts for several barangays; each item succeeds or fails on its own
pub async fn predict_batch(
    State(state): State<AppState>,
    Json(requests): Json<Vec<PredictionRequest>>,
) -> Json<BatchResponse> {
    Json(BatchResponse {
        results: service(&state).predict_batch(&requests),
    })
}

#[derive(Debug, Deserialize)]
pub struct WeeklyQuery {
    pub start_date: Option<String>,
}

/// Risk levels for four weeks under default climate conditions
pub async fn weekly_risk(
    State(state): State<AppState>,
    Path(barangay): Path<String>,
    Query(query): Query<WeeklyQuery>,
) -> AppResult<Json<WeeklyRiskMap>> {
    let start_date = query.start_date.ok_or_else(|| AppError::Validation {
        field: "start_date".to_string(),
        message: "start_date is required (YYYY-MM-DD)".to_string(),
    })?;
    let map = service(&state).weekly_risk_map(&barangay, &start_date)?;
    Ok(Json(map))
}

/// Run the loaded model on a fixed sample
pub async fn self_test(State(state): State<AppState>) -> AppResult<Json<ModelSelfTest>> {
    Ok(Json(service(&state).self_test()?))
}
