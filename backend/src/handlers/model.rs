//! HTTP handlers for model management

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::services::features::FEATURE_NAMES;
use crate::services::training::{TrainingJob, TrainingMetrics};
use crate::AppState;

#[derive(Serialize)]
pub struct ModelInfoResponse {
    pub model_type: String,
    pub model_loaded: bool,
    pub feature_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<usize>,
    pub expected_features: Vec<String>,
}

#[derive(Serialize)]
pub struct ReloadResponse {
    pub message: String,
    pub model_loaded: bool,
    pub climate_index_loaded: bool,
}

#[derive(Serialize)]
pub struct RetrainResponse {
    pub message: String,
    pub metrics: TrainingMetrics,
    pub model_loaded: bool,
}

/// Describe the loaded model
pub async fn model_info(State(state): State<AppState>) -> AppResult<Json<ModelInfoResponse>> {
    let snapshot = state.models.snapshot();
    let classifier = snapshot
        .classifier
        .as_deref()
        .ok_or(AppError::ModelUnavailable)?;

    Ok(Json(ModelInfoResponse {
        model_type: classifier.model_type().to_string(),
        model_loaded: true,
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        n_estimators: classifier.n_estimators(),
        expected_features: classifier.feature_names().to_vec(),
    }))
}

/// Re-read the model, encoder and climate history from disk
pub async fn reload_model(State(state): State<AppState>) -> AppResult<Json<ReloadResponse>> {
    let models = state.models.clone();
    let snapshot = tokio::task::spawn_blocking(move || models.reload())
        .await
        .map_err(|e| AppError::Internal(format!("Reload task failed: {}", e)))?;

    Ok(Json(ReloadResponse {
        message: "Model reloaded".to_string(),
        model_loaded: snapshot.is_model_loaded(),
        climate_index_loaded: snapshot.climate_index.is_some(),
    }))
}

/// Retrain from the configured data files, then reload
pub async fn retrain_model(State(state): State<AppState>) -> AppResult<Json<RetrainResponse>> {
    let job = TrainingJob::from_config(&state.config);
    let report = state.models.retrain(job).await?;

    Ok(Json(RetrainResponse {
        message: "Model retrained successfully".to_string(),
        metrics: report.metrics,
        model_loaded: state.models.snapshot().is_model_loaded(),
    }))
}
