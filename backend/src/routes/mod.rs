//! Route definitions for the mosKITA forecast API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/barangays", get(handlers::list_barangays))
        .nest("/model", model_routes())
        .nest("/predict", predict_routes())
        .nest("/upload", upload_routes())
        .route("/uploads", get(handlers::list_uploads))
        .route("/report-case", post(handlers::report_case))
        .route("/case-reports", get(handlers::list_case_reports))
        .route("/insights", get(handlers::get_insights))
}

/// Model management routes
fn model_routes() -> Router<AppState> {
    Router::new()
        .route("/info", get(handlers::model_info))
        .route("/reload", post(handlers::reload_model))
        .route("/retrain", post(handlers::retrain_model))
}

/// Forecast routes
fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::predict))
        .route("/batch", post(handlers::predict_batch))
        .route("/weekly/:barangay", get(handlers::weekly_risk))
        .route("/test", post(handlers::self_test))
}

/// Data upload routes
fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/climate", post(handlers::upload_climate))
        .route("/dengue", post(handlers::upload_dengue))
}
