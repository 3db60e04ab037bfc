//! mosKITA dengue forecast service
//!
//! Four-week dengue outbreak risk forecasts for the barangays of Naga City,
//! served over HTTP from a model trained offline by `moskita-train`.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub mod classifier;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

pub use crate::config::Config;

use services::{CaseReportService, ModelPaths, ModelStore, UploadService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub models: Arc<ModelStore>,
    pub reports: Arc<CaseReportService>,
    pub uploads: UploadService,
}

impl AppState {
    /// Load the model artifacts named in `config`
    pub fn new(config: Config) -> Self {
        let models = ModelStore::load(ModelPaths::from(&config));
        Self::with_store(config, models)
    }

    pub fn with_store(config: Config, models: ModelStore) -> Self {
        Self {
            reports: Arc::new(CaseReportService::new(config.data.reports_file.clone())),
            uploads: UploadService::new(config.data.data_dir.clone()),
            models: Arc::new(models),
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .merge(routes::api_routes())
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
