//! Process-wide model state
//!
//! Requests read an immutable [`ModelSnapshot`]. Reloading builds a
//! complete new snapshot and swaps it in; handlers holding the previous
//! snapshot keep using it until they finish.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Local};

use crate::classifier::{LabelEncoder, OutbreakClassifier, RandomForest};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::climate_index::{load_index, HistoricalClimateIndex};
use crate::services::features::BarangayEncoding;
use crate::services::training::{self, TrainingJob, TrainingReport};

/// Artifact locations the store loads from
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub model_path: PathBuf,
    pub encoder_path: PathBuf,
    pub climate_csv: PathBuf,
}

impl From<&Config> for ModelPaths {
    fn from(config: &Config) -> Self {
        Self {
            model_path: config.model.model_path.clone(),
            encoder_path: config.model.encoder_path.clone(),
            climate_csv: config.data.climate_csv.clone(),
        }
    }
}

/// Everything a forecast needs, loaded together
pub struct ModelSnapshot {
    pub classifier: Option<Arc<dyn OutbreakClassifier>>,
    pub encoding: BarangayEncoding,
    pub climate_index: Option<Arc<HistoricalClimateIndex>>,
    pub loaded_at: DateTime<Local>,
}

impl ModelSnapshot {
    pub fn new(
        classifier: Option<Arc<dyn OutbreakClassifier>>,
        encoding: BarangayEncoding,
        climate_index: Option<HistoricalClimateIndex>,
    ) -> Self {
        Self {
            classifier,
            encoding,
            climate_index: climate_index.map(Arc::new),
            loaded_at: Local::now(),
        }
    }

    /// No model, static barangay table, no history
    pub fn empty() -> Self {
        Self::new(None, BarangayEncoding::StaticTable, None)
    }

    pub fn is_model_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    /// Read every artifact, falling back independently for each one
    pub fn load(paths: &ModelPaths) -> Self {
        let classifier: Option<Arc<dyn OutbreakClassifier>> = if paths.model_path.exists() {
            match RandomForest::load(&paths.model_path) {
                Ok(forest) => {
                    tracing::info!("Model loaded from {}", paths.model_path.display());
                    Some(Arc::new(forest))
                }
                Err(e) => {
                    tracing::error!("Error loading model: {}", e);
                    None
                }
            }
        } else {
            tracing::warn!("Model file {} not found", paths.model_path.display());
            None
        };

        let encoding = if paths.encoder_path.exists() {
            match LabelEncoder::load(&paths.encoder_path) {
                Ok(encoder) => {
                    tracing::info!(
                        "Barangay encoder loaded with {} classes",
                        encoder.classes().len()
                    );
                    BarangayEncoding::Learned(encoder)
                }
                Err(e) => {
                    tracing::warn!("Error loading encoder, using static table: {}", e);
                    BarangayEncoding::StaticTable
                }
            }
        } else {
            tracing::warn!("Encoder not found, using static barangay table");
            BarangayEncoding::StaticTable
        };

        Self::new(classifier, encoding, load_index(&paths.climate_csv))
    }
}

/// Holder of the current snapshot
pub struct ModelStore {
    paths: ModelPaths,
    current: RwLock<Arc<ModelSnapshot>>,
    retrain_lock: tokio::sync::Mutex<()>,
}

impl ModelStore {
    /// Load the artifacts at `paths`. Never fails; missing pieces are
    /// logged and left out of the snapshot.
    pub fn load(paths: ModelPaths) -> Self {
        let snapshot = ModelSnapshot::load(&paths);
        Self::with_snapshot(paths, snapshot)
    }

    pub fn with_snapshot(paths: ModelPaths, snapshot: ModelSnapshot) -> Self {
        Self {
            paths,
            current: RwLock::new(Arc::new(snapshot)),
            retrain_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The snapshot to use for one request
    pub fn snapshot(&self) -> Arc<ModelSnapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Publish `snapshot`, replacing the current one
    pub fn replace(&self, snapshot: ModelSnapshot) -> Arc<ModelSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = snapshot.clone();
        snapshot
    }

    /// Re-read every artifact from disk and swap the result in
    pub fn reload(&self) -> Arc<ModelSnapshot> {
        self.publish_reloaded(ModelSnapshot::load(&self.paths))
    }

    fn publish_reloaded(&self, snapshot: ModelSnapshot) -> Arc<ModelSnapshot> {
        tracing::info!(
            "Reloaded model state (model loaded: {}, climate index: {})",
            snapshot.is_model_loaded(),
            snapshot.climate_index.is_some()
        );
        self.replace(snapshot)
    }

    /// Train a new model, save it and reload. Concurrent calls run one
    /// after the other.
    pub async fn retrain(&self, job: TrainingJob) -> AppResult<TrainingReport> {
        let _guard = self.retrain_lock.lock().await;
        tracing::info!("Retraining model from {}", job.cases_csv.display());

        let report = tokio::task::spawn_blocking(move || training::run(&job))
            .await
            .map_err(|e| AppError::Internal(format!("Training task failed: {}", e)))??;

        let paths = self.paths.clone();
        let snapshot = tokio::task::spawn_blocking(move || ModelSnapshot::load(&paths))
            .await
            .map_err(|e| AppError::Internal(format!("Reload task failed: {}", e)))?;
        self.publish_reloaded(snapshot);
        Ok(report)
    }
}
