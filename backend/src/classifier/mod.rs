//! Outbreak classifier capability
//!
//! The forecast pipeline only sees [`OutbreakClassifier`]. The concrete
//! model shipped with the service is a [`RandomForest`] fit by the training
//! CLI and persisted as JSON next to its [`LabelEncoder`].

pub mod encoder;
pub mod forest;
pub mod tree;

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::services::features::FeatureVector;

pub use encoder::LabelEncoder;
pub use forest::{ForestParams, RandomForest};

/// Binary outbreak classifier.
///
/// Implementations must be pure: the same feature vector always yields the
/// same probabilities.
pub trait OutbreakClassifier: Send + Sync {
    /// `[p_no_outbreak, p_outbreak]`, both in `[0, 1]` and summing to 1
    fn predict_proba(&self, features: &FeatureVector) -> [f64; 2];

    /// Human readable model family, e.g. `RandomForestClassifier`
    fn model_type(&self) -> &str;

    /// Number of ensemble members, if the model is an ensemble
    fn n_estimators(&self) -> Option<usize> {
        None
    }

    /// Feature names in the order the model was trained with
    fn feature_names(&self) -> &[String];
}

/// Errors reading or writing model artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed artifact {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("Invalid artifact {path}: {reason}")]
    Invalid { path: String, reason: String },
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.display().to_string(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }
    std::fs::write(path, json).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Json {
        path: path.display().to_string(),
        source,
    })
}
