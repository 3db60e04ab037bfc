//! Configuration management for the mosKITA forecast service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with MOSKITA_ prefix

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Trained model artifacts
    pub model: ModelConfig,

    /// Data files and directories
    pub data: DataConfig,

    /// Random forest training parameters
    pub training: TrainingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Serialized random forest
    pub model_path: PathBuf,

    /// Serialized barangay label encoder
    pub encoder_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Historical climate series (date, rainfall, temperature, humidity)
    pub climate_csv: PathBuf,

    /// Dengue case counts (date, barangay, cases)
    pub cases_csv: PathBuf,

    /// Directory for uploaded CSV files
    pub data_dir: PathBuf,

    /// JSON-lines log of community case reports
    pub reports_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrainingConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("MOSKITA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("model.model_path", "rf_dengue_model.json")?
            .set_default("model.encoder_path", "barangay_encoder.json")?
            .set_default("data.climate_csv", "climate.csv")?
            .set_default("data.cases_csv", "dengue_cases.csv")?
            .set_default("data.data_dir", "data")?
            .set_default("data.reports_file", "data/case_reports.jsonl")?
            .set_default("training.n_estimators", 100)?
            .set_default("training.max_depth", 10)?
            .set_default("training.min_samples_split", 5)?
            .set_default("training.min_samples_leaf", 2)?
            .set_default("training.seed", 42)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (MOSKITA_ prefix)
            .add_source(
                Environment::with_prefix("MOSKITA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

impl Config {
    /// Configuration rooted at `dir`, for tools and tests that do not read
    /// the environment
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            model: ModelConfig {
                model_path: dir.join("rf_dengue_model.json"),
                encoder_path: dir.join("barangay_encoder.json"),
            },
            data: DataConfig {
                climate_csv: dir.join("climate.csv"),
                cases_csv: dir.join("dengue_cases.csv"),
                data_dir: dir.join("data"),
                reports_file: dir.join("data").join("case_reports.jsonl"),
            },
            training: TrainingConfig::default(),
        }
    }
}
