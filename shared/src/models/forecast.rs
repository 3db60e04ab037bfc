//! Forecast request and response models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::climate::{ClimateInput, ClimateSource};

/// Probability below which a week is rated Low
pub const MODERATE_RISK_THRESHOLD: f64 = 0.30;

/// Probability from which a week is rated High
pub const HIGH_RISK_THRESHOLD: f64 = 0.60;

/// Outbreak risk tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Map an outbreak probability to a risk tier
    pub fn from_probability(probability: f64) -> Self {
        if probability < MODERATE_RISK_THRESHOLD {
            RiskLevel::Low
        } else if probability < HIGH_RISK_THRESHOLD {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Moderate => write!(f, "Moderate"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Forecast request for one barangay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub barangay: String,
    pub climate: ClimateInput,
    /// Start date, `YYYY-MM-DD`
    pub date: String,
}

/// Climate values a forecast week was computed from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClimateUsed {
    pub rainfall: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub source: ClimateSource,
}

/// Risk forecast for a single week
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyForecast {
    /// Display label such as `December 01–07`
    pub week: String,
    pub risk: RiskLevel,
    pub probability: f64,
    pub outbreak_probability: f64,
    pub climate_used: ClimateUsed,
}

/// Description of the model that produced a forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub features_used: Vec<String>,
    pub prediction_date: String,
}

/// Response of the single forecast endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub weekly_forecast: Vec<WeeklyForecast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

/// One entry of a batch forecast.
///
/// Either `forecast` or `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictionResult {
    pub barangay: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<WeeklyForecast>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Risk per week start date, keyed `YYYY-MM-DD`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyRiskMap {
    pub barangay: String,
    pub weekly_predictions: BTreeMap<String, RiskLevel>,
}

/// Probability pair returned by the self-test endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutbreakProbabilities {
    pub no_outbreak: f64,
    pub outbreak: f64,
}

/// Result of running the loaded model on a fixed sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSelfTest {
    pub status: String,
    pub test_features: super::climate::ClimateReading,
    pub prediction: u8,
    pub probabilities: OutbreakProbabilities,
    pub risk_level: RiskLevel,
}
