//! Climate data models

use serde::{Deserialize, Serialize};

/// A rainfall / temperature / humidity triple.
///
/// Used both for the caller-supplied current conditions and for
/// historical estimates. Never persisted on its own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClimateReading {
    /// Rainfall in millimetres
    pub rainfall: f64,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
}

impl ClimateReading {
    /// Fallback reading used when neither history nor a base reading is known
    pub const DEFAULT: ClimateReading = ClimateReading {
        rainfall: 100.0,
        temperature: 28.0,
        humidity: 75.0,
    };

    pub fn new(rainfall: f64, temperature: f64, humidity: f64) -> Self {
        Self {
            rainfall,
            temperature,
            humidity,
        }
    }
}

impl Default for ClimateReading {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Climate conditions as submitted by API clients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClimateInput {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
}

impl From<ClimateInput> for ClimateReading {
    fn from(input: ClimateInput) -> Self {
        ClimateReading::new(input.rainfall, input.temperature, input.humidity)
    }
}

/// Where the climate values of a forecast week came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClimateSource {
    Current,
    HistoricalAverage,
}

/// One row of a historical climate CSV file.
///
/// Numeric fields are optional so that rows with blanks deserialize and
/// can be dropped by the caller instead of failing the whole file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawClimateRow {
    pub date: String,
    pub rainfall: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

/// One row of a dengue case-count CSV file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawCaseRow {
    pub date: String,
    pub barangay: Option<String>,
    pub cases: Option<f64>,
}
