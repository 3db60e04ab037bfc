//! Feature construction for the outbreak classifier

use shared::{static_barangay_code, ClimateReading};

use crate::classifier::LabelEncoder;

/// Number of model inputs
pub const FEATURE_COUNT: usize = 4;

/// Model input names, in the order the classifier consumes them
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["rainfall", "temperature", "humidity", "barangay_encoded"];

/// Fixed-order model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    rainfall: f64,
    temperature: f64,
    humidity: f64,
    barangay_code: u32,
}

impl FeatureVector {
    pub fn new(rainfall: f64, temperature: f64, humidity: f64, barangay_code: u32) -> Self {
        Self {
            rainfall,
            temperature,
            humidity,
            barangay_code,
        }
    }

    /// Values in [`FEATURE_NAMES`] order
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.rainfall,
            self.temperature,
            self.humidity,
            self.barangay_code as f64,
        ]
    }
}

/// How barangay names become numeric codes
#[derive(Debug, Clone, PartialEq)]
pub enum BarangayEncoding {
    /// Encoder fit alongside the loaded model
    Learned(LabelEncoder),
    /// Built-in table used when no encoder artifact is available
    StaticTable,
}

/// Outcome of resolving a barangay name to a code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarangayCode {
    Learned(u32),
    StaticTable(u32),
    /// Name unknown to the active encoding
    Default,
}

impl BarangayCode {
    pub fn value(self) -> u32 {
        match self {
            BarangayCode::Learned(code) | BarangayCode::StaticTable(code) => code,
            BarangayCode::Default => 0,
        }
    }
}

impl BarangayEncoding {
    pub fn resolve(&self, barangay: &str) -> BarangayCode {
        match self {
            BarangayEncoding::Learned(encoder) => match encoder.transform(barangay) {
                Some(code) => BarangayCode::Learned(code),
                None => {
                    tracing::warn!(
                        "Barangay '{}' not seen by the encoder, using code 0",
                        barangay
                    );
                    BarangayCode::Default
                }
            },
            BarangayEncoding::StaticTable => match static_barangay_code(barangay) {
                Some(code) => BarangayCode::StaticTable(code),
                None => {
                    tracing::debug!("Barangay '{}' not in the static table", barangay);
                    BarangayCode::Default
                }
            },
        }
    }

    pub fn is_learned(&self) -> bool {
        matches!(self, BarangayEncoding::Learned(_))
    }
}

/// Assemble the classifier input. Ranges are not checked here.
pub fn build_features(
    reading: &ClimateReading,
    barangay: &str,
    encoding: &BarangayEncoding,
) -> FeatureVector {
    let code = encoding.resolve(barangay);
    FeatureVector::new(
        reading.rainfall,
        reading.temperature,
        reading.humidity,
        code.value(),
    )
}
