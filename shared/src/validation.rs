//! Validation utilities for forecast inputs and uploaded data

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::models::ClimateInput;

/// A rejected input field and the message shown to the caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationFailure {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationFailure {
    const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

// ============================================================================
// Forecast Input Validations
// ============================================================================

/// Validate the climate conditions of a forecast request.
///
/// NaN fails every range check.
pub fn validate_climate_input(climate: &ClimateInput) -> Result<(), ValidationFailure> {
    if !(0.0..=50.0).contains(&climate.temperature) {
        return Err(ValidationFailure::new(
            "temperature",
            "Temperature must be between 0 and 50°C",
        ));
    }
    if !(0.0..=100.0).contains(&climate.humidity) {
        return Err(ValidationFailure::new(
            "humidity",
            "Humidity must be between 0 and 100%",
        ));
    }
    if !(climate.rainfall >= 0.0) {
        return Err(ValidationFailure::new(
            "rainfall",
            "Rainfall cannot be negative",
        ));
    }
    Ok(())
}

/// Parse a forecast start date, strictly `YYYY-MM-DD`
pub fn parse_forecast_date(value: &str) -> Result<NaiveDate, ValidationFailure> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationFailure::new("date", "Invalid date format. Use YYYY-MM-DD"))
}

// ============================================================================
// Data File Validations
// ============================================================================

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse the date column of a data file.
///
/// Accepts the common spreadsheet export formats and keeps only the date
/// part of timestamps. Returns `None` for anything else.
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Required columns missing from a CSV header row
pub fn missing_columns<'a>(headers: &[String], required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim() == **col))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn climate(temperature: f64, humidity: f64, rainfall: f64) -> ClimateInput {
        ClimateInput {
            temperature,
            humidity,
            rainfall,
        }
    }

    #[test]
    fn test_valid_climate() {
        assert!(validate_climate_input(&climate(28.0, 75.0, 100.0)).is_ok());
        assert!(validate_climate_input(&climate(0.0, 0.0, 0.0)).is_ok());
        assert!(validate_climate_input(&climate(50.0, 100.0, 900.0)).is_ok());
    }

    #[test]
    fn test_temperature_out_of_range() {
        let err = validate_climate_input(&climate(55.0, 75.0, 100.0)).unwrap_err();
        assert_eq!(err.field, "temperature");
        assert!(validate_climate_input(&climate(-0.1, 75.0, 100.0)).is_err());
    }

    #[test]
    fn test_humidity_out_of_range() {
        let err = validate_climate_input(&climate(28.0, 100.5, 100.0)).unwrap_err();
        assert_eq!(err.field, "humidity");
    }

    #[test]
    fn test_negative_rainfall() {
        let err = validate_climate_input(&climate(28.0, 75.0, -1.0)).unwrap_err();
        assert_eq!(err.message, "Rainfall cannot be negative");
    }

    #[test]
    fn test_nan_rejected() {
        assert!(validate_climate_input(&climate(f64::NAN, 75.0, 100.0)).is_err());
        assert!(validate_climate_input(&climate(28.0, f64::NAN, 100.0)).is_err());
        assert!(validate_climate_input(&climate(28.0, 75.0, f64::NAN)).is_err());
    }

    #[test]
    fn test_forecast_date() {
        assert_eq!(
            parse_forecast_date("2025-03-05").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
        );
        assert!(parse_forecast_date("2025-13-40").is_err());
        assert!(parse_forecast_date("05/03/2025").is_err());
        assert!(parse_forecast_date("").is_err());
    }

    #[test]
    fn test_record_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        assert_eq!(parse_record_date("2024-07-09"), Some(expected));
        assert_eq!(parse_record_date("2024/07/09"), Some(expected));
        assert_eq!(parse_record_date("07/09/2024"), Some(expected));
        assert_eq!(parse_record_date("2024-07-09 13:45:00"), Some(expected));
        assert_eq!(parse_record_date("2024-07-09T13:45:00+08:00"), Some(expected));
        assert_eq!(parse_record_date(" 2024-07-09 "), Some(expected));
        assert_eq!(parse_record_date("not a date"), None);
        assert_eq!(parse_record_date(""), None);
    }

    #[test]
    fn test_missing_columns() {
        let headers: Vec<String> = ["date", "rainfall", " humidity"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let missing = missing_columns(&headers, &["date", "rainfall", "temperature", "humidity"]);
        assert_eq!(missing, vec!["temperature"]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_climate_accepted_iff_in_range(
                temperature in -20.0f64..70.0,
                humidity in -20.0f64..120.0,
                rainfall in -100.0f64..1000.0,
            ) {
                let in_range = (0.0..=50.0).contains(&temperature)
                    && (0.0..=100.0).contains(&humidity)
                    && rainfall >= 0.0;
                let result = validate_climate_input(&climate(temperature, humidity, rainfall));
                prop_assert_eq!(result.is_ok(), in_range);
            }

            #[test]
            fn prop_forecast_date_round_trips(days in 0i64..20000) {
                let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Duration::days(days);
                let text = date.format("%Y-%m-%d").to_string();
                prop_assert_eq!(parse_forecast_date(&text).unwrap(), date);
                prop_assert_eq!(parse_record_date(&text), Some(date));
            }
        }
    }
}
