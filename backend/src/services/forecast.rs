//! Four-week dengue outbreak forecast

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use shared::{
    format_week_range, parse_forecast_date, round_decimal, validate_climate_input,
    BatchPredictionResult, ClimateInput, ClimateReading, ClimateSource, ClimateUsed, ModelInfo,
    ModelSelfTest, OutbreakProbabilities, PredictionRequest, PredictionResponse, RiskLevel,
    WeeklyForecast, WeeklyRiskMap,
};

use crate::classifier::OutbreakClassifier;
use crate::error::{AppError, AppResult};
use crate::services::climate_resolver::resolve;
use crate::services::features::{build_features, FEATURE_NAMES};
use crate::services::model_store::ModelSnapshot;

/// Number of weeks in a forecast
pub const FORECAST_WEEKS: u32 = 4;

/// Barangay used by the model self-test
const SELF_TEST_BARANGAY: &str = "Santa Cruz";

/// Forecasting over one model snapshot
pub struct ForecastService {
    snapshot: Arc<ModelSnapshot>,
}

impl ForecastService {
    pub fn new(snapshot: Arc<ModelSnapshot>) -> Self {
        Self { snapshot }
    }

    fn classifier(&self) -> AppResult<&dyn OutbreakClassifier> {
        self.snapshot
            .classifier
            .as_deref()
            .ok_or(AppError::ModelUnavailable)
    }

    /// Forecast four consecutive weeks starting at `date`.
    ///
    /// Week 1 uses `climate` as given; later weeks use the historical
    /// estimate for their start date.
    pub fn forecast(
        &self,
        barangay: &str,
        date: &str,
        climate: &ClimateInput,
    ) -> AppResult<Vec<WeeklyForecast>> {
        let classifier = self.classifier()?;
        validate_climate_input(climate)?;
        let start = parse_forecast_date(date)?;

        Ok(self.forecast_from(classifier, barangay, start, &ClimateReading::from(*climate)))
    }

    fn forecast_from(
        &self,
        classifier: &dyn OutbreakClassifier,
        barangay: &str,
        start: NaiveDate,
        current: &ClimateReading,
    ) -> Vec<WeeklyForecast> {
        let index = self.snapshot.climate_index.as_deref();

        (0..FORECAST_WEEKS)
            .map(|week| {
                let week_start = start + Duration::weeks(i64::from(week));
                let (reading, source) = if week == 0 {
                    (*current, ClimateSource::Current)
                } else {
                    (
                        resolve(index, week_start, Some(current), week),
                        ClimateSource::HistoricalAverage,
                    )
                };

                let features = build_features(&reading, barangay, &self.snapshot.encoding);
                let probability = classifier.predict_proba(&features)[1];
                let rounded = round_decimal(probability, 4);

                WeeklyForecast {
                    week: format_week_range(week_start),
                    risk: RiskLevel::from_probability(probability),
                    probability: rounded,
                    outbreak_probability: rounded,
                    climate_used: ClimateUsed {
                        rainfall: round_decimal(reading.rainfall, 1),
                        temperature: round_decimal(reading.temperature, 1),
                        humidity: round_decimal(reading.humidity, 1),
                        source,
                    },
                }
            })
            .collect()
    }

    fn model_info(&self) -> AppResult<ModelInfo> {
        Ok(ModelInfo {
            model_type: self.classifier()?.model_type().to_string(),
            features_used: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            prediction_date: Local::now().to_rfc3339(),
        })
    }

    /// Forecast for one request, with model metadata
    pub fn predict(&self, request: &PredictionRequest) -> AppResult<PredictionResponse> {
        let weekly_forecast = self.forecast(&request.barangay, &request.date, &request.climate)?;
        tracing::info!(
            "Forecast for {} from {}: {}",
            request.barangay,
            request.date,
            weekly_forecast
                .iter()
                .map(|w| w.risk.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(PredictionResponse {
            weekly_forecast,
            model_info: Some(self.model_info()?),
        })
    }

    /// Forecast each request independently; failures are reported per item
    pub fn predict_batch(&self, requests: &[PredictionRequest]) -> Vec<BatchPredictionResult> {
        requests
            .iter()
            .map(|request| {
                let outcome = self
                    .forecast(&request.barangay, &request.date, &request.climate)
                    .and_then(|forecast| Ok((forecast, self.model_info()?)));
                match outcome {
                    Ok((forecast, model_info)) => BatchPredictionResult {
                        barangay: request.barangay.clone(),
                        date: request.date.clone(),
                        forecast: Some(forecast),
                        model_info: Some(model_info),
                        error: None,
                    },
                    Err(e) => {
                        tracing::debug!("Batch item for {} failed: {}", request.barangay, e);
                        BatchPredictionResult {
                            barangay: request.barangay.clone(),
                            date: request.date.clone(),
                            forecast: None,
                            model_info: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect()
    }

    /// Risk per week start date under default climate conditions
    pub fn weekly_risk_map(&self, barangay: &str, start_date: &str) -> AppResult<WeeklyRiskMap> {
        let classifier = self.classifier()?;
        let start = parse_forecast_date(start_date)?;

        let weekly_predictions: BTreeMap<String, RiskLevel> = self
            .forecast_from(classifier, barangay, start, &ClimateReading::DEFAULT)
            .into_iter()
            .zip(0..FORECAST_WEEKS)
            .map(|(week, offset)| {
                let week_start = start + Duration::weeks(i64::from(offset));
                (week_start.format("%Y-%m-%d").to_string(), week.risk)
            })
            .collect();

        Ok(WeeklyRiskMap {
            barangay: barangay.to_string(),
            weekly_predictions,
        })
    }

    /// Run the loaded model on a fixed sample
    pub fn self_test(&self) -> AppResult<ModelSelfTest> {
        let classifier = self.classifier()?;
        let reading = ClimateReading::DEFAULT;
        let features = build_features(&reading, SELF_TEST_BARANGAY, &self.snapshot.encoding);
        let [no_outbreak, outbreak] = classifier.predict_proba(&features);

        Ok(ModelSelfTest {
            status: "success".to_string(),
            test_features: reading,
            prediction: u8::from(outbreak > no_outbreak),
            probabilities: OutbreakProbabilities {
                no_outbreak,
                outbreak,
            },
            risk_level: RiskLevel::from_probability(outbreak),
        })
    }
}
