//! Training pipeline tests
//!
//! Trains on synthetic data where outbreaks follow rainfall, then serves the
//! saved artifacts through the model store.

use std::path::Path;

use chrono::NaiveDate;
use dengue_forecast_backend::classifier::{ForestParams, LabelEncoder, OutbreakClassifier, RandomForest};
use dengue_forecast_backend::services::features::FeatureVector;
use dengue_forecast_backend::services::training::{self, TrainingError, TrainingJob};
use dengue_forecast_backend::services::{ForecastService, ModelPaths, ModelStore};
use shared::{ClimateInput, RiskLevel, BARANGAYS};

const DAYS: i64 = 300;

fn rainfall_on(day: i64) -> f64 {
    ((day * 37) % 300) as f64
}

fn write_dataset(dir: &Path) {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let mut climate = String::from("date,rainfall,temperature,humidity\n");
    let mut cases = String::from("date,barangay,cases\n");

    for day in 0..DAYS {
        let date = (start + chrono::Duration::days(day)).format("%Y-%m-%d");
        let rainfall = rainfall_on(day);
        let temperature = 26.0 + (day % 7) as f64 * 0.5;
        let humidity = 70.0 + (day % 11) as f64;
        climate.push_str(&format!("{date},{rainfall},{temperature},{humidity}\n"));

        for barangay in BARANGAYS {
            let count = if rainfall > 150.0 { 1 + day % 3 } else { 0 };
            cases.push_str(&format!("{date},{barangay},{count}\n"));
        }
    }
    // Case rows without a matching climate date are dropped by the join
    cases.push_str("2030-01-01,Morales,5\n");

    std::fs::write(dir.join("climate.csv"), climate).unwrap();
    std::fs::write(dir.join("dengue_cases.csv"), cases).unwrap();
}

fn job(dir: &Path) -> TrainingJob {
    TrainingJob {
        climate_csv: dir.join("climate.csv"),
        cases_csv: dir.join("dengue_cases.csv"),
        model_path: dir.join("models").join("rf_dengue_model.json"),
        encoder_path: dir.join("models").join("barangay_encoder.json"),
        params: ForestParams {
            n_estimators: 25,
            ..ForestParams::default()
        },
    }
}

fn paths(job: &TrainingJob) -> ModelPaths {
    ModelPaths {
        model_path: job.model_path.clone(),
        encoder_path: job.encoder_path.clone(),
        climate_csv: job.climate_csv.clone(),
    }
}

#[test]
fn test_training_report_and_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let job = job(dir.path());

    let report = training::run(&job).unwrap();

    assert_eq!(report.samples, DAYS as usize * BARANGAYS.len());
    assert_eq!(report.train_samples + report.test_samples, report.samples);
    assert_eq!(report.barangays.len(), 5);
    assert!(report.metrics.accuracy >= 0.9, "accuracy {}", report.metrics.accuracy);

    let top = &report.metrics.feature_importance[0];
    assert_eq!(top.feature, "rainfall");
    let sum: f64 = report.metrics.feature_importance.iter().map(|f| f.importance).sum();
    assert!((sum - 1.0).abs() < 1e-3);

    let forest = RandomForest::load(&job.model_path).unwrap();
    assert_eq!(forest.n_estimators(), Some(25));
    let encoder = LabelEncoder::load(&job.encoder_path).unwrap();
    for name in BARANGAYS {
        assert_eq!(encoder.transform(name), shared::static_barangay_code(name));
    }

    let [_, wet] = forest.predict_proba(&FeatureVector::new(290.0, 28.0, 75.0, 1));
    let [_, dry] = forest.predict_proba(&FeatureVector::new(10.0, 28.0, 75.0, 1));
    assert!(wet > 0.5 && dry < 0.5);
}

#[test]
fn test_missing_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = training::run(&job(dir.path())).unwrap_err();
    assert!(matches!(err, TrainingError::MissingFile(_)));
    assert!(err.is_data_error());
}

#[test]
fn test_no_overlapping_dates() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("climate.csv"),
        "date,rainfall,temperature,humidity\n2024-01-01,10,28,80\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("dengue_cases.csv"),
        "date,barangay,cases\n2024-02-01,Morales,1\n",
    )
    .unwrap();
    assert!(matches!(
        training::run(&job(dir.path())),
        Err(TrainingError::NoData)
    ));
}

#[test]
fn test_reload_after_training() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let job = job(dir.path());
    let store = ModelStore::load(paths(&job));

    let before = store.snapshot();
    assert!(!before.is_model_loaded());

    training::run(&job).unwrap();
    let after = store.reload();

    assert!(!before.is_model_loaded());
    assert!(after.is_model_loaded());
    assert!(after.encoding.is_learned());
    assert!(after.climate_index.is_some());

    let forecast = ForecastService::new(store.snapshot())
        .forecast(
            "Morales",
            "2024-06-03",
            &ClimateInput {
                temperature: 28.0,
                humidity: 80.0,
                rainfall: 295.0,
            },
        )
        .unwrap();
    assert_eq!(forecast.len(), 4);
    assert_ne!(forecast[0].risk, RiskLevel::Low);
}

#[tokio::test]
async fn test_retrain_publishes_new_model() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let job = job(dir.path());
    let store = ModelStore::load(paths(&job));

    let before = store.snapshot();
    let report = store.retrain(job).await.unwrap();
    assert!(report.metrics.accuracy >= 0.9);

    let after = store.snapshot();
    assert!(!before.is_model_loaded());
    assert!(after.is_model_loaded());
    assert!(after.encoding.is_learned());
    assert!(after.climate_index.is_some());
}
