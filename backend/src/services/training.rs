//! Offline training of the outbreak classifier
//!
//! Joins the historical climate series with per-barangay case counts,
//! fits a [`RandomForest`] on `[rainfall, temperature, humidity,
//! barangay_encoded]` with label `cases > 0`, evaluates it on a stratified
//! hold-out split and writes the model and encoder artifacts.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use shared::{missing_columns, parse_record_date, round_to, ClimateReading, RawCaseRow, RawClimateRow};
use thiserror::Error;

use crate::classifier::forest::FitError;
use crate::classifier::{ArtifactError, ForestParams, LabelEncoder, RandomForest};
use crate::config::{Config, TrainingConfig};
use crate::services::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// Columns required in the climate series
pub const CLIMATE_COLUMNS: &[&str] = &["date", "rainfall", "temperature", "humidity"];

/// Columns required in the case counts
pub const CASE_COLUMNS: &[&str] = &["date", "barangay", "cases"];

/// Share of rows held out for evaluation
const TEST_FRACTION: f64 = 0.25;

/// Training errors
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Data file not found: {0}")]
    MissingFile(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{file} must contain columns: {}", .columns.join(", "))]
    MissingColumns { file: String, columns: Vec<String> },

    #[error("No rows left after joining climate and case data")]
    NoData,

    #[error("Each class needs at least 2 rows for a stratified split (no outbreak: {negatives}, outbreak: {positives})")]
    SingleClass { negatives: usize, positives: usize },

    #[error("Model fitting failed: {0}")]
    Fit(#[from] FitError),

    #[error("Could not save artifacts: {0}")]
    Serialization(#[from] ArtifactError),
}

impl TrainingError {
    /// Whether the failure is caused by the input data rather than the
    /// environment
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            TrainingError::MissingFile(_)
                | TrainingError::MissingColumns { .. }
                | TrainingError::NoData
                | TrainingError::SingleClass { .. }
        )
    }
}

/// Everything needed for one training run
#[derive(Debug, Clone)]
pub struct TrainingJob {
    pub climate_csv: PathBuf,
    pub cases_csv: PathBuf,
    pub model_path: PathBuf,
    pub encoder_path: PathBuf,
    pub params: ForestParams,
}

impl TrainingJob {
    pub fn from_config(config: &Config) -> Self {
        Self {
            climate_csv: config.data.climate_csv.clone(),
            cases_csv: config.data.cases_csv.clone(),
            model_path: config.model.model_path.clone(),
            encoder_path: config.model.encoder_path.clone(),
            params: ForestParams::from(&config.training),
        }
    }
}

impl From<&TrainingConfig> for ForestParams {
    fn from(config: &TrainingConfig) -> Self {
        ForestParams {
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            seed: config.seed,
            ..ForestParams::default()
        }
    }
}

/// One joined row: the climate of a date and the cases of one barangay
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub date: NaiveDate,
    pub barangay: String,
    pub climate: ClimateReading,
    pub cases: f64,
}

impl TrainingRecord {
    pub fn is_outbreak(&self) -> bool {
        self.cases > 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Hold-out evaluation of a fitted model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub confusion_matrix: ConfusionMatrix,
    /// Sorted by importance, highest first
    pub feature_importance: Vec<FeatureImportance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarangayStats {
    pub barangay: String,
    pub records: usize,
    pub mean_cases: f64,
    pub outbreak_share: f64,
}

/// Summary of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    pub outbreak_samples: usize,
    pub barangays: Vec<String>,
    pub barangay_stats: Vec<BarangayStats>,
    pub metrics: TrainingMetrics,
}

/// Fitted artifacts and their evaluation
pub struct TrainedModel {
    pub forest: RandomForest,
    pub encoder: LabelEncoder,
    pub report: TrainingReport,
}

fn read_headers(reader: &mut csv::Reader<std::fs::File>) -> Result<Vec<String>, TrainingError> {
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

fn open_csv(path: &Path, required: &[&str]) -> Result<csv::Reader<std::fs::File>, TrainingError> {
    if !path.exists() {
        return Err(TrainingError::MissingFile(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = read_headers(&mut reader)?;
    let missing = missing_columns(&headers, required);
    if !missing.is_empty() {
        return Err(TrainingError::MissingColumns {
            file: path.display().to_string(),
            columns: missing.into_iter().map(str::to_string).collect(),
        });
    }
    Ok(reader)
}

/// Load the climate series, dropping rows with a bad date or blanks
pub fn load_climate(path: &Path) -> Result<Vec<(NaiveDate, ClimateReading)>, TrainingError> {
    let mut reader = open_csv(path, CLIMATE_COLUMNS)?;
    let rows = reader
        .deserialize::<RawClimateRow>()
        .filter_map(Result::ok)
        .filter_map(|row| {
            let date = parse_record_date(&row.date)?;
            Some((
                date,
                ClimateReading::new(row.rainfall?, row.temperature?, row.humidity?),
            ))
        })
        .collect();
    Ok(rows)
}

/// Load case counts as `(date, barangay, cases)`
pub fn load_cases(path: &Path) -> Result<Vec<(NaiveDate, String, f64)>, TrainingError> {
    let mut reader = open_csv(path, CASE_COLUMNS)?;
    let rows = reader
        .deserialize::<RawCaseRow>()
        .filter_map(Result::ok)
        .filter_map(|row| {
            let date = parse_record_date(&row.date)?;
            let barangay = row.barangay.filter(|b| !b.is_empty())?;
            Some((date, barangay, row.cases?))
        })
        .collect();
    Ok(rows)
}

/// Inner join on date: one record per climate row and case row sharing a
/// date, in climate order
pub fn merge(
    climate: &[(NaiveDate, ClimateReading)],
    cases: &[(NaiveDate, String, f64)],
) -> Vec<TrainingRecord> {
    let mut by_date: HashMap<NaiveDate, Vec<(&str, f64)>> = HashMap::new();
    for (date, barangay, count) in cases {
        by_date
            .entry(*date)
            .or_default()
            .push((barangay.as_str(), *count));
    }

    climate
        .iter()
        .flat_map(|(date, reading)| {
            by_date
                .get(date)
                .into_iter()
                .flatten()
                .map(move |(barangay, count)| TrainingRecord {
                    date: *date,
                    barangay: barangay.to_string(),
                    climate: *reading,
                    cases: *count,
                })
        })
        .collect()
}

/// Per-barangay record counts, mean cases and outbreak share, by name
pub fn barangay_stats(records: &[TrainingRecord]) -> Vec<BarangayStats> {
    let mut groups: BTreeMap<&str, Vec<&TrainingRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(&record.barangay).or_default().push(record);
    }
    groups
        .into_iter()
        .map(|(barangay, rows)| {
            let n = rows.len() as f64;
            BarangayStats {
                barangay: barangay.to_string(),
                records: rows.len(),
                mean_cases: round_to(rows.iter().map(|r| r.cases).sum::<f64>() / n, 2),
                outbreak_share: round_to(
                    rows.iter().filter(|r| r.is_outbreak()).count() as f64 / n,
                    4,
                ),
            }
        })
        .collect()
}

/// Stratified train/test split.
///
/// Each class contributes about `test_fraction` of its rows to the test
/// set, at least one and never all of them. Returns `(train, test)` row
/// indices.
pub fn stratified_split(
    labels: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), TrainingError> {
    let negatives: Vec<usize> = (0..labels.len()).filter(|i| labels[*i] == 0).collect();
    let positives: Vec<usize> = (0..labels.len()).filter(|i| labels[*i] == 1).collect();
    if negatives.len() < 2 || positives.len() < 2 {
        return Err(TrainingError::SingleClass {
            negatives: negatives.len(),
            positives: positives.len(),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for mut class in [negatives, positives] {
        class.shuffle(&mut rng);
        let n_test = ((class.len() as f64 * test_fraction).round() as usize).clamp(1, class.len() - 1);
        test.extend_from_slice(&class[..n_test]);
        train.extend_from_slice(&class[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Score hard predictions against the truth. Undefined ratios are 0.
pub fn evaluate(truth: &[u8], predicted: &[u8]) -> (f64, f64, f64, f64, ConfusionMatrix) {
    let mut cm = ConfusionMatrix::default();
    for (t, p) in truth.iter().zip(predicted) {
        match (t, p) {
            (0, 0) => cm.tn += 1,
            (0, _) => cm.fp += 1,
            (_, 0) => cm.fn_ += 1,
            _ => cm.tp += 1,
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let accuracy = ratio(cm.tn + cm.tp, truth.len());
    let precision = ratio(cm.tp, cm.tp + cm.fp);
    let recall = ratio(cm.tp, cm.tp + cm.fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    (accuracy, precision, recall, f1, cm)
}

/// Fit the encoder and forest on joined records and evaluate the result
pub fn train(records: &[TrainingRecord], params: ForestParams) -> Result<TrainedModel, TrainingError> {
    if records.is_empty() {
        return Err(TrainingError::NoData);
    }

    let encoder = LabelEncoder::fit(records.iter().map(|r| r.barangay.clone()));
    let features: Vec<[f64; FEATURE_COUNT]> = records
        .iter()
        .map(|r| {
            // Every barangay in `records` was seen by the encoder
            let code = encoder.transform(&r.barangay).unwrap_or_default();
            FeatureVector::new(r.climate.rainfall, r.climate.temperature, r.climate.humidity, code)
                .as_array()
        })
        .collect();
    let labels: Vec<u8> = records.iter().map(|r| u8::from(r.is_outbreak())).collect();

    let (train_idx, test_idx) = stratified_split(&labels, TEST_FRACTION, params.seed)?;
    let x_train: Vec<_> = train_idx.iter().map(|i| features[*i]).collect();
    let y_train: Vec<_> = train_idx.iter().map(|i| labels[*i]).collect();

    tracing::info!(
        "Training on {} rows, evaluating on {} ({} trees)",
        train_idx.len(),
        test_idx.len(),
        params.n_estimators
    );
    let forest = RandomForest::fit(&x_train, &y_train, params)?;

    let y_test: Vec<u8> = test_idx.iter().map(|i| labels[*i]).collect();
    let y_pred: Vec<u8> = test_idx
        .iter()
        .map(|i| {
            let [rainfall, temperature, humidity, code] = features[*i];
            forest.predict(&FeatureVector::new(rainfall, temperature, humidity, code as u32))
        })
        .collect();
    let (accuracy, precision, recall, f1_score, confusion_matrix) = evaluate(&y_test, &y_pred);

    let mut feature_importance: Vec<FeatureImportance> = FEATURE_NAMES
        .iter()
        .zip(forest.feature_importances())
        .map(|(name, importance)| FeatureImportance {
            feature: name.to_string(),
            importance: round_to(*importance, 4),
        })
        .collect();
    feature_importance.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    let report = TrainingReport {
        samples: records.len(),
        train_samples: train_idx.len(),
        test_samples: test_idx.len(),
        outbreak_samples: labels.iter().filter(|l| **l == 1).count(),
        barangays: encoder.classes().to_vec(),
        barangay_stats: barangay_stats(records),
        metrics: TrainingMetrics {
            accuracy: round_to(accuracy, 4),
            precision: round_to(precision, 4),
            recall: round_to(recall, 4),
            f1_score: round_to(f1_score, 4),
            confusion_matrix,
            feature_importance,
        },
    };

    Ok(TrainedModel {
        forest,
        encoder,
        report,
    })
}

/// Load, train, evaluate and save. Blocking; run off the async runtime.
pub fn run(job: &TrainingJob) -> Result<TrainingReport, TrainingError> {
    let climate = load_climate(&job.climate_csv)?;
    let cases = load_cases(&job.cases_csv)?;
    let records = merge(&climate, &cases);
    tracing::info!(
        "Joined {} climate rows with {} case rows into {} records",
        climate.len(),
        cases.len(),
        records.len()
    );

    let trained = train(&records, job.params.clone())?;
    for stats in &trained.report.barangay_stats {
        tracing::info!(
            "{}: {} records, avg cases {:.2}, outbreak share {:.1}%",
            stats.barangay,
            stats.records,
            stats.mean_cases,
            stats.outbreak_share * 100.0
        );
    }

    trained.forest.save(&job.model_path)?;
    trained.encoder.save(&job.encoder_path)?;
    tracing::info!(
        "Saved model to {} and encoder to {}",
        job.model_path.display(),
        job.encoder_path.display()
    );

    Ok(trained.report)
}
