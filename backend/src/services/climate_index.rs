//! Historical climate index
//!
//! Averages of the historical climate series per ISO week and per calendar
//! month. Out-of-range rows are discarded before averaging.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Datelike;
use serde::Serialize;
use shared::{parse_record_date, round_to, ClimateReading, RawClimateRow};

/// Plausible rainfall range in millimetres
const RAINFALL_RANGE: (f64, f64) = (0.0, 500.0);
/// Plausible temperature range in degrees Celsius
const TEMPERATURE_RANGE: (f64, f64) = (20.0, 35.0);
/// Plausible relative humidity range in percent
const HUMIDITY_RANGE: (f64, f64) = (40.0, 100.0);

/// Mean climate per ISO week (1-53) and per month (1-12)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalClimateIndex {
    pub weekly: BTreeMap<u32, ClimateReading>,
    pub monthly: BTreeMap<u32, ClimateReading>,
}

impl HistoricalClimateIndex {
    pub fn week(&self, iso_week: u32) -> Option<&ClimateReading> {
        self.weekly.get(&iso_week)
    }

    pub fn month(&self, month: u32) -> Option<&ClimateReading> {
        self.monthly.get(&month)
    }
}

#[derive(Default)]
struct Accumulator {
    rainfall: f64,
    temperature: f64,
    humidity: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, reading: &ClimateReading) {
        self.rainfall += reading.rainfall;
        self.temperature += reading.temperature;
        self.humidity += reading.humidity;
        self.count += 1;
    }

    fn mean(&self) -> ClimateReading {
        let n = self.count as f64;
        ClimateReading::new(
            round_to(self.rainfall / n, 2),
            round_to(self.temperature / n, 2),
            round_to(self.humidity / n, 2),
        )
    }
}

fn in_range(value: f64, (lo, hi): (f64, f64)) -> bool {
    value >= lo && value <= hi
}

fn is_plausible(reading: &ClimateReading) -> bool {
    in_range(reading.rainfall, RAINFALL_RANGE)
        && in_range(reading.temperature, TEMPERATURE_RANGE)
        && in_range(reading.humidity, HUMIDITY_RANGE)
}

/// Build the index from raw rows.
///
/// Rows with an unparseable date, a missing value or an implausible value
/// are dropped. Returns `None` when no row survives.
pub fn build_index<'a, I>(rows: I) -> Option<HistoricalClimateIndex>
where
    I: IntoIterator<Item = &'a RawClimateRow>,
{
    let mut weekly: BTreeMap<u32, Accumulator> = BTreeMap::new();
    let mut monthly: BTreeMap<u32, Accumulator> = BTreeMap::new();

    for row in rows {
        let Some(date) = parse_record_date(&row.date) else {
            continue;
        };
        let (Some(rainfall), Some(temperature), Some(humidity)) =
            (row.rainfall, row.temperature, row.humidity)
        else {
            continue;
        };
        let reading = ClimateReading::new(rainfall, temperature, humidity);
        if !is_plausible(&reading) {
            continue;
        }

        weekly.entry(date.iso_week().week()).or_default().add(&reading);
        monthly.entry(date.month()).or_default().add(&reading);
    }

    if weekly.is_empty() {
        return None;
    }

    Some(HistoricalClimateIndex {
        weekly: weekly.iter().map(|(k, acc)| (*k, acc.mean())).collect(),
        monthly: monthly.iter().map(|(k, acc)| (*k, acc.mean())).collect(),
    })
}

/// Load the index from a climate CSV file.
///
/// A missing or unreadable file yields `None`; malformed records are
/// skipped.
pub fn load_index(path: &Path) -> Option<HistoricalClimateIndex> {
    if !path.exists() {
        tracing::warn!(
            "Climate data {} not found, historical averages disabled",
            path.display()
        );
        return None;
    }

    let mut reader = match csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            tracing::warn!("Could not read climate data {}: {}", path.display(), e);
            return None;
        }
    };

    let rows: Vec<RawClimateRow> = reader
        .deserialize()
        .filter_map(|record| match record {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::debug!("Skipping climate record: {}", e);
                None
            }
        })
        .collect();

    let index = build_index(&rows);
    match &index {
        Some(index) => tracing::info!(
            "Loaded historical climate: {} weeks, {} months from {} rows",
            index.weekly.len(),
            index.monthly.len(),
            rows.len()
        ),
        None => tracing::warn!(
            "No usable rows in climate data {}, historical averages disabled",
            path.display()
        ),
    }
    index
}
