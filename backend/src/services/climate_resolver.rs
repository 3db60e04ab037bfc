//! Climate estimation for future forecast weeks

use chrono::{Datelike, NaiveDate};
use shared::ClimateReading;

use super::climate_index::HistoricalClimateIndex;

/// Per-week drift applied to an estimate
#[derive(Debug, Clone, Copy)]
struct Drift {
    /// Relative rainfall change per week
    rainfall: f64,
    /// Degrees added per week
    temperature: f64,
    /// Percentage points added per week
    humidity: f64,
}

/// Base reading drifted when no history is loaded
const NO_HISTORY: Drift = Drift {
    rainfall: 0.02,
    temperature: 0.1,
    humidity: 0.5,
};

const WEEKLY_AVERAGE: Drift = Drift {
    rainfall: 0.03,
    temperature: 0.2,
    humidity: 0.3,
};

const MONTHLY_AVERAGE: Drift = Drift {
    rainfall: 0.05,
    temperature: 0.3,
    humidity: 0.5,
};

/// History loaded but silent about the target date
const BASE_FALLBACK: Drift = Drift {
    rainfall: 0.03,
    temperature: 0.2,
    humidity: 0.4,
};

impl Drift {
    fn apply(self, reading: &ClimateReading, week_offset: u32) -> ClimateReading {
        let k = f64::from(week_offset);
        ClimateReading::new(
            reading.rainfall * (1.0 + self.rainfall * k),
            reading.temperature + self.temperature * k,
            reading.humidity + self.humidity * k,
        )
    }
}

/// Estimate the climate of the week starting at `target_date`,
/// `week_offset` weeks after the forecast start.
///
/// Preference order: the historical ISO-week mean, then the month mean,
/// then the caller's base reading, then [`ClimateReading::DEFAULT`]. Never
/// fails and never rounds.
pub fn resolve(
    index: Option<&HistoricalClimateIndex>,
    target_date: NaiveDate,
    base_climate: Option<&ClimateReading>,
    week_offset: u32,
) -> ClimateReading {
    let Some(index) = index else {
        return match base_climate {
            Some(base) => NO_HISTORY.apply(base, week_offset),
            None => ClimateReading::DEFAULT,
        };
    };

    if let Some(weekly) = index.week(target_date.iso_week().week()) {
        return drift_history(WEEKLY_AVERAGE, weekly, week_offset);
    }
    if let Some(monthly) = index.month(target_date.month()) {
        return drift_history(MONTHLY_AVERAGE, monthly, week_offset);
    }

    match base_climate {
        Some(base) => BASE_FALLBACK.apply(base, week_offset),
        None => ClimateReading::DEFAULT,
    }
}

fn drift_history(drift: Drift, average: &ClimateReading, week_offset: u32) -> ClimateReading {
    if week_offset > 0 {
        drift.apply(average, week_offset)
    } else {
        *average
    }
}
