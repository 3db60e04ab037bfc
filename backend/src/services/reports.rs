//! Community dengue case reports, kept as a JSON-lines log

use std::path::PathBuf;

use chrono::Local;
use shared::{CaseReport, StoredCaseReport};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;

/// Case report service
pub struct CaseReportService {
    reports_file: PathBuf,
    write_lock: Mutex<()>,
}

impl CaseReportService {
    pub fn new(reports_file: impl Into<PathBuf>) -> Self {
        Self {
            reports_file: reports_file.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Validate, stamp and append a report
    pub async fn submit(&self, report: CaseReport) -> AppResult<StoredCaseReport> {
        report.validate()?;

        let stored = StoredCaseReport::from_report(report, Uuid::new_v4(), Local::now().to_rfc3339());
        let mut line = serde_json::to_string(&stored).map_err(anyhow::Error::from)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.reports_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.reports_file)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::info!("Case report recorded for {}", stored.barangay);
        Ok(stored)
    }

    /// Every readable report, newest first
    pub async fn list(&self) -> AppResult<Vec<StoredCaseReport>> {
        let contents = match tokio::fs::read_to_string(&self.reports_file).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reports: Vec<StoredCaseReport> = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str(line) {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::debug!("Skipping malformed report on line {}: {}", n + 1, e);
                    None
                }
            })
            .collect();

        reports.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
        Ok(reports)
    }
}
