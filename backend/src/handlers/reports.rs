//! HTTP handlers for community case reports

use axum::{extract::State, Json};
use serde::Serialize;
use shared::{CaseReport, StoredCaseReport};

use crate::error::AppResult;
use crate::AppState;

#[derive(Serialize)]
pub struct SubmitReportResponse {
    pub message: String,
    pub report: StoredCaseReport,
}

#[derive(Serialize)]
pub struct ReportsResponse {
    pub reports: Vec<StoredCaseReport>,
}

/// Record a case report
pub async fn report_case(
    State(state): State<AppState>,
    Json(report): Json<CaseReport>,
) -> AppResult<Json<SubmitReportResponse>> {
    let report = state.reports.submit(report).await?;
    Ok(Json(SubmitReportResponse {
        message: "Case report submitted successfully".to_string(),
        report,
    }))
}

/// All recorded reports, newest first
pub async fn list_case_reports(State(state): State<AppState>) -> AppResult<Json<ReportsResponse>> {
    Ok(Json(ReportsResponse {
        reports: state.reports.list().await?,
    }))
}
