use axum::Json;
use chrono::{Datelike, Local};
use serde::Serialize;

use crate::services::insights::seasonal_insights;

#[derive(Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
    pub generated_at: String,
}

/// Short dengue advisories for the current season
pub async fn get_insights() -> Json<InsightsResponse> {
    let now = Local::now();
    let insights = seasonal_insights(now.month(), &mut rand::thread_rng());
    Json(InsightsResponse {
        insights,
        generated_at: now.to_rfc3339(),
    })
}
