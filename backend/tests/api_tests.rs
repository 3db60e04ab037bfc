//! HTTP API tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use dengue_forecast_backend::classifier::OutbreakClassifier;
use dengue_forecast_backend::services::features::{BarangayEncoding, FeatureVector};
use dengue_forecast_backend::services::{ModelPaths, ModelSnapshot, ModelStore};
use dengue_forecast_backend::{create_app, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Fixed(f64);

impl OutbreakClassifier for Fixed {
    fn predict_proba(&self, _: &FeatureVector) -> [f64; 2] {
        [1.0 - self.0, self.0]
    }
    fn model_type(&self) -> &str {
        "RandomForestClassifier"
    }
    fn n_estimators(&self) -> Option<usize> {
        Some(100)
    }
    fn feature_names(&self) -> &[String] {
        &[]
    }
}

fn app(dir: &Path, classifier: Option<Arc<dyn OutbreakClassifier>>) -> Router {
    let config = Config::with_base_dir(dir);
    let store = ModelStore::with_snapshot(
        ModelPaths::from(&config),
        ModelSnapshot::new(classifier, BarangayEncoding::StaticTable, None),
    );
    create_app(AppState::with_store(config, store))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_csv(uri: &str, filename: &str, csv: &str) -> Request<Body> {
    let boundary = "moskita-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn prediction_request(date: &str) -> Value {
    json!({
        "barangay": "Santa Cruz",
        "climate": {"temperature": 28.0, "humidity": 75.0, "rainfall": 100.0},
        "date": date
    })
}

// =============================================================================
// Status endpoints
// =============================================================================

mod status {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_model_state() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path(), None), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], false);

        let (_, body) = send(app(dir.path(), Some(Arc::new(Fixed(0.1)))), get("/")).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model_loaded"], true);
    }

    #[tokio::test]
    async fn test_barangays() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path(), None), get("/barangays")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["barangays"].as_array().map(Vec::len), Some(5));
        assert_eq!(body["barangays"][0], "General Paulino Santos");
    }

    #[tokio::test]
    async fn test_model_info() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path(), None), get("/model/info")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "MODEL_UNAVAILABLE");

        let (status, body) =
            send(app(dir.path(), Some(Arc::new(Fixed(0.1)))), get("/model/info")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_type"], "RandomForestClassifier");
        assert_eq!(body["n_estimators"], 100);
        assert_eq!(body["feature_names"][3], "barangay_encoded");
    }

    #[tokio::test]
    async fn test_reload_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path(), Some(Arc::new(Fixed(0.1))));
        let (status, body) = send(router, post_json("/model/reload", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_loaded"], false);
        assert_eq!(body["climate_index_loaded"], false);
    }

    #[tokio::test]
    async fn test_retrain_without_data_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) =
            send(app(dir.path(), None), post_json("/model/retrain", json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "TRAINING_ERROR");
    }

    #[tokio::test]
    async fn test_insights() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path(), None), get("/insights")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insights"].as_array().map(Vec::len), Some(2));
        assert!(body["generated_at"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path(), None), get("/forecasts")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Route /forecasts not found");
    }
}

// =============================================================================
// Forecast endpoints
// =============================================================================

mod predict {
    use super::*;

    #[tokio::test]
    async fn test_predict() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path(), Some(Arc::new(Fixed(0.45))));
        let (status, body) = send(router, post_json("/predict", prediction_request("2025-12-01"))).await;

        assert_eq!(status, StatusCode::OK);
        let weeks = body["weekly_forecast"].as_array().unwrap();
        assert_eq!(weeks.len(), 4);
        assert_eq!(weeks[0]["week"], "December 01–07");
        assert_eq!(weeks[0]["risk"], "Moderate");
        assert_eq!(weeks[0]["outbreak_probability"], 0.45);
        assert_eq!(weeks[0]["climate_used"]["source"], "current");
        assert_eq!(weeks[1]["climate_used"]["source"], "historical_average");
        assert_eq!(body["model_info"]["features_used"][0], "rainfall");
    }

    #[tokio::test]
    async fn test_predict_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = send(
            app(dir.path(), None),
            post_json("/predict", prediction_request("2025-12-01")),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_predict_bad_date() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path(), Some(Arc::new(Fixed(0.45))));
        let (status, body) = send(router, post_json("/predict", prediction_request("2025-13-40"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "date");
        assert_eq!(body["error"]["message"], "Invalid date format. Use YYYY-MM-DD");
    }

    #[tokio::test]
    async fn test_batch() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path(), Some(Arc::new(Fixed(0.7))));
        let (status, body) = send(
            router,
            post_json(
                "/predict/batch",
                json!([prediction_request("2025-12-01"), prediction_request("bad")]),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["forecast"][0]["risk"], "High");
        assert!(results[0].get("error").is_none());
        assert!(results[1]["error"].is_string());
    }

    #[tokio::test]
    async fn test_weekly_risk_map() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path(), Some(Arc::new(Fixed(0.1))));
        let (status, body) = send(
            router,
            get("/predict/weekly/Morales?start_date=2025-03-03"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["barangay"], "Morales");
        assert_eq!(body["weekly_predictions"]["2025-03-24"], "Low");
        assert_eq!(body["weekly_predictions"].as_object().map(|m| m.len()), Some(4));
    }

    #[tokio::test]
    async fn test_weekly_risk_map_requires_start_date() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path(), Some(Arc::new(Fixed(0.1))));
        let (status, body) = send(router, get("/predict/weekly/Morales")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["field"], "start_date");
    }

    #[tokio::test]
    async fn test_self_test() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(dir.path(), Some(Arc::new(Fixed(0.8))));
        let (status, body) = send(router, post_json("/predict/test", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], 1);
        assert_eq!(body["risk_level"], "High");
        assert_eq!(body["test_features"]["rainfall"], 100.0);
        assert_eq!(body["probabilities"]["outbreak"], 0.8);
    }
}

// =============================================================================
// Uploads and case reports
// =============================================================================

mod data {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            app(dir.path(), None),
            post_csv(
                "/upload/dengue",
                "cases.csv",
                "date,barangay,cases\n2024-01-01,Morales,2\n2024-01-01,Zone II,0",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"], 2);
        assert_eq!(body["filename"], "cases.csv");

        let (_, body) = send(app(dir.path(), None), get("/uploads")).await;
        let uploads = body["uploads"].as_array().unwrap();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0]["filename"].as_str().unwrap().starts_with("dengue_"));
    }

    #[tokio::test]
    async fn test_upload_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            app(dir.path(), None),
            post_csv("/upload/climate", "climate.csv", "date,rainfall\n2024-01-01,20"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "CSV must contain columns: date, rainfall, temperature, humidity"
        );
    }

    #[tokio::test]
    async fn test_case_reports_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let report = json!({
            "barangay": "Zone II",
            "name": "Maria",
            "age": "8",
            "sex": "F",
            "address": "Purok 2",
            "dateReported": "2025-08-11",
            "timeReported": "14:20",
            "reportedBy": "Nurse",
            "fever": true,
            "bleeding": true,
            "riskRed": true,
            "symptomOnsetDate": "2025-08-09",
            "remarks": ""
        });

        let (status, body) = send(app(dir.path(), None), post_json("/report-case", report)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["symptoms"]["bleeding"], true);
        assert_eq!(body["report"]["riskClassification"]["red"], true);
        assert!(body["report"]["remarks"].is_null());

        let (status, body) = send(app(dir.path(), None), get("/case-reports")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reports"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["reports"][0]["name"], "Maria");
    }

    #[tokio::test]
    async fn test_case_report_requires_name() {
        let dir = tempfile::tempdir().unwrap();
        let report = json!({
            "barangay": "Zone II",
            "name": "",
            "age": "8",
            "sex": "F",
            "address": "Purok 2",
            "dateReported": "2025-08-11",
            "timeReported": "14:20",
            "reportedBy": "Nurse"
        });
        let (status, _) = send(app(dir.path(), None), post_json("/report-case", report)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
