//! Integration tests for the API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use trader_api::api::{create_router, AppState};
use trader_lib::{Classifier, FeatureSchema, PredictionService, StructuredLogger, TraderClass};

/// Deterministic classifier stand-in: a trader with at least 100
/// transactions in the last year is predicted active.
struct StubClassifier;

impl Classifier for StubClassifier {
    fn predict(&self, features: &[f64]) -> anyhow::Result<TraderClass> {
        Ok(if features[0] >= 100.0 {
            TraderClass::Good
        } else {
            TraderClass::Bad
        })
    }

    fn predict_probability(&self, features: &[f64]) -> anyhow::Result<[f64; 2]> {
        Ok(if features[0] >= 100.0 {
            [0.1, 0.9]
        } else {
            [0.85, 0.15]
        })
    }
}

/// Classifier that always fails, for exercising the 500 path
struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict(&self, _features: &[f64]) -> anyhow::Result<TraderClass> {
        anyhow::bail!("tensor shape mismatch")
    }

    fn predict_probability(&self, _features: &[f64]) -> anyhow::Result<[f64; 2]> {
        anyhow::bail!("tensor shape mismatch")
    }
}

fn feature_names() -> Vec<String> {
    [
        "tx_count_365d",
        "total_volume",
        "active_weeks",
        "avg_tx_value",
        "tx_per_active_week",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn setup_app_with(classifier: Arc<dyn Classifier>) -> Router {
    let schema = FeatureSchema::new(feature_names());
    let service = Arc::new(PredictionService::new(schema, classifier));
    let state = Arc::new(AppState::new(
        service,
        StructuredLogger::new("trader-api-test"),
    ));
    create_router(state)
}

fn setup_app() -> Router {
    setup_app_with(Arc::new(StubClassifier))
}

fn good_trader() -> Value {
    json!({
        "tx_count_365d": 500,
        "total_volume": 100.0,
        "active_weeks": 45,
        "avg_tx_value": 0.2,
        "tx_per_active_week": 11.1
    })
}

fn bad_trader() -> Value {
    json!({
        "tx_count_365d": 10,
        "total_volume": 0.5,
        "active_weeks": 2,
        "avg_tx_value": 0.05,
        "tx_per_active_week": 5.0
    })
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_info_lists_endpoints() {
    let (status, body) = get_json(setup_app(), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "Trader Classification API");
    assert!(body["endpoints"]["/predict"].is_string());
    assert!(body["endpoints"]["/predict_batch"].is_string());
    assert_eq!(body["model_performance"]["accuracy"], "91.4%");
}

#[tokio::test]
async fn test_health_reports_loaded_artifacts() {
    let (status, body) = get_json(setup_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["features_loaded"], true);
}

#[tokio::test]
async fn test_features_reports_schema_with_example() {
    let (status, body) = get_json(setup_app(), "/features").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["required_features"],
        json!(feature_names())
    );
    assert!(body["descriptions"]["tx_count_365d"].is_string());

    let example = body["example"].as_object().unwrap();
    assert_eq!(example.len(), 5);
    assert_eq!(example["tx_count_365d"], 150);
}

#[tokio::test]
async fn test_predict_good_trader() {
    let (status, body) = post_json(setup_app(), "/predict", good_trader()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Good Trader");
    assert_eq!(body["will_remain_active"], true);
    assert_eq!(body["confidence"], 0.9);
    assert_eq!(body["probability_good_trader"], 0.9);
    assert_eq!(body["probability_bad_trader"], 0.1);
    assert_eq!(body["input_features"], good_trader());
}

#[tokio::test]
async fn test_predict_bad_trader() {
    let (status, body) = post_json(setup_app(), "/predict", bad_trader()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Bad Trader");
    assert_eq!(body["will_remain_active"], false);
    assert_eq!(body["confidence"], 0.85);
}

#[tokio::test]
async fn test_predict_echoes_extra_keys() {
    let mut payload = good_trader();
    payload["wallet"] = json!("0xABC123");

    let (status, body) = post_json(setup_app(), "/predict", payload.clone()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["input_features"], payload);
}

#[tokio::test]
async fn test_predict_missing_features_returns_400() {
    let payload = json!({"tx_count_365d": 100, "total_volume": 10.0});

    let (status, body) = post_json(setup_app(), "/predict", payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required features");
    assert_eq!(
        body["missing"],
        json!(["active_weeks", "avg_tx_value", "tx_per_active_week"])
    );
    assert_eq!(body["required_features"], json!(feature_names()));
}

#[tokio::test]
async fn test_predict_non_numeric_feature_returns_400() {
    let mut payload = good_trader();
    payload["active_weeks"] = json!("45");

    let (status, body) = post_json(setup_app(), "/predict", payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Feature \"active_weeks\" must be a number");
    assert_eq!(body["received_type"], "string");
}

#[tokio::test]
async fn test_predict_negative_feature_returns_400() {
    let mut payload = good_trader();
    payload["tx_count_365d"] = json!(-10);

    let (status, body) = post_json(setup_app(), "/predict", payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Feature \"tx_count_365d\" cannot be negative");
    assert_eq!(body["received_value"], -10.0);
}

#[tokio::test]
async fn test_predict_non_object_body_returns_400() {
    let (status, body) = post_json(setup_app(), "/predict", json!([1, 2, 3])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No data provided");
}

#[tokio::test]
async fn test_predict_internal_failure_returns_500() {
    let app = setup_app_with(Arc::new(FailingClassifier));
    let (status, body) = post_json(app, "/predict", good_trader()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Prediction failed");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_predict_batch_with_summary() {
    let payload = json!({
        "traders": [good_trader(), bad_trader(), {
            "tx_count_365d": 50,
            "total_volume": 5.0,
            "active_weeks": 10,
            "avg_tx_value": 0.1,
            "tx_per_active_week": 5.0
        }]
    });

    let (status, body) = post_json(setup_app(), "/predict_batch", payload).await;

    assert_eq!(status, StatusCode::OK);

    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 3);
    assert_eq!(predictions[0]["index"], 0);
    assert_eq!(predictions[0]["prediction"], "Good Trader");
    assert_eq!(predictions[1]["index"], 1);
    assert_eq!(predictions[1]["prediction"], "Bad Trader");

    assert_eq!(body["summary"]["total"], 3);
    assert_eq!(body["summary"]["good_traders"], 1);
    assert_eq!(body["summary"]["bad_traders"], 2);
    assert_eq!(body["summary"]["percentage_good"], 33.33);
}

#[tokio::test]
async fn test_predict_batch_missing_key_returns_400() {
    let (status, body) = post_json(setup_app(), "/predict_batch", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No traders data provided");
}

#[tokio::test]
async fn test_predict_batch_non_list_returns_400() {
    let payload = json!({"traders": "not a list"});

    let (status, body) = post_json(setup_app(), "/predict_batch", payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "traders must be a list");
}

#[tokio::test]
async fn test_predict_batch_empty_list_returns_400() {
    let payload = json!({"traders": []});

    let (status, body) = post_json(setup_app(), "/predict_batch", payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "traders list is empty");
}

#[tokio::test]
async fn test_predict_batch_invalid_record_tagged_with_index() {
    let payload = json!({
        "traders": [good_trader(), {"tx_count_365d": 100}]
    });

    let (status, body) = post_json(setup_app(), "/predict_batch", payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Trader at index 1 is missing required features"
    );
    assert_eq!(body["index"], 1);
    assert_eq!(
        body["missing"],
        json!(["total_volume", "active_weeks", "avg_tx_value", "tx_per_active_week"])
    );
}

#[tokio::test]
async fn test_predict_batch_negative_record_tagged_with_index() {
    let mut second = bad_trader();
    second["total_volume"] = json!(-1.5);
    let payload = json!({"traders": [good_trader(), second]});

    let (status, body) = post_json(setup_app(), "/predict_batch", payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Feature \"total_volume\" cannot be negative");
    assert_eq!(body["received_value"], -1.5);
    assert_eq!(body["index"], 1);
}

#[tokio::test]
async fn test_predict_batch_non_object_entry_returns_400() {
    let payload = json!({"traders": [good_trader(), 42]});

    let (status, body) = post_json(setup_app(), "/predict_batch", payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Trader at index 1 must be a JSON object");
}

#[tokio::test]
async fn test_predict_batch_internal_failure_returns_500() {
    let app = setup_app_with(Arc::new(FailingClassifier));
    let payload = json!({"traders": [good_trader()]});

    let (status, body) = post_json(app, "/predict_batch", payload).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Batch prediction failed");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let app = setup_app();

    // Serve one prediction so the latency histogram has an observation
    let (status, _) = post_json(app.clone(), "/predict", good_trader()).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("trader_service_prediction_latency_seconds"));
    assert!(metrics_text.contains("trader_service_predictions_total"));
}
