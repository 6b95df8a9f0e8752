//! HTTP API for trader classification
//!
//! Maps requests onto the prediction service: service info, health check,
//! feature schema, single and batch prediction, and Prometheus metrics.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use trader_lib::{
    BatchError, PredictionError, PredictionService, StructuredLogger, ValidationError,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>, logger: StructuredLogger) -> Self {
        Self { service, logger }
    }
}

/// Error response for the prediction endpoints.
///
/// User-input errors map to 400 with a field-bearing body; internal
/// failures map to 500 with a generic message.
enum ApiError {
    Validation {
        index: Option<usize>,
        error: ValidationError,
        required_features: Vec<String>,
    },
    Malformed(String),
    Internal {
        error: &'static str,
        message: String,
    },
}

impl ApiError {
    fn into_parts(self) -> (StatusCode, Value) {
        match self {
            ApiError::Validation {
                index,
                error,
                required_features,
            } => (
                StatusCode::BAD_REQUEST,
                validation_body(index, &error, &required_features),
            ),
            ApiError::Malformed(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Internal { error, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": error, "message": message }),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_parts();
        (status, Json(body)).into_response()
    }
}

fn validation_body(
    index: Option<usize>,
    error: &ValidationError,
    required_features: &[String],
) -> Value {
    let mut body = match error {
        ValidationError::MissingFeatures { missing } => match index {
            Some(i) => json!({
                "error": format!("Trader at index {} is missing required features", i),
                "missing": missing,
            }),
            None => json!({
                "error": "Missing required features",
                "missing": missing,
                "required_features": required_features,
            }),
        },
        ValidationError::InvalidType {
            feature,
            received_type,
        } => json!({
            "error": format!("Feature \"{}\" must be a number", feature),
            "received_type": received_type,
        }),
        ValidationError::NegativeValue {
            feature,
            received_value,
        } => json!({
            "error": format!("Feature \"{}\" cannot be negative", feature),
            "received_value": received_value,
        }),
    };

    if let (Some(i), Some(obj)) = (index, body.as_object_mut()) {
        obj.entry("index").or_insert(json!(i));
    }
    body
}

/// Service metadata and endpoint listing
async fn service_info() -> impl IntoResponse {
    Json(json!({
        "service": "Trader Classification API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Predict whether a blockchain trader will remain active",
        "endpoints": {
            "/": "GET - API information",
            "/health": "GET - Health check",
            "/features": "GET - Required feature schema",
            "/predict": "POST - Make a single prediction",
            "/predict_batch": "POST - Make batch predictions",
            "/metrics": "GET - Prometheus metrics"
        },
        "model": "Random Forest",
        "model_performance": {
            "accuracy": "91.4%",
            "roc_auc": "0.9646"
        }
    }))
}

/// Health check.
///
/// Artifact load failures are fatal at startup, so a serving process always
/// has its model; feature load is reported from the schema itself.
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let features_loaded = !state.service.schema().is_empty();
    let status_code = if features_loaded {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if features_loaded { "healthy" } else { "unhealthy" },
            "model_loaded": true,
            "features_loaded": features_loaded,
        })),
    )
}

/// Required feature names, descriptions, and an example record
async fn features(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let schema = state.service.schema();
    Json(json!({
        "required_features": schema.names(),
        "descriptions": schema.descriptions(),
        "example": schema.example_record(),
    }))
}

/// Predict for a single trader
async fn predict(State(state): State<Arc<AppState>>, Json(payload): Json<Value>) -> Response {
    let Some(record) = payload.as_object() else {
        return ApiError::Malformed("No data provided".to_string()).into_response();
    };

    match state.service.predict_one(record) {
        Ok(result) => {
            state
                .logger
                .log_prediction(&result.prediction, result.confidence);
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(PredictionError::Validation(error)) => ApiError::Validation {
            index: None,
            error,
            required_features: state.service.schema().names().to_vec(),
        }
        .into_response(),
        Err(PredictionError::Internal(source)) => {
            state
                .logger
                .log_internal_error("predict", &format!("{source:#}"));
            ApiError::Internal {
                error: "Prediction failed",
                message: source.to_string(),
            }
            .into_response()
        }
    }
}

/// Predict for a batch of traders
async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Response {
    let Some(traders_value) = payload.as_object().and_then(|body| body.get("traders")) else {
        return ApiError::Malformed("No traders data provided".to_string()).into_response();
    };
    let Some(traders) = traders_value.as_array() else {
        return ApiError::Malformed("traders must be a list".to_string()).into_response();
    };

    let mut records = Vec::with_capacity(traders.len());
    for (index, value) in traders.iter().enumerate() {
        match value.as_object() {
            Some(record) => records.push(record.clone()),
            None => {
                return ApiError::Malformed(format!(
                    "Trader at index {} must be a JSON object",
                    index
                ))
                .into_response();
            }
        }
    }

    match state.service.predict_many(&records) {
        Ok(outcome) => {
            state
                .logger
                .log_batch(outcome.summary.total, outcome.summary.good_traders);
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(BatchError::Empty) => {
            ApiError::Malformed("traders list is empty".to_string()).into_response()
        }
        Err(BatchError::Record { index, source }) => ApiError::Validation {
            index: Some(index),
            error: source,
            required_features: state.service.schema().names().to_vec(),
        }
        .into_response(),
        Err(BatchError::Internal { index, source }) => {
            state
                .logger
                .log_internal_error("predict_batch", &format!("index {index}: {source:#}"));
            ApiError::Internal {
                error: "Batch prediction failed",
                message: source.to_string(),
            }
            .into_response()
        }
    }
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/features", get(features))
        .route("/predict", post(predict))
        .route("/predict_batch", post(predict_batch))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
