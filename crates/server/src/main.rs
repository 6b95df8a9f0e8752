//! Trader Classification API server
//!
//! Loads the pre-trained classifier and feature schema at startup and
//! serves single and batch predictions over HTTP.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trader_api::{api, config::ServerConfig};
use trader_lib::{
    FeatureSchema, OnnxClassifier, PredictionService, ServiceMetrics, StructuredLogger,
};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting trader-api");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        model_path = %config.model_path,
        features_path = %config.features_path,
        "Server configured"
    );

    // Artifact load failures are fatal: the service must not start without
    // a classifier and its feature schema.
    let schema = FeatureSchema::from_file(&config.features_path)
        .context("Failed to load feature schema artifact")?;
    let classifier = OnnxClassifier::from_file(&config.model_path, schema.len())
        .context("Failed to load classifier artifact")?;

    // Initialize metrics
    let metrics = ServiceMetrics::new();
    metrics.set_model_info("onnx", schema.len());

    // Initialize structured logger
    let logger = StructuredLogger::new("trader-api");
    logger.log_startup(SERVICE_VERSION, &config.model_path, schema.len());

    // Create shared application state
    let service = Arc::new(PredictionService::new(schema, Arc::new(classifier)));
    let app_state = Arc::new(api::AppState::new(service, logger.clone()));

    // Start the API server
    let _api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
