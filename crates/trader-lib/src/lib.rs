//! Core library for the trader classification service
//!
//! This crate provides the core functionality for:
//! - The feature contract (required features and validation rules)
//! - Classifier loading and ONNX inference
//! - Single and batch prediction
//! - Metrics and structured logging

pub mod models;
pub mod observability;
pub mod predictor;

pub use models::{
    BatchOutcome, BatchPrediction, BatchSummary, PredictionResult, TraderClass, TraderRecord,
};
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{
    BatchError, Classifier, FeatureSchema, OnnxClassifier, PredictionError, PredictionService,
    ValidationError,
};
