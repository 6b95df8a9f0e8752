//! Classification engine: feature contract, model inference, and the
//! prediction service

mod contract;
mod onnx;
mod service;

pub use contract::{describe, FeatureSchema, ValidationError, ValueKind};
pub use onnx::OnnxClassifier;
pub use service::{BatchError, PredictionError, PredictionService};

use crate::models::TraderClass;
use anyhow::Result;

/// Capability set of the pre-trained binary classifier.
///
/// Implementations are loaded once, shared read-only across requests, and
/// must be safe to invoke concurrently.
pub trait Classifier: Send + Sync {
    /// Predict the class for a single feature vector
    fn predict(&self, features: &[f64]) -> Result<TraderClass>;

    /// Class probabilities as [p_bad, p_good]
    fn predict_probability(&self, features: &[f64]) -> Result<[f64; 2]>;
}
