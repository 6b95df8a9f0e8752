//! Prediction service: turns trader records into prediction results using
//! the loaded classifier.

use super::{Classifier, FeatureSchema, ValidationError};
use crate::models::{
    BatchOutcome, BatchPrediction, BatchSummary, PredictionResult, TraderRecord,
};
use crate::observability::ServiceMetrics;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Failure of a single prediction call
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Validation passed but vector construction or classifier invocation
    /// failed downstream
    #[error("prediction failed")]
    Internal(#[source] anyhow::Error),
}

/// Failure of a batch prediction call
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("traders list is empty")]
    Empty,

    #[error("trader at index {index} failed validation")]
    Record {
        index: usize,
        source: ValidationError,
    },

    #[error("batch prediction failed at index {index}")]
    Internal {
        index: usize,
        source: anyhow::Error,
    },
}

/// Stateless prediction front-end over an immutable classifier and schema.
///
/// Constructed once at startup and shared by handle across requests; every
/// method takes `&self` and touches no mutable state, so concurrent callers
/// need no synchronization.
pub struct PredictionService {
    schema: FeatureSchema,
    classifier: Arc<dyn Classifier>,
    metrics: ServiceMetrics,
}

impl PredictionService {
    pub fn new(schema: FeatureSchema, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            schema,
            classifier,
            metrics: ServiceMetrics::new(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Predict for a single trader record
    pub fn predict_one(
        &self,
        record: &TraderRecord,
    ) -> Result<PredictionResult, PredictionError> {
        let start = Instant::now();

        let vector = self.schema.to_vector(record).map_err(|e| {
            self.metrics.inc_validation_rejections();
            e
        })?;

        let class = self
            .classifier
            .predict(&vector)
            .map_err(|e| self.internal(e))?;
        let [p_bad, p_good] = self
            .classifier
            .predict_probability(&vector)
            .map_err(|e| self.internal(e))?;

        let confidence = p_good.max(p_bad);
        self.metrics
            .observe_prediction_latency(start.elapsed().as_secs_f64());
        self.metrics.inc_predictions(class.label());
        debug!(
            prediction = class.label(),
            confidence = confidence,
            "Prediction completed"
        );

        Ok(PredictionResult {
            prediction: class.label().to_string(),
            will_remain_active: class.will_remain_active(),
            confidence,
            probability_good_trader: p_good,
            probability_bad_trader: p_bad,
            input_features: record.clone(),
        })
    }

    /// Predict for an ordered batch of records.
    ///
    /// Fails fast on the first invalid record, tagged with its index; no
    /// partial results are returned. Empty batches are rejected before any
    /// classifier invocation.
    pub fn predict_many(&self, records: &[TraderRecord]) -> Result<BatchOutcome, BatchError> {
        if records.is_empty() {
            return Err(BatchError::Empty);
        }

        let mut predictions = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let result = self.predict_one(record).map_err(|e| match e {
                PredictionError::Validation(source) => BatchError::Record { index, source },
                PredictionError::Internal(source) => BatchError::Internal { index, source },
            })?;
            predictions.push(BatchPrediction { index, result });
        }

        let total = predictions.len();
        let good_traders = predictions
            .iter()
            .filter(|p| p.result.will_remain_active)
            .count();
        let summary = BatchSummary {
            total,
            good_traders,
            bad_traders: total - good_traders,
            percentage_good: round2(good_traders as f64 / total as f64 * 100.0),
        };

        Ok(BatchOutcome {
            predictions,
            summary,
        })
    }

    fn internal(&self, source: anyhow::Error) -> PredictionError {
        self.metrics.inc_prediction_errors();
        PredictionError::Internal(source)
    }
}

/// Round to two decimal places (summary percentage semantics)
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
