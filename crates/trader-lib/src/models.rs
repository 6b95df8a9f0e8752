//! Core data models for the trader classification service

use serde::{Deserialize, Serialize};

/// Caller-supplied mapping of feature name to value, describing one trader.
///
/// Extra keys beyond the feature schema are tolerated and echoed back in the
/// response, never filtered. Constructed per request, discarded afterwards.
pub type TraderRecord = serde_json::Map<String, serde_json::Value>;

/// Binary outcome of the classifier.
///
/// Class index 1 is Good and 0 is Bad, matching the column order the model
/// was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraderClass {
    Good,
    Bad,
}

impl TraderClass {
    pub fn from_index(index: usize) -> Self {
        if index == 1 {
            TraderClass::Good
        } else {
            TraderClass::Bad
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TraderClass::Good => "Good Trader",
            TraderClass::Bad => "Bad Trader",
        }
    }

    pub fn will_remain_active(&self) -> bool {
        matches!(self, TraderClass::Good)
    }
}

/// Prediction output for a single trader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: String,
    pub will_remain_active: bool,
    pub confidence: f64,
    pub probability_good_trader: f64,
    pub probability_bad_trader: f64,
    pub input_features: TraderRecord,
}

/// One entry of a batch response, tagged with the record's input position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPrediction {
    pub index: usize,
    #[serde(flatten)]
    pub result: PredictionResult,
}

/// Aggregate statistics over a batch of predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub good_traders: usize,
    pub bad_traders: usize,
    pub percentage_good: f64,
}

/// Full batch response: indexed predictions plus summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub predictions: Vec<BatchPrediction>,
    pub summary: BatchSummary,
}
