//! Feature contract for the classifier
//!
//! Defines the ordered feature set the model was trained on and the
//! validation rules applied to every candidate record before it may reach
//! the model.

use crate::models::TraderRecord;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Validation failure for a single record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required features: {}", missing.join(", "))]
    MissingFeatures { missing: Vec<String> },

    #[error("feature \"{feature}\" must be a number, got {received_type}")]
    InvalidType {
        feature: String,
        received_type: &'static str,
    },

    #[error("feature \"{feature}\" cannot be negative, got {received_value}")]
    NegativeValue {
        feature: String,
        received_value: f64,
    },
}

/// Tagged classification of a raw input value.
///
/// Every value is classified here before any domain validation runs;
/// booleans, strings, null, arrays, and objects are all `Other`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    Integer(f64),
    Float(f64),
    Other(&'static str),
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(v) if n.is_i64() || n.is_u64() => ValueKind::Integer(v),
                Some(v) => ValueKind::Float(v),
                None => ValueKind::Other("number"),
            },
            Value::Bool(_) => ValueKind::Other("boolean"),
            Value::String(_) => ValueKind::Other("string"),
            Value::Null => ValueKind::Other("null"),
            Value::Array(_) => ValueKind::Other("array"),
            Value::Object(_) => ValueKind::Other("object"),
        }
    }

    fn numeric(self) -> Option<f64> {
        match self {
            ValueKind::Integer(v) | ValueKind::Float(v) => Some(v),
            ValueKind::Other(_) => None,
        }
    }
}

/// Ordered list of feature names the classifier requires.
///
/// The order defines the column order fed to the model and must match the
/// layout used at training time. Loaded once at startup, read-only for the
/// process lifetime.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load feature names from a JSON array artifact
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feature names from {}", path.display()))?;
        let names: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid feature names artifact at {}", path.display()))?;
        Ok(Self::new(names))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Validate a record against the contract.
    ///
    /// The missing-features check runs first and fails the whole record.
    /// Per-field checks then run in schema order, type before sign; the
    /// first failing field short-circuits the rest of the record.
    pub fn validate(&self, record: &TraderRecord) -> Result<(), ValidationError> {
        let missing: Vec<String> = self
            .names
            .iter()
            .filter(|name| !record.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFeatures { missing });
        }

        for name in &self.names {
            let Some(value) = record.get(name.as_str()) else {
                continue;
            };
            match ValueKind::of(value) {
                ValueKind::Other(kind) => {
                    return Err(ValidationError::InvalidType {
                        feature: name.clone(),
                        received_type: kind,
                    });
                }
                ValueKind::Integer(v) | ValueKind::Float(v) => {
                    if v < 0.0 {
                        return Err(ValidationError::NegativeValue {
                            feature: name.clone(),
                            received_value: v,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Convert a record into a model-ready vector in schema order.
    ///
    /// This is the only sanctioned path from a record to classifier input;
    /// it validates first, so the returned vector always has schema length.
    pub fn to_vector(&self, record: &TraderRecord) -> Result<Vec<f64>, ValidationError> {
        self.validate(record)?;
        Ok(self
            .names
            .iter()
            .filter_map(|name| record.get(name.as_str()))
            .filter_map(|value| ValueKind::of(value).numeric())
            .collect())
    }

    /// Human descriptions keyed by feature name
    pub fn descriptions(&self) -> serde_json::Map<String, Value> {
        self.names
            .iter()
            .map(|name| (name.clone(), Value::String(describe(name).to_string())))
            .collect()
    }

    /// One example record covering every schema feature
    pub fn example_record(&self) -> TraderRecord {
        self.names
            .iter()
            .map(|name| (name.clone(), example_value(name)))
            .collect()
    }
}

/// Human description for a feature name
pub fn describe(name: &str) -> &'static str {
    match name {
        "tx_count_365d" => "Total number of transactions in the past 365 days",
        "total_volume" => "Total transaction volume in USD",
        "active_weeks" => "Number of weeks the user was active",
        "avg_tx_value" => "Average value per transaction in USD",
        "tx_per_active_week" => "Average transactions per active week",
        _ => "Numeric trader activity feature",
    }
}

fn example_value(name: &str) -> Value {
    match name {
        "tx_count_365d" => Value::from(150),
        "total_volume" => Value::from(25.5),
        "active_weeks" => Value::from(20),
        "avg_tx_value" => Value::from(0.17),
        "tx_per_active_week" => Value::from(7.5),
        _ => Value::from(1.0),
    }
}
