//! Local prediction commands
//!
//! Loads the model artifacts directly and runs the classifier without a
//! server, for scripting and ad-hoc use.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};
use trader_lib::{
    BatchOutcome, FeatureSchema, OnnxClassifier, PredictionResult, PredictionService, TraderRecord,
};

use crate::output::{color_confidence, color_prediction, format_probability, OutputFormat};

/// Row for prediction tables
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Index")]
    index: String,
    #[tabled(rename = "Prediction")]
    prediction: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "P(Good)")]
    p_good: String,
    #[tabled(rename = "P(Bad)")]
    p_bad: String,
}

impl PredictionRow {
    fn from_result(index: Option<usize>, result: &PredictionResult) -> Self {
        Self {
            index: index.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string()),
            prediction: color_prediction(&result.prediction),
            active: if result.will_remain_active {
                "yes".to_string()
            } else {
                "no".to_string()
            },
            confidence: color_confidence(result.confidence),
            p_good: format_probability(result.probability_good_trader),
            p_bad: format_probability(result.probability_bad_trader),
        }
    }
}

fn load_service(model_path: &str, features_path: &str) -> Result<PredictionService> {
    let schema = FeatureSchema::from_file(features_path)
        .context("Failed to load feature schema artifact")?;
    let classifier = OnnxClassifier::from_file(model_path, schema.len())
        .context("Failed to load classifier artifact")?;
    Ok(PredictionService::new(schema, Arc::new(classifier)))
}

fn read_record(file: Option<String>, json: Option<String>) -> Result<TraderRecord> {
    let raw = match (file, json) {
        (Some(path), _) => {
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?
        }
        (None, Some(inline)) => inline,
        (None, None) => bail!("Provide a trader record via --file or --json"),
    };

    let value: serde_json::Value =
        serde_json::from_str(&raw).context("Invalid JSON trader record")?;
    match value {
        serde_json::Value::Object(record) => Ok(record),
        _ => bail!("Trader record must be a JSON object"),
    }
}

fn read_batch(path: &str) -> Result<Vec<TraderRecord>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let value: serde_json::Value = serde_json::from_str(&raw).context("Invalid JSON batch file")?;

    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        serde_json::Value::Object(mut map) => match map.remove("traders") {
            Some(serde_json::Value::Array(entries)) => entries,
            _ => bail!("Batch file must contain a \"traders\" array"),
        },
        _ => bail!("Batch file must be a JSON array or an object with a \"traders\" array"),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            serde_json::Value::Object(record) => Ok(record),
            _ => bail!("Trader at index {} must be a JSON object", index),
        })
        .collect()
}

/// Predict for a single trader record
pub fn predict_one(
    model_path: &str,
    features_path: &str,
    file: Option<String>,
    json: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let record = read_record(file, json)?;
    let service = load_service(model_path, features_path)?;
    let result = service.predict_one(&record)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Table => {
            let table = Table::new([PredictionRow::from_result(None, &result)])
                .with(Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

/// Predict for a batch of trader records
pub fn predict_batch(
    model_path: &str,
    features_path: &str,
    file: &str,
    format: OutputFormat,
) -> Result<()> {
    let records = read_batch(file)?;
    let service = load_service(model_path, features_path)?;
    let outcome = service.predict_many(&records)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputFormat::Table => print_batch_table(&outcome),
    }

    Ok(())
}

fn print_batch_table(outcome: &BatchOutcome) {
    let rows: Vec<PredictionRow> = outcome
        .predictions
        .iter()
        .map(|p| PredictionRow::from_result(Some(p.index), &p.result))
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    let summary = &outcome.summary;
    println!(
        "\nTotal: {}  Good: {}  Bad: {}  Good %: {:.2}",
        summary.total, summary.good_traders, summary.bad_traders, summary.percentage_good
    );
}
