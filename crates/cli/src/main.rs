//! Trader Classification CLI
//!
//! Runs the classifier locally against trader records without a server,
//! and smoke-checks a running API instance.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, predict, schema};

/// Trader Classification CLI
#[derive(Parser)]
#[command(name = "trader")]
#[command(author, version, about = "CLI for the Trader Classification service", long_about = None)]
pub struct Cli {
    /// Path to the ONNX classifier artifact
    #[arg(
        long,
        env = "TRADER_MODEL_PATH",
        default_value = "models/trader_classifier.onnx"
    )]
    pub model: String,

    /// Path to the feature names artifact
    #[arg(
        long,
        env = "TRADER_FEATURES_PATH",
        default_value = "models/feature_names.json"
    )]
    pub features: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict for a single trader record
    Predict {
        /// Path to a JSON file containing one trader record
        #[arg(long, short, conflicts_with = "json")]
        file: Option<String>,

        /// Inline JSON trader record
        #[arg(long)]
        json: Option<String>,
    },

    /// Predict for a batch of trader records
    Batch {
        /// Path to a JSON file: {"traders": [...]} or a bare array
        #[arg(long, short)]
        file: String,
    },

    /// Show the required feature schema
    Schema,

    /// Smoke-check a running API server
    Check {
        /// API endpoint URL
        #[arg(long, env = "TRADER_API_URL", default_value = "http://localhost:8080")]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        model,
        features,
        format,
        command,
    } = Cli::parse();

    match command {
        Commands::Predict { file, json } => {
            predict::predict_one(&model, &features, file, json, format)
        }
        Commands::Batch { file } => predict::predict_batch(&model, &features, &file, format),
        Commands::Schema => schema::show_schema(&features, format),
        Commands::Check { api_url } => check::run_checks(&api_url, format).await,
    }
}
