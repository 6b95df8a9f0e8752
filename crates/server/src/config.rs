//! Server configuration

use anyhow::Result;
use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port for the HTTP API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Path to the ONNX classifier artifact
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Path to the feature names artifact
    #[serde(default = "default_features_path")]
    pub features_path: String,
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_path() -> String {
    "models/trader_classifier.onnx".to_string()
}

fn default_features_path() -> String {
    "models/feature_names.json".to_string()
}

impl ServerConfig {
    /// Load configuration from TRADER_-prefixed environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("TRADER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ServerConfig {
            api_port: default_api_port(),
            model_path: default_model_path(),
            features_path: default_features_path(),
        }))
    }
}
