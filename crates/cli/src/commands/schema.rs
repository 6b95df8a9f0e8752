//! Feature schema command

use anyhow::Result;
use serde_json::json;
use tabled::{settings::Style, Table, Tabled};
use trader_lib::predictor::describe;
use trader_lib::FeatureSchema;

use crate::output::OutputFormat;

/// Row for the feature schema table
#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "Feature")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Example")]
    example: String,
}

/// Show the required feature names, descriptions, and an example record
pub fn show_schema(features_path: &str, format: OutputFormat) -> Result<()> {
    let schema = FeatureSchema::from_file(features_path)?;

    match format {
        OutputFormat::Json => {
            let payload = json!({
                "required_features": schema.names(),
                "descriptions": schema.descriptions(),
                "example": schema.example_record(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Table => {
            let example = schema.example_record();
            let rows: Vec<FeatureRow> = schema
                .names()
                .iter()
                .map(|name| FeatureRow {
                    name: name.clone(),
                    description: describe(name).to_string(),
                    example: example
                        .get(name.as_str())
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
