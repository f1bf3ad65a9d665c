use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde_json::Value;

use super::DocumentFormat;
use crate::domain::{FieldConfig, parse_field_configs};

/// Parse structured data in any supported format into a `serde_json::Value`.
pub fn parse_document_str(contents: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(contents).with_context(|| "failed to parse JSON document")
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Value>(contents).with_context(|| "failed to parse YAML document")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => toml::from_str::<toml::Table>(contents)
            .with_context(|| "failed to parse TOML document")
            .and_then(|value| {
                serde_json::to_value(value).context("failed to convert TOML to JSON")
            }),
    }
}

/// Read field descriptors from a document: an array, or an object with `fields`.
pub fn load_field_configs(contents: &str, format: DocumentFormat) -> Result<Vec<FieldConfig>> {
    let document = parse_document_str(contents, format)?;
    parse_field_configs(&document)
}

pub fn read_document(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_document_str(&contents, DocumentFormat::from_path(path))
        .with_context(|| format!("in {}", path.display()))
}

pub fn read_field_configs(path: &Path) -> Result<Vec<FieldConfig>> {
    let document = read_document(path)?;
    parse_field_configs(&document).with_context(|| format!("in {}", path.display()))
}
