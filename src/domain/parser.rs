use anyhow::{Context, Result, bail};
use serde_json::Value;

use super::config::FieldConfig;

/// Parse a single field descriptor.
pub fn parse_field_config(value: &Value) -> Result<FieldConfig> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();
    serde_json::from_value(value.clone())
        .with_context(|| format!("invalid field configuration for '{name}'"))
}

/// Parse either a top-level array of descriptors or an object with a `fields` array.
pub fn parse_field_configs(value: &Value) -> Result<Vec<FieldConfig>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("fields") {
            Some(Value::Array(items)) => items,
            Some(_) => bail!("'fields' must be an array of field descriptors"),
            None => bail!("expected an array of fields or an object with a 'fields' array"),
        },
        _ => bail!("expected an array of fields or an object with a 'fields' array"),
    };

    let mut configs = Vec::with_capacity(items.len());
    for item in items {
        let config = parse_field_config(item)?;
        if configs
            .iter()
            .any(|existing: &FieldConfig| existing.attribute() == config.attribute())
        {
            bail!("duplicate field attribute '{}'", config.attribute());
        }
        configs.push(config);
    }
    Ok(configs)
}
