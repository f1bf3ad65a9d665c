use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A file picked by the user that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCandidate {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Decoded pixel dimensions, when the file is an image and the host decoded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(Dimensions::new(width, height));
        self
    }

    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Raw value bound to a field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Json(Value),
    Files(Vec<UploadCandidate>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Json(Value::Null) => true,
            FieldValue::Files(files) => files.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Json(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Seed a field value from whatever the parent form stored.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Empty,
            Value::String(text) => FieldValue::Text(text.clone()),
            Value::Bool(flag) => FieldValue::Bool(*flag),
            Value::Number(num) => num
                .as_f64()
                .map(FieldValue::Number)
                .unwrap_or_else(|| FieldValue::Text(num.to_string())),
            other => FieldValue::Json(other.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Empty => Value::Null,
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Number(num) => number_to_json(*num),
            FieldValue::Bool(flag) => Value::Bool(*flag),
            FieldValue::Json(value) => value.clone(),
            FieldValue::Files(files) => Value::Array(files.iter().map(file_to_json).collect()),
        }
    }

    /// Human-readable rendering used for summaries and the CLI.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Empty => String::new(),
            FieldValue::Text(text) => text.clone(),
            FieldValue::Number(num) => number_to_json(*num).to_string(),
            FieldValue::Bool(flag) => flag.to_string(),
            FieldValue::Json(Value::String(text)) => text.clone(),
            FieldValue::Json(value) => value.to_string(),
            FieldValue::Files(files) => files
                .iter()
                .map(|file| file.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn number_to_json(num: f64) -> Value {
    if num.fract() == 0.0 && num.abs() < i64::MAX as f64 {
        json!(num as i64)
    } else {
        serde_json::Number::from_f64(num)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn file_to_json(file: &UploadCandidate) -> Value {
    let mut map = Map::new();
    map.insert("name".to_string(), Value::String(file.name.clone()));
    map.insert("type".to_string(), Value::String(file.mime_type.clone()));
    map.insert("size".to_string(), json!(file.size));
    if let Some(dimensions) = file.dimensions {
        map.insert("width".to_string(), json!(dimensions.width));
        map.insert("height".to_string(), json!(dimensions.height));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_from_parent_values() {
        assert_eq!(FieldValue::from_json(&Value::Null), FieldValue::Empty);
        assert_eq!(
            FieldValue::from_json(&json!("abc")),
            FieldValue::text("abc")
        );
        assert_eq!(FieldValue::from_json(&json!(3)), FieldValue::Number(3.0));
        let media = json!({"id": 7, "url": "/media/7.png"});
        assert_eq!(FieldValue::from_json(&media), FieldValue::Json(media));
    }

    #[test]
    fn whole_numbers_serialize_as_integers() {
        assert_eq!(FieldValue::Number(30.0).to_json(), json!(30));
        assert_eq!(FieldValue::Number(1.5).to_json(), json!(1.5));
    }

    #[test]
    fn files_serialize_as_descriptors() {
        let value = FieldValue::Files(vec![
            UploadCandidate::new("a.png", "image/png", 10).with_dimensions(4, 2),
        ]);
        assert_eq!(
            value.to_json(),
            json!([{"name": "a.png", "type": "image/png", "size": 10, "width": 4, "height": 2}])
        );
        assert_eq!(value.display(), "a.png");
    }

    #[test]
    fn blank_text_counts_as_empty() {
        assert!(FieldValue::text("   ").is_empty());
        assert!(!FieldValue::Bool(false).is_empty());
    }
}
