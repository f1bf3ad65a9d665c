use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type tag selecting which validator a field runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Url,
    Slug,
    Json,
    File,
    Image,
    Date,
    #[serde(alias = "dateTime", alias = "date-time")]
    DateTime,
    Status,
}

impl FieldKind {
    pub fn is_upload(self) -> bool {
        matches!(self, FieldKind::File | FieldKind::Image)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Url => "url",
            FieldKind::Slug => "slug",
            FieldKind::Json => "json",
            FieldKind::File => "file",
            FieldKind::Image => "image",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::Status => "status",
        };
        f.write_str(tag)
    }
}

/// The four buckets a status value resolves into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Loading,
    Failed,
    Success,
    Default,
}

impl StatusCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCategory::Loading => "loading",
            StatusCategory::Failed => "failed",
            StatusCategory::Success => "success",
            StatusCategory::Default => "default",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "loading" => Some(StatusCategory::Loading),
            "failed" | "error" | "danger" => Some(StatusCategory::Failed),
            "success" => Some(StatusCategory::Success),
            "default" => Some(StatusCategory::Default),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusOverride {
    pub label: Option<String>,
    pub classes: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusOverrides {
    pub loading: Option<StatusOverride>,
    pub failed: Option<StatusOverride>,
    pub success: Option<StatusOverride>,
    pub default: Option<StatusOverride>,
}

impl StatusOverrides {
    pub fn get(&self, category: StatusCategory) -> Option<&StatusOverride> {
        match category {
            StatusCategory::Loading => self.loading.as_ref(),
            StatusCategory::Failed => self.failed.as_ref(),
            StatusCategory::Success => self.success.as_ref(),
            StatusCategory::Default => self.default.as_ref(),
        }
    }
}

/// Every recognised constraint key. Which ones matter depends on the field kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Constraints {
    pub required: bool,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,

    pub validate_url: bool,
    pub normalize_protocol: bool,

    /// Attribute of the field a slug is generated from.
    pub source: Option<String>,

    pub accepted_types: Vec<String>,
    /// Upper bound in kilobytes.
    pub max_size: Option<u64>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub max_files: Option<usize>,
    pub multiple: bool,

    /// Picker display format, e.g. `DD/MM/YYYY HH:mm`.
    pub format: Option<String>,
    pub min_date: Option<String>,
    pub max_date: Option<String>,

    pub loading_when: Vec<Value>,
    pub failed_when: Vec<Value>,
    pub success_when: Vec<Value>,
    pub status_display: StatusOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub name: String,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(flatten)]
    pub constraints: Constraints,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            attribute: None,
            kind,
            label: None,
            placeholder: None,
            readonly: false,
            constraints: Constraints::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Key the value is stored under in the parent form.
    pub fn attribute(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.name)
    }

    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) if !label.eq_ignore_ascii_case(&self.name) => {
                format!("{} ({})", label, self.name)
            }
            Some(label) => label.clone(),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_constraints() {
        let raw = json!({
            "name": "avatar",
            "type": "image",
            "acceptedTypes": ["image/png", "image/*"],
            "maxSize": 2048,
            "maxWidth": 800,
            "required": true
        });
        let config: FieldConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(config.kind, FieldKind::Image);
        assert_eq!(config.constraints.max_size, Some(2048));
        assert_eq!(config.constraints.max_width, Some(800));
        assert_eq!(config.constraints.accepted_types.len(), 2);
        assert!(config.constraints.required);
        assert_eq!(config.attribute(), "avatar");
    }

    #[test]
    fn datetime_tag_accepts_aliases() {
        for tag in ["datetime", "dateTime", "date-time"] {
            let config: FieldConfig =
                serde_json::from_value(json!({"name": "at", "type": tag})).unwrap();
            assert_eq!(config.kind, FieldKind::DateTime);
        }
    }

    #[test]
    fn display_label_mentions_name_when_different() {
        let mut config = FieldConfig::new("published_at", FieldKind::Date);
        assert_eq!(config.display_label(), "published_at");
        config.label = Some("Published".to_string());
        assert_eq!(config.display_label(), "Published (published_at)");
    }
}
