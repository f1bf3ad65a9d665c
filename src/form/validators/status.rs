use serde::Serialize;
use serde_json::Value;

use super::FieldValidator;
use crate::domain::{FieldConfig, FieldKind, FieldValue, StatusCategory, StatusOverrides};
use crate::form::error::ValidationResult;
use crate::options::Theme;

/// Everything a status badge needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    #[serde(rename = "type")]
    pub category: StatusCategory,
    pub label: String,
    pub classes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

struct Fallback {
    light: &'static str,
    dark: &'static str,
    icon: Option<&'static str>,
    label: &'static str,
}

fn fallback(category: StatusCategory) -> Fallback {
    match category {
        StatusCategory::Loading => Fallback {
            light: "bg-blue-100 text-blue-800",
            dark: "bg-blue-900 text-blue-300",
            icon: Some("spinner"),
            label: "Loading",
        },
        StatusCategory::Failed => Fallback {
            light: "bg-red-100 text-red-800",
            dark: "bg-red-900 text-red-300",
            icon: Some("x-circle"),
            label: "Failed",
        },
        StatusCategory::Success => Fallback {
            light: "bg-green-100 text-green-800",
            dark: "bg-green-900 text-green-300",
            icon: Some("check-circle"),
            label: "Success",
        },
        StatusCategory::Default => Fallback {
            light: "bg-gray-100 text-gray-800",
            dark: "bg-gray-700 text-gray-300",
            icon: None,
            label: "Unknown",
        },
    }
}

fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(num) => Some(num.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn is_member(list: &[Value], value: &Value) -> bool {
    let key = scalar_key(value);
    list.iter().any(|member| {
        member == value || (key.is_some() && scalar_key(member).as_deref() == key.as_deref())
    })
}

/// Maps raw status values to one of four categories, first match wins in the
/// order loading, failed, success.
#[derive(Debug, Clone, Default)]
pub struct StatusResolver {
    loading_when: Vec<Value>,
    failed_when: Vec<Value>,
    success_when: Vec<Value>,
    overrides: StatusOverrides,
    theme: Theme,
}

impl StatusResolver {
    pub fn new(loading_when: Vec<Value>, failed_when: Vec<Value>, success_when: Vec<Value>) -> Self {
        Self {
            loading_when,
            failed_when,
            success_when,
            ..Self::default()
        }
    }

    pub fn from_config(config: &FieldConfig, theme: Theme) -> Self {
        let constraints = &config.constraints;
        Self {
            loading_when: constraints.loading_when.clone(),
            failed_when: constraints.failed_when.clone(),
            success_when: constraints.success_when.clone(),
            overrides: constraints.status_display.clone(),
            theme,
        }
    }

    pub fn with_overrides(mut self, overrides: StatusOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn category(&self, value: &Value) -> StatusCategory {
        if is_member(&self.loading_when, value) {
            StatusCategory::Loading
        } else if is_member(&self.failed_when, value) {
            StatusCategory::Failed
        } else if is_member(&self.success_when, value) {
            StatusCategory::Success
        } else {
            StatusCategory::Default
        }
    }

    pub fn display(&self, value: &Value) -> StatusDisplay {
        if let Some(display) = self.pre_resolved(value) {
            return display;
        }
        let category = self.category(value);
        let label = scalar_key(value).filter(|text| !text.is_empty());
        self.build(category, None, label, None, None)
    }

    /// Upstream sometimes sends `{type, label, classes, icon}` ready-made.
    fn pre_resolved(&self, value: &Value) -> Option<StatusDisplay> {
        let object = value.as_object()?;
        let category = object
            .get("type")
            .and_then(Value::as_str)
            .map(|tag| StatusCategory::parse(tag).unwrap_or(StatusCategory::Default))?;
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let label = text("label").or_else(|| object.get("value").and_then(scalar_key));
        Some(self.build(category, label, None, text("classes"), text("icon")))
    }

    /// `label` comes from a pre-resolved object and beats any override;
    /// `raw_label` is the bare status text, which an override replaces.
    fn build(
        &self,
        category: StatusCategory,
        label: Option<String>,
        raw_label: Option<String>,
        classes: Option<String>,
        icon: Option<String>,
    ) -> StatusDisplay {
        let base = fallback(category);
        let custom = self.overrides.get(category);
        let pick = |explicit: Option<String>, from_override: Option<&String>| {
            explicit.or_else(|| from_override.cloned())
        };
        let classes = pick(classes, custom.and_then(|o| o.classes.as_ref())).unwrap_or_else(|| {
            if self.theme.is_dark() {
                base.dark.to_string()
            } else {
                base.light.to_string()
            }
        });
        let icon = pick(icon, custom.and_then(|o| o.icon.as_ref()))
            .or_else(|| base.icon.map(str::to_string));
        let label = pick(label, custom.and_then(|o| o.label.as_ref()))
            .or(raw_label)
            .unwrap_or_else(|| base.label.to_string());
        StatusDisplay {
            category,
            label,
            classes,
            icon,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusValidator {
    resolver: StatusResolver,
}

impl StatusValidator {
    pub fn new(config: &FieldConfig, theme: Theme) -> Self {
        Self {
            resolver: StatusResolver::from_config(config, theme),
        }
    }

    pub fn resolver(&self) -> &StatusResolver {
        &self.resolver
    }
}

impl FieldValidator for StatusValidator {
    fn kind(&self) -> FieldKind {
        FieldKind::Status
    }

    /// Status fields are display-only; every value is accepted as-is.
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        ValidationResult::valid(value.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatusOverride;
    use serde_json::json;

    fn resolver() -> StatusResolver {
        StatusResolver::new(vec![json!("a")], vec![json!("b")], vec![json!("c")])
    }

    #[test]
    fn resolves_by_membership() {
        let resolver = resolver();
        assert_eq!(resolver.category(&json!("a")), StatusCategory::Loading);
        assert_eq!(resolver.category(&json!("b")), StatusCategory::Failed);
        assert_eq!(resolver.category(&json!("c")), StatusCategory::Success);
        assert_eq!(resolver.category(&json!("x")), StatusCategory::Default);
    }

    #[test]
    fn earlier_list_wins_on_overlap() {
        let resolver = StatusResolver::new(
            vec![json!("pending")],
            vec![json!("pending"), json!("error")],
            vec![json!("error")],
        );
        assert_eq!(resolver.category(&json!("pending")), StatusCategory::Loading);
        assert_eq!(resolver.category(&json!("error")), StatusCategory::Failed);
    }

    #[test]
    fn numbers_and_strings_match_by_text() {
        let resolver = StatusResolver::new(vec![], vec![json!(0)], vec![json!("1"), json!(true)]);
        assert_eq!(resolver.category(&json!("0")), StatusCategory::Failed);
        assert_eq!(resolver.category(&json!(1)), StatusCategory::Success);
        assert_eq!(resolver.category(&json!(true)), StatusCategory::Success);
        assert_eq!(resolver.category(&Value::Null), StatusCategory::Default);
    }

    #[test]
    fn builtin_display_uses_raw_label_and_theme() {
        let display = resolver().display(&json!("c"));
        assert_eq!(display.category, StatusCategory::Success);
        assert_eq!(display.label, "c");
        assert_eq!(display.classes, "bg-green-100 text-green-800");
        assert_eq!(display.icon.as_deref(), Some("check-circle"));

        let dark = resolver().with_theme(Theme::Dark).display(&json!("c"));
        assert_eq!(dark.classes, "bg-green-900 text-green-300");
    }

    #[test]
    fn empty_value_gets_category_label() {
        let display = resolver().display(&Value::Null);
        assert_eq!(display.label, "Unknown");
        assert_eq!(display.icon, None);
    }

    #[test]
    fn overrides_replace_fallbacks() {
        let overrides = StatusOverrides {
            failed: Some(StatusOverride {
                label: Some("Broken".into()),
                classes: Some("badge-danger".into()),
                icon: None,
            }),
            ..Default::default()
        };
        let display = resolver().with_overrides(overrides).display(&json!("b"));
        assert_eq!(display.label, "Broken");
        assert_eq!(display.classes, "badge-danger");
        assert_eq!(display.icon.as_deref(), Some("x-circle"));
    }

    #[test]
    fn pre_resolved_label_beats_override() {
        let overrides = StatusOverrides {
            failed: Some(StatusOverride {
                label: Some("Broken".into()),
                classes: Some("badge-danger".into()),
                icon: None,
            }),
            ..Default::default()
        };
        let resolver = resolver().with_overrides(overrides);
        let display = resolver.display(&json!({"type": "failed", "label": "Payment declined"}));
        assert_eq!(display.label, "Payment declined");
        assert_eq!(display.classes, "badge-danger");

        let bare = resolver.display(&json!({"type": "failed"}));
        assert_eq!(bare.label, "Broken");
    }

    #[test]
    fn pre_resolved_objects_are_used_directly() {
        let value = json!({"type": "success", "label": "Shipped", "classes": "custom"});
        let display = resolver().display(&value);
        assert_eq!(display.category, StatusCategory::Success);
        assert_eq!(display.label, "Shipped");
        assert_eq!(display.classes, "custom");

        let unknown = resolver().display(&json!({"type": "mystery", "value": "b"}));
        assert_eq!(unknown.category, StatusCategory::Default);
        assert_eq!(unknown.label, "b");
    }

    #[test]
    fn serializes_with_type_key() {
        let display = resolver().display(&json!("a"));
        let value = serde_json::to_value(&display).unwrap();
        assert_eq!(value["type"], json!("loading"));
        assert_eq!(value["icon"], json!("spinner"));
    }
}
