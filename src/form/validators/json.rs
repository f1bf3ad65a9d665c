use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use super::{FieldValidator, required_error};
use crate::domain::{FieldConfig, FieldKind, FieldValue};
use crate::form::debounce::Debouncer;
use crate::form::error::{FieldError, ValidationResult};

/// Host clipboard. Failures are reported back but never block editing.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Re-indent valid JSON text with two spaces.
pub fn beautify(text: &str) -> Result<String, serde_json::Error> {
    let value = serde_json::from_str::<Value>(text)?;
    serde_json::to_string_pretty(&value)
}

/// Strip all insignificant whitespace from valid JSON text.
pub fn minify(text: &str) -> Result<String, serde_json::Error> {
    let value = serde_json::from_str::<Value>(text)?;
    serde_json::to_string(&value)
}

#[derive(Debug, Clone)]
pub struct JsonValidator {
    pointer: String,
    required: bool,
}

impl JsonValidator {
    pub fn new(config: &FieldConfig) -> Self {
        Self {
            pointer: format!("/{}", config.attribute()),
            required: config.constraints.required,
        }
    }

    fn empty_result(&self) -> ValidationResult {
        match required_error(&self.pointer, self.required) {
            Some(err) => ValidationResult::invalid(err, Value::Null),
            None => ValidationResult::valid(Value::Null),
        }
    }
}

impl FieldValidator for JsonValidator {
    fn kind(&self) -> FieldKind {
        FieldKind::Json
    }

    /// Parsed JSON on success; on failure the raw text is kept as the
    /// normalized value so nothing the user typed is lost.
    fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value {
            FieldValue::Empty => self.empty_result(),
            FieldValue::Text(text) if text.trim().is_empty() => self.empty_result(),
            FieldValue::Text(text) => match serde_json::from_str::<Value>(text) {
                Ok(parsed) => ValidationResult::valid(parsed),
                Err(err) => {
                    debug!(pointer = %self.pointer, error = %err, "json parse failed");
                    ValidationResult::invalid(
                        FieldError::parse(&self.pointer, err.to_string()),
                        Value::String(text.clone()),
                    )
                }
            },
            other => ValidationResult::valid(other.to_json()),
        }
    }
}

/// Text buffer of a JSON editor with debounced re-validation.
#[derive(Debug, Clone)]
pub struct JsonEditor {
    validator: JsonValidator,
    text: String,
    debouncer: Debouncer,
    result: ValidationResult,
}

impl JsonEditor {
    pub fn new(config: &FieldConfig, debounce: Duration) -> Self {
        let validator = JsonValidator::new(config);
        let result = validator.validate(&FieldValue::Empty);
        Self {
            validator,
            text: String::new(),
            debouncer: Debouncer::new(debounce),
            result,
        }
    }

    /// Load a value handed down by the parent. Structured values are shown indented.
    pub fn seed(&mut self, value: &Value) {
        self.debouncer.cancel();
        self.text = match value {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        self.result = self.validator.validate(&FieldValue::Text(self.text.clone()));
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_valid(&self) -> bool {
        self.result.is_valid
    }

    pub fn error(&self) -> Option<&FieldError> {
        self.result.error.as_ref()
    }

    pub fn result(&self) -> &ValidationResult {
        &self.result
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_armed()
    }

    /// Record a keystroke; validation waits for the debounce window.
    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.text = text.into();
        self.debouncer.arm(now);
    }

    /// Runs validation when the window has elapsed and returns the value to emit.
    pub fn poll(&mut self, now: Instant) -> Option<Value> {
        if !self.debouncer.fire_if_due(now) {
            return None;
        }
        debug!(pointer = %self.validator.pointer, "debounced json validation");
        Some(self.revalidate())
    }

    /// Validate immediately, dropping any pending timer.
    pub fn flush(&mut self) -> Value {
        self.debouncer.cancel();
        self.revalidate()
    }

    fn revalidate(&mut self) -> Value {
        self.result = self.validator.validate(&FieldValue::Text(self.text.clone()));
        self.result.normalized.clone()
    }

    pub fn beautify(&mut self) -> Result<(), FieldError> {
        self.reformat(beautify)
    }

    pub fn minify(&mut self) -> Result<(), FieldError> {
        self.reformat(minify)
    }

    fn reformat(
        &mut self,
        format: fn(&str) -> Result<String, serde_json::Error>,
    ) -> Result<(), FieldError> {
        match format(&self.text) {
            Ok(formatted) => {
                self.text = formatted;
                self.debouncer.cancel();
                self.revalidate();
                Ok(())
            }
            Err(err) => {
                let error = FieldError::parse(&self.validator.pointer, err.to_string());
                self.result = ValidationResult::invalid(
                    error.clone(),
                    Value::String(self.text.clone()),
                );
                Err(error)
            }
        }
    }

    /// Copy the current text. A clipboard failure is logged and reported, nothing more.
    pub fn copy_to(&self, clipboard: &mut dyn Clipboard) -> Result<(), FieldError> {
        clipboard.write_text(&self.text).map_err(|err| {
            warn!(pointer = %self.validator.pointer, error = %err, "clipboard write failed");
            FieldError::resource(&self.validator.pointer, format!("Copy failed: {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;

    const SAMPLE: &str = r#"{"name":"John","age":30,"active":true}"#;

    fn editor() -> JsonEditor {
        JsonEditor::new(
            &FieldConfig::new("meta", FieldKind::Json),
            Duration::from_millis(300),
        )
    }

    #[test]
    fn beautify_uses_two_space_indent() {
        let pretty = beautify(SAMPLE).unwrap();
        assert!(pretty.contains("  \"name\": \"John\""));
        assert!(pretty.starts_with("{\n"));
    }

    #[test]
    fn beautify_keeps_key_order() {
        let pretty = beautify(SAMPLE).unwrap();
        let name = pretty.find("name").unwrap();
        let active = pretty.find("active").unwrap();
        assert!(name < active);
    }

    #[test]
    fn minify_of_beautified_matches_minify() {
        let text = "{ \"a\" : [1, 2, {\"b\": null}] , \"c\": \"x y\" }";
        assert_eq!(minify(&beautify(text).unwrap()).unwrap(), minify(text).unwrap());
        assert_eq!(minify(text).unwrap(), r#"{"a":[1,2,{"b":null}],"c":"x y"}"#);
    }

    #[test]
    fn beautified_text_parses_back_to_original() {
        let original = json!({"list": [1, 2.5, "three"], "nested": {"ok": false}});
        let text = serde_json::to_string(&original).unwrap();
        let parsed: Value = serde_json::from_str(&beautify(&text).unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn validation_waits_for_debounce() {
        let start = Instant::now();
        let mut editor = editor();
        editor.input(SAMPLE, start);
        assert!(editor.is_pending());
        assert_eq!(editor.poll(start + Duration::from_millis(100)), None);
        let emitted = editor.poll(start + Duration::from_millis(300)).unwrap();
        assert_eq!(emitted, json!({"name": "John", "age": 30, "active": true}));
        assert!(editor.is_valid());
        assert!(editor.error().is_none());
    }

    #[test]
    fn last_input_wins() {
        let start = Instant::now();
        let mut editor = editor();
        editor.input("{", start);
        editor.input("[1]", start + Duration::from_millis(200));
        assert_eq!(editor.poll(start + Duration::from_millis(350)), None);
        assert_eq!(
            editor.poll(start + Duration::from_millis(500)),
            Some(json!([1]))
        );
    }

    #[test]
    fn invalid_text_is_emitted_raw() {
        let mut editor = editor();
        editor.input("{\"name\": ", Instant::now());
        let emitted = editor.flush();
        assert_eq!(emitted, Value::String("{\"name\": ".to_string()));
        assert!(!editor.is_valid());
        assert!(matches!(editor.error(), Some(FieldError::Parse { .. })));
    }

    #[test]
    fn beautify_on_invalid_text_reports_and_keeps_text() {
        let mut editor = editor();
        editor.input("{oops", Instant::now());
        let err = editor.beautify().unwrap_err();
        assert!(matches!(err, FieldError::Parse { .. }));
        assert_eq!(editor.text(), "{oops");
        assert!(editor.minify().is_err());
        assert_eq!(editor.text(), "{oops");
    }

    #[test]
    fn beautify_then_minify_edits_buffer() {
        let mut editor = editor();
        editor.input(SAMPLE, Instant::now());
        editor.beautify().unwrap();
        assert!(editor.text().contains("  \"name\": \"John\""));
        editor.minify().unwrap();
        assert_eq!(editor.text(), SAMPLE);
        assert!(!editor.is_pending());
    }

    #[test]
    fn seeding_structured_value_pretty_prints() {
        let mut editor = editor();
        editor.seed(&json!({"a": 1}));
        assert_eq!(editor.text(), "{\n  \"a\": 1\n}");
        assert!(editor.is_valid());
    }

    struct BrokenClipboard;

    impl Clipboard for BrokenClipboard {
        fn write_text(&mut self, _text: &str) -> anyhow::Result<()> {
            Err(anyhow!("permission denied"))
        }
    }

    #[derive(Default)]
    struct MemoryClipboard(String);

    impl Clipboard for MemoryClipboard {
        fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
            self.0 = text.to_string();
            Ok(())
        }
    }

    #[test]
    fn clipboard_failure_is_a_resource_error() {
        let mut editor = editor();
        editor.input("[]", Instant::now());
        let err = editor.copy_to(&mut BrokenClipboard).unwrap_err();
        assert!(matches!(err, FieldError::Resource { .. }));
        assert_eq!(editor.text(), "[]");

        let mut clipboard = MemoryClipboard::default();
        editor.copy_to(&mut clipboard).unwrap();
        assert_eq!(clipboard.0, "[]");
    }
}
