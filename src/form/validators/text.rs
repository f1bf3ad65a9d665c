use serde_json::Value;

use super::{FieldValidator, required_error};
use crate::domain::{FieldConfig, FieldKind, FieldValue};
use crate::form::error::{FieldError, ValidationResult};

/// Plain text input: trimming is left to the user, only length is enforced.
#[derive(Debug, Clone)]
pub struct TextValidator {
    pointer: String,
    required: bool,
    max_length: Option<usize>,
}

impl TextValidator {
    pub fn new(config: &FieldConfig) -> Self {
        Self {
            pointer: format!("/{}", config.attribute()),
            required: config.constraints.required,
            max_length: config.constraints.max_length,
        }
    }
}

impl FieldValidator for TextValidator {
    fn kind(&self) -> FieldKind {
        FieldKind::Text
    }

    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let text = match value {
            FieldValue::Empty => String::new(),
            FieldValue::Json(Value::Object(_)) | FieldValue::Json(Value::Array(_)) => {
                return ValidationResult::invalid(
                    FieldError::validation(&self.pointer, "expected text"),
                    value.to_json(),
                );
            }
            other => other.display(),
        };

        if text.trim().is_empty()
            && let Some(err) = required_error(&self.pointer, self.required)
        {
            return ValidationResult::invalid(err, Value::String(text));
        }
        if let Some(max) = self.max_length
            && text.chars().count() > max
        {
            return ValidationResult::invalid(
                FieldError::validation(
                    &self.pointer,
                    format!("Must be at most {max} characters"),
                ),
                Value::String(text),
            );
        }
        ValidationResult::valid(Value::String(text))
    }
}

/// Numeric input. Text is parsed; the canonical value is a JSON number.
#[derive(Debug, Clone)]
pub struct NumberValidator {
    pointer: String,
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
}

impl NumberValidator {
    pub fn new(config: &FieldConfig) -> Self {
        Self {
            pointer: format!("/{}", config.attribute()),
            required: config.constraints.required,
            min: config.constraints.min,
            max: config.constraints.max,
        }
    }
}

impl FieldValidator for NumberValidator {
    fn kind(&self) -> FieldKind {
        FieldKind::Number
    }

    fn normalize(&self, value: &FieldValue) -> FieldValue {
        match value {
            FieldValue::Text(text) if text.trim().is_empty() => FieldValue::Empty,
            FieldValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|num| num.is_finite())
                .map(FieldValue::Number)
                .unwrap_or_else(|| value.clone()),
            other => other.clone(),
        }
    }

    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let normalized = self.normalize(value);
        let number = match &normalized {
            FieldValue::Empty => {
                return match required_error(&self.pointer, self.required) {
                    Some(err) => ValidationResult::invalid(err, Value::Null),
                    None => ValidationResult::valid(Value::Null),
                };
            }
            FieldValue::Number(num) => *num,
            other => {
                return ValidationResult::invalid(
                    FieldError::validation(&self.pointer, "expected number"),
                    other.to_json(),
                );
            }
        };

        if let Some(min) = self.min
            && number < min
        {
            return ValidationResult::invalid(
                FieldError::validation(&self.pointer, format!("Must be at least {min}")),
                normalized.to_json(),
            );
        }
        if let Some(max) = self.max
            && number > max
        {
            return ValidationResult::invalid(
                FieldError::validation(&self.pointer, format!("Must be at most {max}")),
                normalized.to_json(),
            );
        }
        ValidationResult::valid(normalized.to_json())
    }
}
