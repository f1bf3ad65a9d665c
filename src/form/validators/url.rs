use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{FieldValidator, required_error};
use crate::domain::{FieldConfig, FieldKind, FieldValue};
use crate::form::error::{FieldError, ValidationResult};

static SCHEME_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:[a-z][a-z0-9+.\-]*://|mailto:|tel:)").expect("invalid scheme pattern")
});

/// Trim and, when asked, prefix a scheme onto input that has none.
pub fn normalize_url(raw: &str, normalize_protocol: bool) -> String {
    normalize_url_with(raw, normalize_protocol, "https")
}

pub fn normalize_url_with(raw: &str, normalize_protocol: bool, protocol: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !normalize_protocol || has_scheme(trimmed) {
        return trimmed.to_string();
    }
    format!("{protocol}://{}", trimmed.trim_start_matches('/'))
}

pub fn has_scheme(value: &str) -> bool {
    SCHEME_PREFIX.is_match(value)
}

/// A URL is valid when it parses and carries a non-empty host. Bare domains
/// (`example.com`) and scheme-only strings (`http://`) are rejected.
pub fn is_valid_url(value: &str) -> bool {
    match Url::parse(value.trim()) {
        Ok(url) => url.host_str().is_some_and(|host| !host.is_empty()),
        Err(_) => false,
    }
}

#[derive(Debug, Clone)]
pub struct UrlValidator {
    pointer: String,
    required: bool,
    validate: bool,
    normalize_protocol: bool,
    protocol: String,
}

impl UrlValidator {
    pub fn new(config: &FieldConfig, protocol: &str) -> Self {
        Self {
            pointer: format!("/{}", config.attribute()),
            required: config.constraints.required,
            validate: config.constraints.validate_url,
            normalize_protocol: config.constraints.normalize_protocol,
            protocol: protocol.to_string(),
        }
    }
}

impl FieldValidator for UrlValidator {
    fn kind(&self) -> FieldKind {
        FieldKind::Url
    }

    fn normalize(&self, value: &FieldValue) -> FieldValue {
        match value {
            FieldValue::Text(raw) => FieldValue::Text(normalize_url_with(
                raw,
                self.normalize_protocol,
                &self.protocol,
            )),
            other => other.clone(),
        }
    }

    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let normalized = self.normalize(value);
        let Some(text) = normalized.as_text().map(str::to_string) else {
            if normalized.is_empty() {
                return match required_error(&self.pointer, self.required) {
                    Some(err) => ValidationResult::invalid(err, Value::Null),
                    None => ValidationResult::valid(Value::Null),
                };
            }
            return ValidationResult::invalid(
                FieldError::validation(&self.pointer, "expected a URL string"),
                normalized.to_json(),
            );
        };

        if text.is_empty() {
            return match required_error(&self.pointer, self.required) {
                Some(err) => ValidationResult::invalid(err, Value::String(text)),
                None => ValidationResult::valid(Value::String(text)),
            };
        }

        if self.validate && !is_valid_url(&text) {
            debug!(pointer = %self.pointer, value = %text, "rejected url");
            return ValidationResult::invalid(
                FieldError::validation(&self.pointer, "Please enter a valid URL"),
                Value::String(text),
            );
        }
        ValidationResult::valid(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Constraints;

    fn validator(validate: bool, normalize: bool) -> UrlValidator {
        let config = FieldConfig::new("website", FieldKind::Url).with_constraints(Constraints {
            validate_url: validate,
            normalize_protocol: normalize,
            ..Default::default()
        });
        UrlValidator::new(&config, "https")
    }

    #[test]
    fn prefixes_https_only_when_scheme_missing() {
        assert_eq!(normalize_url("  example.com ", true), "https://example.com");
        assert_eq!(normalize_url("http://example.com", true), "http://example.com");
        assert_eq!(normalize_url("ftp://files.example.com", true), "ftp://files.example.com");
        assert_eq!(normalize_url("mailto:me@example.com", true), "mailto:me@example.com");
        assert_eq!(normalize_url("example.com", false), "example.com");
        assert_eq!(normalize_url("   ", true), "");
    }

    #[test]
    fn scheme_detection_is_case_insensitive() {
        assert_eq!(normalize_url("HTTPS://Example.com", true), "HTTPS://Example.com");
    }

    #[test]
    fn requires_scheme_and_host() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://localhost:8080/path?q=1"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("http://"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("mailto:me@example.com"));
    }

    #[test]
    fn bare_domain_passes_once_normalized() {
        let result = validator(true, true).validate(&FieldValue::text("example.com"));
        assert!(result.is_valid);
        assert_eq!(result.normalized, Value::String("https://example.com".into()));
    }

    #[test]
    fn bare_domain_fails_without_normalization() {
        let result = validator(true, false).validate(&FieldValue::text("example.com"));
        assert!(!result.is_valid);
        assert_eq!(result.error_message(), Some("Please enter a valid URL"));
    }

    #[test]
    fn validation_is_opt_in() {
        let result = validator(false, false).validate(&FieldValue::text("whatever"));
        assert!(result.is_valid);
        assert_eq!(result.normalized, Value::String("whatever".into()));
    }

    #[test]
    fn empty_value_is_valid_unless_required() {
        assert!(validator(true, true).validate(&FieldValue::text("")).is_valid);
        let mut required = validator(true, true);
        required.required = true;
        assert!(!required.validate(&FieldValue::Empty).is_valid);
    }
}
