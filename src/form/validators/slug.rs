use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{FieldValidator, required_error};
use crate::domain::{FieldConfig, FieldKind, FieldValue};
use crate::form::error::{FieldError, ValidationResult};

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("invalid slug pattern"));

static NON_SLUG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("invalid slug separator pattern"));

pub fn is_valid_slug(value: &str, max_length: Option<usize>) -> bool {
    if max_length.is_some_and(|max| value.len() > max) {
        return false;
    }
    SLUG_PATTERN.is_match(value)
}

/// Lower-case `source` and collapse everything outside `[a-z0-9]` into single hyphens.
pub fn slugify(source: &str) -> String {
    let lowered = source.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Like [`slugify`], cut down to `max_length` without leaving a dangling hyphen.
pub fn slugify_with_limit(source: &str, max_length: Option<usize>) -> String {
    let slug = slugify(source);
    match max_length {
        Some(max) if slug.len() > max => slug[..max].trim_end_matches('-').to_string(),
        _ => slug,
    }
}

fn describe_problem(value: &str, max_length: Option<usize>) -> String {
    if let Some(max) = max_length
        && value.len() > max
    {
        return format!("Slug must be at most {max} characters");
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return "Slug must be lowercase".to_string();
    }
    if value.chars().any(char::is_whitespace) {
        return "Slug must not contain spaces".to_string();
    }
    if value.starts_with('-') || value.ends_with('-') {
        return "Slug must not start or end with a hyphen".to_string();
    }
    if value.contains("--") {
        return "Slug must not contain consecutive hyphens".to_string();
    }
    "Slug may only contain lowercase letters, numbers and hyphens".to_string()
}

#[derive(Debug, Clone)]
pub struct SlugValidator {
    pointer: String,
    required: bool,
    max_length: Option<usize>,
}

impl SlugValidator {
    pub fn new(config: &FieldConfig) -> Self {
        Self {
            pointer: format!("/{}", config.attribute()),
            required: config.constraints.required,
            max_length: config.constraints.max_length,
        }
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }
}

impl FieldValidator for SlugValidator {
    fn kind(&self) -> FieldKind {
        FieldKind::Slug
    }

    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let text = match value {
            FieldValue::Empty => String::new(),
            other => match other.as_text() {
                Some(text) => text.to_string(),
                None => {
                    return ValidationResult::invalid(
                        FieldError::validation(&self.pointer, "expected a slug string"),
                        other.to_json(),
                    );
                }
            },
        };

        if text.is_empty() {
            return match required_error(&self.pointer, self.required) {
                Some(err) => ValidationResult::invalid(err, Value::String(text)),
                None => ValidationResult::valid(Value::String(text)),
            };
        }

        if is_valid_slug(&text, self.max_length) {
            ValidationResult::valid(Value::String(text))
        } else {
            let message = describe_problem(&text, self.max_length);
            debug!(pointer = %self.pointer, value = %text, %message, "rejected slug");
            ValidationResult::invalid(
                FieldError::validation(&self.pointer, message),
                Value::String(text),
            )
        }
    }
}

/// Slug bound to a source field (usually the title).
#[derive(Debug, Clone, Default)]
pub struct SlugField {
    value: String,
    max_length: Option<usize>,
}

impl SlugField {
    pub fn new(max_length: Option<usize>) -> Self {
        Self {
            value: String::new(),
            max_length,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Manual edit from the user.
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Regenerate from `source`, but only while the slug is still empty.
    /// Returns the new slug when one was written.
    pub fn sync_from_source(&mut self, source: &str) -> Option<&str> {
        if !self.value.is_empty() {
            return None;
        }
        let generated = slugify_with_limit(source, self.max_length);
        if generated.is_empty() {
            return None;
        }
        self.value = generated;
        Some(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Constraints;

    #[test]
    fn accepts_well_formed_slugs() {
        for slug in ["a", "hello", "hello-world", "post-2024-01", "123"] {
            assert!(is_valid_slug(slug, None), "{slug} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_slugs() {
        for slug in [
            "Hello", "hello world", "-hello", "hello-", "hello--world", "", "héllo", "a_b",
        ] {
            assert!(!is_valid_slug(slug, None), "{slug} should be invalid");
        }
    }

    #[test]
    fn enforces_max_length() {
        assert!(is_valid_slug("abcde", Some(5)));
        assert!(!is_valid_slug("abcdef", Some(5)));
    }

    #[test]
    fn slugify_keeps_only_slug_characters() {
        assert_eq!(slugify("Hello & World! @#$%"), "hello-world");
        assert_eq!(slugify("  Rust -- Is   Fun  "), "rust-is-fun");
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn limited_slugify_does_not_end_in_hyphen() {
        assert_eq!(slugify_with_limit("Hello World", Some(6)), "hello");
        assert_eq!(slugify_with_limit("Hello World", None), "hello-world");
    }

    #[test]
    fn generation_never_overwrites_manual_value() {
        let mut field = SlugField::new(None);
        field.set("custom-slug");
        assert_eq!(field.sync_from_source("Brand New Title"), None);
        assert_eq!(field.value(), "custom-slug");
    }

    #[test]
    fn generation_fills_empty_slug() {
        let mut field = SlugField::new(None);
        assert_eq!(field.sync_from_source("My First Post"), Some("my-first-post"));
        assert_eq!(field.sync_from_source("Edited Title"), None);
        assert_eq!(field.value(), "my-first-post");
        field.clear();
        assert_eq!(field.sync_from_source("Edited Title"), Some("edited-title"));
    }

    #[test]
    fn validator_explains_rejections() {
        let config = FieldConfig::new("slug", FieldKind::Slug).with_constraints(Constraints {
            max_length: Some(10),
            ..Default::default()
        });
        let validator = SlugValidator::new(&config);
        let cases = [
            ("Hello", "Slug must be lowercase"),
            ("a b", "Slug must not contain spaces"),
            ("-ab", "Slug must not start or end with a hyphen"),
            ("a--b", "Slug must not contain consecutive hyphens"),
            ("abcdefghijk", "Slug must be at most 10 characters"),
        ];
        for (input, message) in cases {
            let result = validator.validate(&FieldValue::text(input));
            assert!(!result.is_valid);
            assert_eq!(result.error_message(), Some(message), "input {input}");
        }
        assert!(validator.validate(&FieldValue::text("ok-slug")).is_valid);
    }
}
