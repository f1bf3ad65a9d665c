mod date;
mod json;
mod slug;
mod status;
mod text;
mod upload;
mod url;

pub use date::{
    DateDisplay, DateMode, DateValidator, format_display, format_for_control, parse_date_input,
    translate_picker_format,
};
pub use json::{Clipboard, JsonEditor, JsonValidator, beautify, minify};
pub use slug::{SlugField, SlugValidator, is_valid_slug, slugify, slugify_with_limit};
pub use status::{StatusDisplay, StatusResolver, StatusValidator};
pub use text::{NumberValidator, TextValidator};
pub use upload::{
    BlobUrlRegistry, PreviewUrl, PreviewUrls, UploadField, UploadValidator, accepts_type,
    format_size_kb,
};
pub use self::url::{UrlValidator, has_scheme, is_valid_url, normalize_url, normalize_url_with};

use crate::domain::{FieldConfig, FieldKind, FieldValue};
use crate::form::error::{FieldError, ValidationResult};
use crate::options::FieldOptions;

/// Shared contract: turn a raw value into a canonical one and judge it.
pub trait FieldValidator: std::fmt::Debug {
    fn kind(&self) -> FieldKind;

    fn normalize(&self, value: &FieldValue) -> FieldValue {
        value.clone()
    }

    fn validate(&self, value: &FieldValue) -> ValidationResult;
}

pub(crate) fn required_error(pointer: &str, required: bool) -> Option<FieldError> {
    required.then(|| FieldError::validation(pointer, "This field is required"))
}

/// One validator per field, picked by the config's type tag.
#[derive(Debug, Clone)]
pub enum Validator {
    Text(TextValidator),
    Number(NumberValidator),
    Url(UrlValidator),
    Slug(SlugValidator),
    Json(JsonValidator),
    Upload(UploadValidator),
    Date(DateValidator),
    Status(StatusValidator),
}

impl Validator {
    pub fn for_config(config: &FieldConfig, options: &FieldOptions) -> Self {
        match config.kind {
            FieldKind::Text => Validator::Text(TextValidator::new(config)),
            FieldKind::Number => Validator::Number(NumberValidator::new(config)),
            FieldKind::Url => {
                Validator::Url(UrlValidator::new(config, &options.default_protocol))
            }
            FieldKind::Slug => Validator::Slug(SlugValidator::new(config)),
            FieldKind::Json => Validator::Json(JsonValidator::new(config)),
            FieldKind::File | FieldKind::Image => Validator::Upload(UploadValidator::new(config)),
            FieldKind::Date | FieldKind::DateTime => Validator::Date(DateValidator::new(config)),
            FieldKind::Status => Validator::Status(StatusValidator::new(config, options.theme)),
        }
    }

    fn inner(&self) -> &dyn FieldValidator {
        match self {
            Validator::Text(inner) => inner,
            Validator::Number(inner) => inner,
            Validator::Url(inner) => inner,
            Validator::Slug(inner) => inner,
            Validator::Json(inner) => inner,
            Validator::Upload(inner) => inner,
            Validator::Date(inner) => inner,
            Validator::Status(inner) => inner,
        }
    }
}

impl FieldValidator for Validator {
    fn kind(&self) -> FieldKind {
        self.inner().kind()
    }

    fn normalize(&self, value: &FieldValue) -> FieldValue {
        self.inner().normalize(value)
    }

    fn validate(&self, value: &FieldValue) -> ValidationResult {
        self.inner().validate(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_tag_selects_validator() {
        let options = FieldOptions::default();
        let cases = [
            (FieldKind::Text, FieldKind::Text),
            (FieldKind::Image, FieldKind::Image),
            (FieldKind::File, FieldKind::File),
            (FieldKind::DateTime, FieldKind::DateTime),
            (FieldKind::Status, FieldKind::Status),
        ];
        for (tag, expected) in cases {
            let validator = Validator::for_config(&FieldConfig::new("f", tag), &options);
            assert_eq!(validator.kind(), expected);
        }
    }

    #[test]
    fn url_validator_uses_configured_protocol() {
        let options = FieldOptions::default().with_default_protocol("http");
        let mut config = FieldConfig::new("site", FieldKind::Url);
        config.constraints.normalize_protocol = true;
        let validator = Validator::for_config(&config, &options);
        let result = validator.validate(&FieldValue::text("example.org"));
        assert_eq!(result.normalized, json!("http://example.org"));
    }
}
