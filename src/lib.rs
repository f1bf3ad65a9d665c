#![deny(rust_2018_idioms)]
//! Value normalization and validation for admin-panel form fields.
//!
//! Each field takes a raw value plus its [`FieldConfig`], produces a canonical
//! value for the parent form, a display representation and a validity state,
//! and queues `update:modelValue` / `change` / `focus` / `blur` events.

mod domain;
mod form;
mod io;
mod options;

pub use domain::{
    Constraints, Dimensions, FieldConfig, FieldKind, FieldValue, StatusCategory, StatusOverride,
    StatusOverrides, UploadCandidate, parse_field_config, parse_field_configs,
};
pub use form::validators;
pub use form::{
    Debouncer, Field, FieldError, FieldEvent, FieldValidator, FormOutcome, FormState,
    ValidationResult, Validator, validate_form,
};
pub use io::{
    DocumentFormat, load_field_configs, parse_document_str, read_document, read_field_configs,
    render_document,
};
pub use options::{FieldOptions, Theme};

pub mod prelude {
    pub use super::{
        Field, FieldConfig, FieldEvent, FieldKind, FieldOptions, FieldValue, FormState, Theme,
    };
}
