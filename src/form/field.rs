use std::{rc::Rc, time::Instant};

use serde_json::Value;
use tracing::debug;

use super::error::{FieldError, ValidationResult};
use super::validators::{
    BlobUrlRegistry, DateMode, FieldValidator, JsonEditor, PreviewUrls, StatusDisplay,
    SlugField, UploadField, Validator, format_display,
};
use crate::domain::{FieldConfig, FieldKind, FieldValue};
use crate::options::FieldOptions;

/// Events a field hands to its parent form.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    UpdateModelValue(Value),
    Change(Value),
    Focus,
    Blur,
}

impl FieldEvent {
    /// Name of the event on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            FieldEvent::UpdateModelValue(_) => "update:modelValue",
            FieldEvent::Change(_) => "change",
            FieldEvent::Focus => "focus",
            FieldEvent::Blur => "blur",
        }
    }
}

#[derive(Debug)]
enum Control {
    Plain,
    Slug(SlugField),
    Json(JsonEditor),
    Upload(UploadField<Rc<dyn PreviewUrls>>),
}

/// One bound form control: current value, last emitted value, validity and
/// the queue of events not yet collected by the parent.
#[derive(Debug)]
pub struct Field {
    config: FieldConfig,
    validator: Validator,
    control: Control,
    value: FieldValue,
    committed: Value,
    result: ValidationResult,
    focused: bool,
    dirty: bool,
    events: Vec<FieldEvent>,
}

impl Field {
    pub fn new(config: FieldConfig, options: &FieldOptions) -> Self {
        Self::with_previews(config, options, Rc::new(BlobUrlRegistry::new()))
    }

    pub fn with_previews(
        config: FieldConfig,
        options: &FieldOptions,
        previews: Rc<dyn PreviewUrls>,
    ) -> Self {
        let validator = Validator::for_config(&config, options);
        let control = match config.kind {
            FieldKind::Json => Control::Json(JsonEditor::new(&config, options.debounce)),
            FieldKind::File | FieldKind::Image => {
                Control::Upload(UploadField::new(&config, previews))
            }
            FieldKind::Slug => Control::Slug(SlugField::new(config.constraints.max_length)),
            _ => Control::Plain,
        };
        let result = validator.validate(&FieldValue::Empty);
        Self {
            config,
            validator,
            control,
            value: FieldValue::Empty,
            committed: Value::Null,
            result,
            focused: false,
            dirty: false,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn attribute(&self) -> &str {
        self.config.attribute()
    }

    pub fn kind(&self) -> FieldKind {
        self.config.kind
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Last value emitted upward.
    pub fn committed(&self) -> &Value {
        &self.committed
    }

    pub fn result(&self) -> &ValidationResult {
        &self.result
    }

    pub fn error(&self) -> Option<&FieldError> {
        self.result.error.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.result.is_valid
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn is_display_only(&self) -> bool {
        self.config.readonly || self.config.kind == FieldKind::Status
    }

    /// Load a value from the parent without emitting anything.
    pub fn seed(&mut self, value: &Value) {
        self.value = FieldValue::from_json(value);
        match &mut self.control {
            Control::Json(editor) => {
                editor.seed(value);
                self.result = editor.result().clone();
            }
            Control::Slug(slug) => {
                slug.set(self.value.display());
                self.result = self.validator.validate(&self.value);
            }
            _ => self.result = self.validator.validate(&self.value),
        }
        self.committed = value.clone();
        self.dirty = false;
    }

    pub fn input(&mut self, value: FieldValue) -> bool {
        self.input_at(value, Instant::now())
    }

    /// Apply user input. Returns whether a new value was emitted right away.
    /// JSON input is only recorded here and validated by [`Field::poll`].
    pub fn input_at(&mut self, value: FieldValue, now: Instant) -> bool {
        if self.config.readonly {
            debug!(attribute = self.attribute(), "ignoring input on readonly field");
            return false;
        }
        self.dirty = true;

        match &mut self.control {
            Control::Json(editor) => {
                let text = match &value {
                    FieldValue::Json(structured) if !structured.is_string() => {
                        serde_json::to_string_pretty(structured)
                            .unwrap_or_else(|_| structured.to_string())
                    }
                    other => other.display(),
                };
                editor.input(text.clone(), now);
                self.value = FieldValue::Text(text);
                false
            }
            Control::Upload(uploads) => {
                let outcome = match value {
                    FieldValue::Files(files) => uploads.select(files),
                    FieldValue::Empty => Ok(uploads.clear()),
                    other => {
                        let checked = self.validator.validate(&other);
                        if !checked.is_valid {
                            debug!(
                                attribute = self.config.attribute(),
                                error = ?checked.error_message(),
                                "upload value rejected; keeping current files"
                            );
                            self.result = checked;
                            return false;
                        }
                        uploads.clear();
                        Ok(other)
                    }
                };
                match outcome {
                    Ok(accepted) => {
                        self.result = self.validator.validate(&accepted);
                        self.value = accepted;
                        let emitted = self.result.normalized.clone();
                        self.emit_value(emitted);
                        true
                    }
                    Err(err) => {
                        self.result =
                            ValidationResult::invalid(err, self.committed.clone());
                        false
                    }
                }
            }
            Control::Plain | Control::Slug(_) => {
                let normalized = self.validator.normalize(&value);
                self.result = self.validator.validate(&normalized);
                self.value = normalized;
                if let Control::Slug(slug) = &mut self.control {
                    slug.set(self.value.display());
                }
                if self.result.is_valid {
                    let emitted = self.result.normalized.clone();
                    self.emit_value(emitted);
                    true
                } else {
                    debug!(
                        attribute = self.attribute(),
                        error = ?self.result.error_message(),
                        "value rejected; keeping previous value"
                    );
                    false
                }
            }
        }
    }

    /// Drive the debounce timer of JSON fields. Returns whether a value was emitted.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Control::Json(editor) = &mut self.control else {
            return false;
        };
        let Some(emitted) = editor.poll(now) else {
            return false;
        };
        self.result = editor.result().clone();
        self.emit_value(emitted);
        true
    }

    /// Validate any pending input now and return the current result.
    pub fn flush(&mut self) -> &ValidationResult {
        match &mut self.control {
            Control::Json(editor) => {
                if editor.is_pending() {
                    let emitted = editor.flush();
                    self.result = editor.result().clone();
                    self.emit_value(emitted);
                }
            }
            Control::Upload(uploads) => {
                if uploads.error().is_none() {
                    self.result = self.validator.validate(&self.value);
                }
            }
            Control::Plain | Control::Slug(_) => {
                self.result = self.validator.validate(&self.value);
            }
        }
        &self.result
    }

    pub fn beautify(&mut self) -> Result<(), FieldError> {
        self.reformat_json(true)
    }

    pub fn minify(&mut self) -> Result<(), FieldError> {
        self.reformat_json(false)
    }

    fn reformat_json(&mut self, pretty: bool) -> Result<(), FieldError> {
        let Control::Json(editor) = &mut self.control else {
            return Err(FieldError::validation(
                format!("/{}", self.config.attribute()),
                format!("{} fields cannot be reformatted", self.config.kind),
            ));
        };
        let outcome = if pretty {
            editor.beautify()
        } else {
            editor.minify()
        };
        self.result = editor.result().clone();
        self.value = FieldValue::Text(editor.text().to_string());
        outcome?;
        let emitted = self.result.normalized.clone();
        self.emit_value(emitted);
        Ok(())
    }

    pub fn json_text(&self) -> Option<&str> {
        match &self.control {
            Control::Json(editor) => Some(editor.text()),
            _ => None,
        }
    }

    pub fn uploads(&self) -> Option<&UploadField<Rc<dyn PreviewUrls>>> {
        match &self.control {
            Control::Upload(uploads) => Some(uploads),
            _ => None,
        }
    }

    pub fn remove_file(&mut self, index: usize) -> bool {
        let Control::Upload(uploads) = &mut self.control else {
            return false;
        };
        let Some(remaining) = uploads.remove(index) else {
            return false;
        };
        self.result = self.validator.validate(&remaining);
        self.value = remaining;
        let emitted = self.result.normalized.clone();
        self.emit_value(emitted);
        true
    }

    /// Fill an empty slug from its source text. Never touches a non-empty slug.
    pub fn sync_slug_from(&mut self, source: &str) -> bool {
        if self.config.readonly {
            return false;
        }
        let Control::Slug(slug) = &mut self.control else {
            return false;
        };
        let Some(generated) = slug.sync_from_source(source).map(str::to_string) else {
            return false;
        };
        self.input(FieldValue::Text(generated))
    }

    /// Clear the control; the parent receives `null`.
    pub fn clear(&mut self) {
        if self.config.readonly {
            return;
        }
        match &mut self.control {
            Control::Upload(uploads) => {
                uploads.clear();
            }
            Control::Json(editor) => editor.seed(&Value::Null),
            Control::Slug(slug) => slug.clear(),
            Control::Plain => {}
        }
        self.value = FieldValue::Empty;
        self.result = self.validator.validate(&FieldValue::Empty);
        self.dirty = true;
        self.emit_value(Value::Null);
    }

    /// Imperatively focus the control. Display-only fields ignore it.
    pub fn focus(&mut self) -> bool {
        if self.is_display_only() {
            return false;
        }
        if !self.focused {
            self.focused = true;
            self.events.push(FieldEvent::Focus);
        }
        true
    }

    pub fn blur(&mut self) {
        if !self.focused {
            return;
        }
        self.focused = false;
        self.flush();
        self.events.push(FieldEvent::Blur);
    }

    /// Text shown in the control.
    pub fn display_value(&self) -> String {
        match (&self.control, self.config.kind) {
            (Control::Json(editor), _) => editor.text().to_string(),
            (_, FieldKind::Date | FieldKind::DateTime) => {
                let mode = if self.config.kind == FieldKind::DateTime {
                    DateMode::DateTime
                } else {
                    DateMode::Date
                };
                let raw = self.value.display();
                format_display(&raw, mode, self.config.constraints.format.as_deref())
                    .as_str()
                    .to_string()
            }
            _ => self.value.display(),
        }
    }

    pub fn status_display(&self) -> Option<StatusDisplay> {
        match &self.validator {
            Validator::Status(status) => Some(status.resolver().display(&self.value.to_json())),
            _ => None,
        }
    }

    pub fn drain_events(&mut self) -> Vec<FieldEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit_value(&mut self, value: Value) {
        self.committed = value.clone();
        self.events.push(FieldEvent::UpdateModelValue(value.clone()));
        self.events.push(FieldEvent::Change(value));
    }
}
