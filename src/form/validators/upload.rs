use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    fmt,
    rc::Rc,
};

use serde_json::Value;
use tracing::debug;

use super::{FieldValidator, required_error};
use crate::domain::{FieldConfig, FieldKind, FieldValue, UploadCandidate};
use crate::form::error::{FieldError, ValidationResult};

/// Whether `file` matches an `accept`-style list: exact MIME types, `type/*`
/// wildcards and `.ext` suffixes. An empty list accepts everything.
pub fn accepts_type(accepted: &[String], file: &UploadCandidate) -> bool {
    let mut entries = accepted
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(|entry| entry.trim().to_ascii_lowercase())
        .filter(|entry| !entry.is_empty())
        .peekable();
    if entries.peek().is_none() {
        return true;
    }

    let mime = file.mime_type.trim().to_ascii_lowercase();
    entries.any(|entry| {
        if let Some(suffix) = entry.strip_prefix('.') {
            // multi-part suffixes such as `.tar.gz` match on the whole name
            if suffix.contains('.') {
                file.name.to_ascii_lowercase().ends_with(&entry)
            } else {
                file.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(suffix))
            }
        } else if let Some(prefix) = entry.strip_suffix("/*") {
            mime.strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
        } else {
            entry == "*" || entry == "*/*" || entry == mime
        }
    })
}

/// Render a kilobyte limit the way the upload hint shows it.
pub fn format_size_kb(kb: u64) -> String {
    if kb >= 1024 && kb % 1024 == 0 {
        format!("{} MB", kb / 1024)
    } else if kb >= 1024 {
        format!("{:.1} MB", kb as f64 / 1024.0)
    } else {
        format!("{kb} KB")
    }
}

#[derive(Debug, Clone)]
pub struct UploadValidator {
    pointer: String,
    kind: FieldKind,
    required: bool,
    accepted: Vec<String>,
    max_size_kb: Option<u64>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    max_files: Option<usize>,
    multiple: bool,
}

impl UploadValidator {
    pub fn new(config: &FieldConfig) -> Self {
        let constraints = &config.constraints;
        Self {
            pointer: format!("/{}", config.attribute()),
            kind: config.kind,
            required: constraints.required,
            accepted: constraints.accepted_types.clone(),
            max_size_kb: constraints.max_size,
            max_width: constraints.max_width,
            max_height: constraints.max_height,
            max_files: constraints.max_files,
            multiple: constraints.multiple,
        }
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn check_file(&self, file: &UploadCandidate) -> Result<(), FieldError> {
        if !accepts_type(&self.accepted, file) {
            return Err(self.reject(format!(
                "File type {} is not allowed. Accepted types: {}",
                display_mime(file),
                self.accepted.join(", ")
            )));
        }

        if let Some(max_kb) = self.max_size_kb
            && file.size > max_kb.saturating_mul(1024)
        {
            return Err(self.reject(format!(
                "File {} is too large. Maximum size is {}",
                file.name,
                format_size_kb(max_kb)
            )));
        }

        if self.kind == FieldKind::Image
            && let Some(dimensions) = file.dimensions
        {
            if let Some(max_width) = self.max_width
                && dimensions.width > max_width
            {
                return Err(self.reject(format!(
                    "Image width {}px exceeds the maximum of {max_width}px",
                    dimensions.width
                )));
            }
            if let Some(max_height) = self.max_height
                && dimensions.height > max_height
            {
                return Err(self.reject(format!(
                    "Image height {}px exceeds the maximum of {max_height}px",
                    dimensions.height
                )));
            }
        }
        Ok(())
    }

    /// Count check for adding `incoming` files next to `existing` ones.
    pub fn check_count(&self, existing: usize, incoming: usize) -> Result<(), FieldError> {
        if !self.multiple {
            if incoming > 1 {
                return Err(self.reject("Only one file can be selected"));
            }
            return Ok(());
        }
        if let Some(max) = self.max_files
            && existing + incoming > max
        {
            return Err(self.reject(format!("You can upload at most {max} files")));
        }
        Ok(())
    }

    pub fn check_selection(
        &self,
        existing: usize,
        incoming: &[UploadCandidate],
    ) -> Result<(), FieldError> {
        self.check_count(existing, incoming.len())?;
        incoming.iter().try_for_each(|file| self.check_file(file))
    }

    fn reject(&self, message: impl Into<String>) -> FieldError {
        let error = FieldError::validation(&self.pointer, message);
        debug!(pointer = %self.pointer, error = %error, "rejected upload");
        error
    }
}

fn display_mime(file: &UploadCandidate) -> &str {
    if file.mime_type.is_empty() {
        "(unknown)"
    } else {
        &file.mime_type
    }
}

impl FieldValidator for UploadValidator {
    fn kind(&self) -> FieldKind {
        self.kind
    }

    fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value {
            FieldValue::Files(files) if !files.is_empty() => {
                match self.check_selection(0, files) {
                    Ok(()) => ValidationResult::valid(value.to_json()),
                    Err(err) => ValidationResult::invalid(err, Value::Null),
                }
            }
            // Already-persisted media references pass through untouched.
            FieldValue::Json(reference) if !reference.is_null() => {
                ValidationResult::valid(reference.clone())
            }
            FieldValue::Text(path) if !path.trim().is_empty() => {
                ValidationResult::valid(Value::String(path.clone()))
            }
            FieldValue::Number(_) | FieldValue::Bool(_) => ValidationResult::invalid(
                FieldError::validation(&self.pointer, "expected a file"),
                Value::Null,
            ),
            _ => match required_error(&self.pointer, self.required) {
                Some(err) => ValidationResult::invalid(err, Value::Null),
                None => ValidationResult::valid(Value::Null),
            },
        }
    }
}

/// Revocable handle used to render a file that has not been uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host facility that mints and releases preview URLs.
pub trait PreviewUrls: fmt::Debug {
    fn create(&self, file: &UploadCandidate) -> PreviewUrl;
    fn revoke(&self, url: &PreviewUrl);
}

impl<P: PreviewUrls + ?Sized> PreviewUrls for Rc<P> {
    fn create(&self, file: &UploadCandidate) -> PreviewUrl {
        (**self).create(file)
    }

    fn revoke(&self, url: &PreviewUrl) {
        (**self).revoke(url)
    }
}

/// In-process registry issuing `blob:` style handles and tracking which are live.
#[derive(Debug, Default)]
pub struct BlobUrlRegistry {
    next_id: Cell<u64>,
    live: RefCell<HashSet<String>>,
}

impl BlobUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_live(&self, url: &PreviewUrl) -> bool {
        self.live.borrow().contains(url.as_str())
    }
}

impl PreviewUrls for BlobUrlRegistry {
    fn create(&self, file: &UploadCandidate) -> PreviewUrl {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let url = format!("blob:fieldkit/{id}/{}", file.name);
        self.live.borrow_mut().insert(url.clone());
        PreviewUrl(url)
    }

    fn revoke(&self, url: &PreviewUrl) {
        self.live.borrow_mut().remove(url.as_str());
    }
}

#[derive(Debug)]
struct UploadEntry {
    file: UploadCandidate,
    preview: PreviewUrl,
}

/// Files held by an upload control together with their previews. Every
/// preview is revoked when its file is replaced, removed, or the field dropped.
#[derive(Debug)]
pub struct UploadField<P: PreviewUrls> {
    validator: UploadValidator,
    previews: P,
    entries: Vec<UploadEntry>,
    error: Option<FieldError>,
}

impl<P: PreviewUrls> UploadField<P> {
    pub fn new(config: &FieldConfig, previews: P) -> Self {
        Self {
            validator: UploadValidator::new(config),
            previews,
            entries: Vec::new(),
            error: None,
        }
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    pub fn error(&self) -> Option<&FieldError> {
        self.error.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &UploadCandidate> {
        self.entries.iter().map(|entry| &entry.file)
    }

    pub fn preview_urls(&self) -> impl Iterator<Item = &PreviewUrl> {
        self.entries.iter().map(|entry| &entry.preview)
    }

    pub fn value(&self) -> FieldValue {
        if self.entries.is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Files(self.files().cloned().collect())
        }
    }

    /// Accept a picker selection. On rejection nothing changes and the error is kept.
    pub fn select(&mut self, files: Vec<UploadCandidate>) -> Result<FieldValue, FieldError> {
        if files.is_empty() {
            return Ok(self.value());
        }
        let existing = if self.validator.is_multiple() {
            self.entries.len()
        } else {
            0
        };
        if let Err(err) = self.validator.check_selection(existing, &files) {
            self.error = Some(err.clone());
            return Err(err);
        }

        if !self.validator.is_multiple() {
            self.release_all();
        }
        for file in files {
            let preview = self.previews.create(&file);
            self.entries.push(UploadEntry { file, preview });
        }
        self.error = None;
        Ok(self.value())
    }

    pub fn remove(&mut self, index: usize) -> Option<FieldValue> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        self.previews.revoke(&entry.preview);
        self.error = None;
        Some(self.value())
    }

    pub fn clear(&mut self) -> FieldValue {
        self.release_all();
        self.error = None;
        FieldValue::Empty
    }

    fn release_all(&mut self) {
        for entry in self.entries.drain(..) {
            self.previews.revoke(&entry.preview);
        }
    }
}

impl<P: PreviewUrls> Drop for UploadField<P> {
    fn drop(&mut self) {
        self.release_all();
    }
}
