use std::{rc::Rc, time::Instant};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::field::{Field, FieldEvent};
use super::validators::{BlobUrlRegistry, PreviewUrls};
use crate::domain::{FieldConfig, FieldKind, FieldValue};
use crate::options::FieldOptions;

/// Every field of one form, keyed by attribute in declaration order, plus the
/// values the fields have emitted so far.
#[derive(Debug)]
pub struct FormState {
    fields: IndexMap<String, Field>,
    values: Value,
    focus_index: Option<usize>,
    events: Vec<(String, FieldEvent)>,
}

impl FormState {
    pub fn new(configs: Vec<FieldConfig>, options: &FieldOptions) -> Self {
        Self::with_previews(configs, options, Rc::new(BlobUrlRegistry::new()))
    }

    /// All upload fields share `previews`.
    pub fn with_previews(
        configs: Vec<FieldConfig>,
        options: &FieldOptions,
        previews: Rc<dyn PreviewUrls>,
    ) -> Self {
        let mut fields = IndexMap::with_capacity(configs.len());
        for config in configs {
            let attribute = config.attribute().to_string();
            let field = Field::with_previews(config, options, Rc::clone(&previews));
            if fields.insert(attribute.clone(), field).is_some() {
                warn!(%attribute, "duplicate field attribute; keeping the last definition");
            }
        }
        Self {
            fields,
            values: Value::Object(Map::new()),
            focus_index: None,
            events: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, attribute: &str) -> Option<&Field> {
        self.fields.get(attribute)
    }

    pub fn field_mut(&mut self, attribute: &str) -> Option<&mut Field> {
        self.fields.get_mut(attribute)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Collected values as one object. Dotted attributes become nested objects.
    pub fn values(&self) -> &Value {
        &self.values
    }

    /// Load parent data into every field without emitting events.
    pub fn seed(&mut self, data: &Value) {
        for (attribute, field) in self.fields.iter_mut() {
            let path = split_path(attribute);
            if let Some(value) = value_at_path(data, &path) {
                field.seed(value);
                insert_path(&mut self.values, &path, value.clone());
            }
        }
    }

    /// Route input to a field. Returns `false` for unknown attributes or rejected values.
    pub fn input(&mut self, attribute: &str, value: FieldValue) -> bool {
        self.input_at(attribute, value, Instant::now())
    }

    pub fn input_at(&mut self, attribute: &str, value: FieldValue, now: Instant) -> bool {
        let Some(field) = self.fields.get_mut(attribute) else {
            warn!(%attribute, "input for unknown field");
            return false;
        };
        let source_text = value.as_text().map(str::to_string);
        let accepted = field.input_at(value, now);
        self.collect(attribute);
        if accepted && let Some(text) = source_text {
            self.sync_slugs(attribute, &text);
        }
        accepted
    }

    /// Advance debounce timers. Returns the attributes that emitted.
    pub fn poll(&mut self, now: Instant) -> Vec<String> {
        let fired = self
            .fields
            .iter_mut()
            .filter_map(|(attribute, field)| field.poll(now).then(|| attribute.clone()))
            .collect::<Vec<_>>();
        for attribute in &fired {
            self.collect(attribute);
        }
        fired
    }

    pub fn focus(&mut self, attribute: &str) -> bool {
        let Some(index) = self.fields.get_index_of(attribute) else {
            return false;
        };
        self.focus_at(index)
    }

    /// Move focus to the next focusable field, wrapping around.
    pub fn focus_next(&mut self) -> Option<&str> {
        self.step_focus(1)
    }

    pub fn focus_previous(&mut self) -> Option<&str> {
        self.step_focus(-1)
    }

    pub fn focused(&self) -> Option<&Field> {
        self.focus_index
            .and_then(|index| self.fields.get_index(index))
            .map(|(_, field)| field)
    }

    fn step_focus(&mut self, delta: i32) -> Option<&str> {
        let len = self.fields.len() as i32;
        if len == 0 {
            return None;
        }
        let start = match self.focus_index {
            Some(index) => index as i32,
            None if delta > 0 => -1,
            None => len,
        };
        for offset in 1..=len {
            let next = (((start + delta * offset) % len) + len) % len;
            if self.focus_at(next as usize) {
                return self
                    .fields
                    .get_index(next as usize)
                    .map(|(attribute, _)| attribute.as_str());
            }
        }
        None
    }

    fn focus_at(&mut self, index: usize) -> bool {
        if self.focus_index == Some(index) {
            return true;
        }
        let focusable = self
            .fields
            .get_index_mut(index)
            .is_some_and(|(_, field)| field.focus());
        if !focusable {
            return false;
        }
        if let Some(previous) = self.focus_index.replace(index)
            && let Some((_, field)) = self.fields.get_index_mut(previous)
        {
            field.blur();
            let attribute = field.attribute().to_string();
            self.collect(&attribute);
        }
        let attribute = self.fields[index].attribute().to_string();
        self.collect(&attribute);
        true
    }

    pub fn blur(&mut self) {
        if let Some(index) = self.focus_index.take()
            && let Some((attribute, field)) = self.fields.get_index_mut(index)
        {
            let attribute = attribute.clone();
            field.blur();
            self.collect(&attribute);
        }
    }

    /// Events collected from all fields since the last call, tagged by attribute.
    pub fn take_events(&mut self) -> Vec<(String, FieldEvent)> {
        std::mem::take(&mut self.events)
    }

    pub fn is_dirty(&self) -> bool {
        self.fields.values().any(Field::is_dirty)
    }

    pub fn error_count(&self) -> usize {
        self.fields.values().filter(|field| !field.is_valid()).count()
    }

    pub(crate) fn collect(&mut self, attribute: &str) {
        let Some(field) = self.fields.get_mut(attribute) else {
            return;
        };
        for event in field.drain_events() {
            if let FieldEvent::UpdateModelValue(value) = &event {
                insert_path(&mut self.values, &split_path(attribute), value.clone());
            }
            self.events.push((attribute.to_string(), event));
        }
    }

    fn sync_slugs(&mut self, source: &str, text: &str) {
        let targets = self
            .fields
            .values()
            .filter(|field| {
                field.kind() == FieldKind::Slug
                    && field.config().constraints.source.as_deref() == Some(source)
            })
            .map(|field| field.attribute().to_string())
            .collect::<Vec<_>>();
        for target in targets {
            let generated = self
                .fields
                .get_mut(&target)
                .is_some_and(|field| field.sync_slug_from(text));
            if generated {
                debug!(%source, %target, "generated slug from source");
                self.collect(&target);
            }
        }
    }
}

fn split_path(attribute: &str) -> Vec<String> {
    attribute.split('.').map(str::to_string).collect()
}

fn insert_path(root: &mut Value, path: &[String], value: Value) {
    if path.is_empty() {
        *root = value;
        return;
    }

    if !root.is_object() {
        *root = Value::Object(Map::new());
    }

    if let Value::Object(obj) = root {
        if path.len() == 1 {
            obj.insert(path[0].clone(), value);
            return;
        }

        let entry = obj
            .entry(path[0].clone())
            .or_insert_with(|| Value::Object(Map::new()));
        insert_path(entry, &path[1..], value);
    }
}

fn value_at_path<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        match current {
            Value::Object(map) => {
                current = map.get(segment)?;
            }
            _ => return None,
        }
    }
    Some(current)
}
