use serde_json::Value;

use super::error::FieldError;
use super::state::FormState;

#[derive(Debug)]
pub enum FormOutcome {
    Valid(Value),
    Invalid {
        issues: usize,
        errors: Vec<FieldError>,
    },
}

impl FormOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, FormOutcome::Valid(_))
    }
}

/// Flush pending input on every field and collect the verdict for submission.
pub fn validate_form(form_state: &mut FormState) -> FormOutcome {
    let attributes = form_state
        .fields()
        .map(|field| field.attribute().to_string())
        .collect::<Vec<_>>();

    let mut errors = Vec::new();
    for attribute in &attributes {
        let Some(field) = form_state.field_mut(attribute) else {
            continue;
        };
        let error = field.flush().error.clone();
        // flushing a JSON editor may emit; fold that value in
        form_state.collect(attribute);
        if let Some(error) = error {
            errors.push(error);
        }
    }

    if errors.is_empty() {
        FormOutcome::Valid(form_state.values().clone())
    } else {
        FormOutcome::Invalid {
            issues: errors.len(),
            errors,
        }
    }
}
