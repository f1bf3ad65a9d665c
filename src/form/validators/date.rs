use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use tracing::{debug, warn};

use super::{FieldValidator, required_error};
use crate::domain::{FieldConfig, FieldKind, FieldValue};
use crate::form::error::{FieldError, ValidationResult};

const CONTROL_DATE: &str = "%Y-%m-%d";
const CONTROL_DATETIME: &str = "%Y-%m-%dT%H:%M";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMode {
    Date,
    DateTime,
}

impl DateMode {
    pub fn control_format(self) -> &'static str {
        match self {
            DateMode::Date => CONTROL_DATE,
            DateMode::DateTime => CONTROL_DATETIME,
        }
    }
}

/// What a date control shows for a given input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateDisplay {
    Empty,
    Formatted(String),
    /// Unparsable input, shown exactly as received.
    Raw(String),
}

impl DateDisplay {
    pub fn as_str(&self) -> &str {
        match self {
            DateDisplay::Empty => "",
            DateDisplay::Formatted(text) | DateDisplay::Raw(text) => text,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, DateDisplay::Raw(_))
    }
}

/// Parse ISO-8601 / RFC 3339 text, keeping the wall-clock time as written.
pub fn parse_date_input(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    let base = raw.strip_suffix(['Z', 'z']).unwrap_or(raw);
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(base, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(base, CONTROL_DATE)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Render `raw` for a native date/datetime control.
pub fn format_for_control(raw: &str, mode: DateMode) -> DateDisplay {
    format_with(raw, mode.control_format())
}

/// Render `raw` with a picker pattern such as `DD/MM/YYYY HH:mm`.
pub fn format_display(raw: &str, mode: DateMode, picker_format: Option<&str>) -> DateDisplay {
    match picker_format {
        Some(pattern) => format_with(raw, &translate_picker_format(pattern)),
        None => format_for_control(raw, mode),
    }
}

fn format_with(raw: &str, chrono_format: &str) -> DateDisplay {
    if raw.trim().is_empty() {
        return DateDisplay::Empty;
    }
    match parse_date_input(raw) {
        Some(parsed) => DateDisplay::Formatted(parsed.format(chrono_format).to_string()),
        None => DateDisplay::Raw(raw.to_string()),
    }
}

const PICKER_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", "%P"),
];

/// Translate picker tokens (`YYYY-MM-DD HH:mm`) into a chrono format string.
/// Text inside `[...]` is copied literally.
pub fn translate_picker_format(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('[') {
            let (literal, tail) = stripped.split_once(']').unwrap_or((stripped, ""));
            out.push_str(&literal.replace('%', "%%"));
            rest = tail;
            continue;
        }
        for (token, replacement) in PICKER_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            if ch == '%' {
                out.push_str("%%");
            } else {
                out.push(ch);
            }
        }
        rest = chars.as_str();
    }
    out
}

#[derive(Debug, Clone)]
pub struct DateValidator {
    pointer: String,
    mode: DateMode,
    required: bool,
    min: Option<NaiveDateTime>,
    max: Option<NaiveDateTime>,
}

impl DateValidator {
    pub fn new(config: &FieldConfig) -> Self {
        let pointer = format!("/{}", config.attribute());
        let mode = if config.kind == FieldKind::DateTime {
            DateMode::DateTime
        } else {
            DateMode::Date
        };
        let bound = |raw: &Option<String>, key: &str| {
            let raw = raw.as_deref()?;
            let parsed = parse_date_input(raw);
            if parsed.is_none() {
                warn!(pointer = %pointer, %key, value = raw, "ignoring unparsable date bound");
            }
            parsed
        };
        let min = bound(&config.constraints.min_date, "minDate");
        let max = bound(&config.constraints.max_date, "maxDate");
        Self {
            pointer,
            mode,
            required: config.constraints.required,
            min,
            max,
        }
    }

    pub fn mode(&self) -> DateMode {
        self.mode
    }

    fn compare_key(&self, value: NaiveDateTime) -> NaiveDateTime {
        match self.mode {
            DateMode::Date => value.date().and_time(NaiveTime::MIN),
            DateMode::DateTime => value,
        }
    }
}

impl FieldValidator for DateValidator {
    fn kind(&self) -> FieldKind {
        match self.mode {
            DateMode::Date => FieldKind::Date,
            DateMode::DateTime => FieldKind::DateTime,
        }
    }

    fn normalize(&self, value: &FieldValue) -> FieldValue {
        match value {
            FieldValue::Text(raw) => match format_for_control(raw, self.mode) {
                DateDisplay::Empty => FieldValue::Empty,
                DateDisplay::Formatted(text) => FieldValue::Text(text),
                DateDisplay::Raw(text) => FieldValue::Text(text),
            },
            other => other.clone(),
        }
    }

    fn validate(&self, value: &FieldValue) -> ValidationResult {
        let raw = match value {
            FieldValue::Empty => "",
            FieldValue::Text(text) => text.as_str(),
            other => {
                return ValidationResult::invalid(
                    FieldError::validation(&self.pointer, "expected a date string"),
                    other.to_json(),
                );
            }
        };

        if raw.trim().is_empty() {
            return match required_error(&self.pointer, self.required) {
                Some(err) => ValidationResult::invalid(err, Value::Null),
                None => ValidationResult::valid(Value::Null),
            };
        }

        let Some(parsed) = parse_date_input(raw) else {
            debug!(pointer = %self.pointer, value = raw, "unparsable date kept as typed");
            return ValidationResult::invalid(
                FieldError::parse(&self.pointer, format!("'{raw}' is not a valid date")),
                Value::String(raw.to_string()),
            );
        };

        let formatted = parsed.format(self.mode.control_format()).to_string();
        let key = self.compare_key(parsed);
        if let Some(min) = self.min
            && key < self.compare_key(min)
        {
            let bound = min.format(self.mode.control_format());
            return ValidationResult::invalid(
                FieldError::validation(&self.pointer, format!("Date must be on or after {bound}")),
                Value::String(formatted),
            );
        }
        if let Some(max) = self.max
            && key > self.compare_key(max)
        {
            let bound = max.format(self.mode.control_format());
            return ValidationResult::invalid(
                FieldError::validation(&self.pointer, format!("Date must be on or before {bound}")),
                Value::String(formatted),
            );
        }
        ValidationResult::valid(Value::String(formatted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Constraints;

    #[test]
    fn formats_iso_strings_for_controls() {
        let raw = "2024-01-15T10:30:45.123Z";
        assert_eq!(
            format_for_control(raw, DateMode::Date),
            DateDisplay::Formatted("2024-01-15".into())
        );
        assert_eq!(
            format_for_control(raw, DateMode::DateTime),
            DateDisplay::Formatted("2024-01-15T10:30".into())
        );
    }

    #[test]
    fn keeps_wall_clock_of_offset_timestamps() {
        assert_eq!(
            format_for_control("2024-03-01T23:15:00+05:00", DateMode::DateTime).as_str(),
            "2024-03-01T23:15"
        );
    }

    #[test]
    fn accepts_plain_dates_and_short_times() {
        assert_eq!(
            format_for_control("2024-02-29", DateMode::DateTime).as_str(),
            "2024-02-29T00:00"
        );
        assert_eq!(
            format_for_control("2024-02-29T08:05", DateMode::Date).as_str(),
            "2024-02-29"
        );
        assert_eq!(
            format_for_control("2024-02-29 08:05:59", DateMode::DateTime).as_str(),
            "2024-02-29T08:05"
        );
    }

    #[test]
    fn malformed_input_passes_through() {
        let display = format_for_control("next tuesday", DateMode::Date);
        assert_eq!(display, DateDisplay::Raw("next tuesday".into()));
        assert!(!display.is_valid());
        assert_eq!(format_for_control("2023-02-30", DateMode::Date).as_str(), "2023-02-30");
        assert_eq!(format_for_control("  ", DateMode::Date), DateDisplay::Empty);
    }

    #[test]
    fn translates_picker_tokens() {
        assert_eq!(translate_picker_format("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(translate_picker_format("DD/MM/YYYY HH:mm"), "%d/%m/%Y %H:%M");
        assert_eq!(translate_picker_format("D MMM YY, h:mm A"), "%-d %b %y, %-I:%M %p");
        assert_eq!(translate_picker_format("[Week of] YYYY"), "Week of %Y");
        assert_eq!(translate_picker_format("100%"), "100%%");
    }

    #[test]
    fn display_uses_picker_format() {
        let display = format_display(
            "2024-01-05T14:07:00Z",
            DateMode::DateTime,
            Some("DD.MM.YYYY HH:mm"),
        );
        assert_eq!(display.as_str(), "05.01.2024 14:07");
        assert_eq!(
            format_display("2024-01-05", DateMode::Date, None).as_str(),
            "2024-01-05"
        );
    }

    #[test]
    fn validator_flags_unparsable_but_keeps_text() {
        let validator = DateValidator::new(&FieldConfig::new("due", FieldKind::Date));
        let result = validator.validate(&FieldValue::text("31/12/2024"));
        assert!(!result.is_valid);
        assert_eq!(result.normalized, Value::String("31/12/2024".into()));
        assert!(matches!(result.error, Some(FieldError::Parse { .. })));
    }

    #[test]
    fn validator_enforces_bounds() {
        let config = FieldConfig::new("due", FieldKind::Date).with_constraints(Constraints {
            min_date: Some("2024-01-01".into()),
            max_date: Some("2024-12-31T23:59:00Z".into()),
            ..Default::default()
        });
        let validator = DateValidator::new(&config);
        assert!(validator.validate(&FieldValue::text("2024-06-01")).is_valid);
        assert!(validator.validate(&FieldValue::text("2024-12-31")).is_valid);
        let early = validator.validate(&FieldValue::text("2023-12-31"));
        assert_eq!(early.error_message(), Some("Date must be on or after 2024-01-01"));
        assert!(!validator.validate(&FieldValue::text("2025-01-01")).is_valid);
    }

    #[test]
    fn datetime_validator_emits_minute_precision() {
        let validator = DateValidator::new(&FieldConfig::new("at", FieldKind::DateTime));
        let result = validator.validate(&FieldValue::text("2024-05-06T07:08:09Z"));
        assert_eq!(result.normalized, Value::String("2024-05-06T07:08".into()));
    }
}
