use std::{borrow::Cow, time::Duration};

/// Colour scheme the host is rendering with. Passed in explicitly; fields never
/// read it from shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn is_dark(self) -> bool {
        matches!(self, Theme::Dark)
    }
}

/// Runtime knobs shared by every field in a form.
#[derive(Debug, Clone)]
pub struct FieldOptions {
    /// Quiet period before JSON text is re-parsed.
    pub debounce: Duration,
    pub theme: Theme,
    /// Scheme prepended by URL fields with `normalizeProtocol`.
    pub default_protocol: Cow<'static, str>,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            theme: Theme::Light,
            default_protocol: Cow::Borrowed("https"),
        }
    }
}

impl FieldOptions {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_default_protocol(mut self, protocol: impl Into<Cow<'static, str>>) -> Self {
        let protocol = protocol.into();
        self.default_protocol = match protocol.strip_suffix("://") {
            Some(stripped) => Cow::Owned(stripped.to_string()),
            None => protocol,
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_field_behaviour() {
        let options = FieldOptions::default();
        assert_eq!(options.debounce, Duration::from_millis(300));
        assert_eq!(options.default_protocol, "https");
        assert!(!options.theme.is_dark());
    }

    #[test]
    fn protocol_separator_is_stripped() {
        let options = FieldOptions::default().with_default_protocol("http://");
        assert_eq!(options.default_protocol, "http");
    }
}
