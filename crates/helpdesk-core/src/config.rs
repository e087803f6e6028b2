#![forbid(unsafe_code)]

//! Launcher configuration.
//!
//! The host page may define a global configuration object before the launcher
//! script runs. [`WidgetConfig::resolve`] merges that object over a default
//! record field by field and produces an immutable snapshot.
//!
//! # Degradation rules
//!
//! | Input | Behavior |
//! |-------|----------|
//! | field missing or `null` | default kept |
//! | field with the wrong JSON type | default rendered, `warn` logged |
//! | unrecognized `position` / `theme` string | default variant rendered, `warn` logged |
//! | unknown key | kept verbatim in [`WidgetConfig::extra`] |
//! | overrides not a JSON object | ignored as a whole |
//!
//! Resolution never fails. Color strings are passed through untouched, so a
//! malformed color shows up as a cosmetic glitch rather than an error.
//!
//! The accessors return what the launcher renders with. The host-facing
//! record from [`WidgetConfig::to_json`] reports every non-null value the host
//! supplied exactly as given, malformed ones included.

use serde::Serialize;
use serde_json::{Map, Value};

/// Default trigger gradient start color.
pub const DEFAULT_PRIMARY_COLOR: &str = "#667eea";
/// Default trigger gradient end color.
pub const DEFAULT_SECONDARY_COLOR: &str = "#764ba2";

/// Screen corner the launcher is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// Bottom-right corner.
    #[default]
    BottomRight,
    /// Bottom-left corner.
    BottomLeft,
}

impl Position {
    /// Parse the host-facing name. Matching is exact.
    #[must_use]
    pub fn from_host_str(raw: &str) -> Option<Self> {
        match raw {
            "bottom-right" => Some(Self::BottomRight),
            "bottom-left" => Some(Self::BottomLeft),
            _ => None,
        }
    }

    /// CSS property used for the horizontal anchor (`left` or `right`).
    #[must_use]
    pub const fn anchor_side(self) -> &'static str {
        match self {
            Self::BottomRight => "right",
            Self::BottomLeft => "left",
        }
    }
}

/// Cosmetic color scheme for the chat container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Parse the host-facing name. Matching is exact.
    #[must_use]
    pub fn from_host_str(raw: &str) -> Option<Self> {
        match raw {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Background color of the chat container behind the frame.
    #[must_use]
    pub const fn surface_color(self) -> &'static str {
        match self {
            Self::Dark => "#121212",
            Self::Light => "#ffffff",
        }
    }
}

/// Resolved, read-only launcher configuration.
///
/// Serializes back to the host-facing camelCase record, including any unknown
/// keys the host supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    api_url: String,
    position: Position,
    theme: Theme,
    primary_color: String,
    secondary_color: String,
    lazy_load: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
    /// Raw host values for the fields above, reported back by `to_json`.
    #[serde(skip)]
    supplied: Map<String, Value>,
}

/// Host field names the resolver interprets.
const KNOWN_FIELDS: [&str; 6] = [
    "apiUrl",
    "position",
    "theme",
    "primaryColor",
    "secondaryColor",
    "lazyLoad",
];

impl WidgetConfig {
    /// Default record for a host page served from `origin`.
    #[must_use]
    pub fn defaults(origin: impl Into<String>) -> Self {
        Self {
            api_url: origin.into(),
            position: Position::default(),
            theme: Theme::default(),
            primary_color: DEFAULT_PRIMARY_COLOR.to_owned(),
            secondary_color: DEFAULT_SECONDARY_COLOR.to_owned(),
            lazy_load: false,
            extra: Map::new(),
            supplied: Map::new(),
        }
    }

    /// Merge `overrides` over `defaults`, field by field.
    ///
    /// `defaults` is not modified; the result is a fresh snapshot.
    #[must_use]
    pub fn resolve(defaults: &Self, overrides: Option<&Value>) -> Self {
        let mut resolved = defaults.clone();
        let Some(overrides) = overrides else {
            return resolved;
        };
        let Some(fields) = overrides.as_object() else {
            if !overrides.is_null() {
                crate::warn!(
                    target: "helpdesk_core::config",
                    "host configuration is not an object; using defaults"
                );
            }
            return resolved;
        };

        for (key, value) in fields {
            if value.is_null() {
                continue;
            }
            if KNOWN_FIELDS.contains(&key.as_str()) {
                resolved.supplied.insert(key.clone(), value.clone());
            }
            match key.as_str() {
                "apiUrl" => {
                    if let Some(url) = string_field(key, value) {
                        resolved.api_url = url;
                    }
                }
                "position" => {
                    if let Some(raw) = string_field(key, value) {
                        resolved.position = Position::from_host_str(&raw).unwrap_or_else(|| {
                            crate::warn!(
                                target: "helpdesk_core::config",
                                position = %raw,
                                "unknown position; using bottom-right"
                            );
                            Position::default()
                        });
                    }
                }
                "theme" => {
                    if let Some(raw) = string_field(key, value) {
                        resolved.theme = Theme::from_host_str(&raw).unwrap_or_else(|| {
                            crate::warn!(
                                target: "helpdesk_core::config",
                                theme = %raw,
                                "unknown theme; using dark"
                            );
                            Theme::default()
                        });
                    }
                }
                "primaryColor" => {
                    if let Some(color) = string_field(key, value) {
                        resolved.primary_color = color;
                    }
                }
                "secondaryColor" => {
                    if let Some(color) = string_field(key, value) {
                        resolved.secondary_color = color;
                    }
                }
                "lazyLoad" => match value.as_bool() {
                    Some(lazy) => resolved.lazy_load = lazy,
                    None => {
                        crate::warn!(
                            target: "helpdesk_core::config",
                            field = %key,
                            "expected a boolean; keeping default"
                        );
                    }
                },
                _ => {
                    resolved.extra.insert(key.clone(), value.clone());
                }
            }
        }
        resolved
    }

    /// Base origin the frame URL is built from.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub fn primary_color(&self) -> &str {
        &self.primary_color
    }

    #[must_use]
    pub fn secondary_color(&self) -> &str {
        &self.secondary_color
    }

    /// Whether the frame source is deferred until the widget first opens.
    #[must_use]
    pub const fn lazy_load(&self) -> bool {
        self.lazy_load
    }

    /// Host-supplied keys this launcher does not interpret.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Host-facing JSON record: the resolved fields, overlaid with the raw
    /// values the host supplied.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut record = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(fields) = &mut record {
            for (key, value) in &self.supplied {
                fields.insert(key.clone(), value.clone());
            }
        }
        record
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn string_field(key: &str, value: &Value) -> Option<String> {
    match value.as_str() {
        Some(s) => Some(s.to_owned()),
        None => {
            crate::warn!(
                target: "helpdesk_core::config",
                field = %key,
                "expected a string; keeping default"
            );
            None
        }
    }
}
