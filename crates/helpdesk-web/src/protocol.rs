#![forbid(unsafe_code)]

//! Page-facing formats: the global configuration object, the frame's
//! `postMessage` notification and the state record returned to JS.

use helpdesk_core::WidgetState;
use helpdesk_core::frame::{CHAT_PATH, carries_marker};
use serde_json::{Value, json};

/// Global the host page sets before the script loads, and which the launcher
/// replaces with its public API.
pub const GLOBAL_NAME: &str = "HelpdeskWidget";

/// `type` field of the message the chat frame posts once it has loaded.
pub const FRAME_LOADED_TYPE: &str = "helpdesk:frame-loaded";

/// Message the chat page posts to its parent.
#[must_use]
pub fn frame_loaded_message() -> Value {
    json!({ "type": FRAME_LOADED_TYPE })
}

/// Whether a JSON-encoded message payload is the frame's load notification.
#[must_use]
pub fn is_frame_loaded(raw: &str) -> bool {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|data| data.get("type")?.as_str().map(|kind| kind == FRAME_LOADED_TYPE))
        .unwrap_or(false)
}

/// Parse the JSON-encoded host configuration object.
///
/// `null` and unparseable input mean "no overrides". Non-object values are
/// passed through; the resolver ignores them with a warning.
#[must_use]
pub fn parse_overrides(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                target: "helpdesk_web::protocol",
                error = %err,
                "host configuration is not valid JSON, using defaults"
            );
            None
        }
    }
}

/// `{open, maximized}` record handed back to JS callers.
#[must_use]
pub fn state_record(state: WidgetState) -> Value {
    json!({ "open": state.open, "maximized": state.maximized })
}

/// Whether a page at `href` is the chat application running inside the
/// launcher, in which case the launcher must not boot itself.
#[must_use]
pub fn is_embedded_page(href: &str) -> bool {
    let without_fragment = href.split('#').next().unwrap_or(href);
    let path = without_fragment.split('?').next().unwrap_or(without_fragment);
    path.trim_end_matches('/').ends_with(CHAT_PATH) && carries_marker(href)
}

/// How a `pagehide` leaves the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageHide {
    /// Page goes into the back/forward cache and may be shown again.
    Suspend,
    Unload,
}

impl PageHide {
    /// Classify by `PageTransitionEvent.persisted`.
    #[must_use]
    pub const fn from_persisted(persisted: bool) -> Self {
        if persisted { Self::Suspend } else { Self::Unload }
    }

    /// Only a real unload removes the launcher.
    #[must_use]
    pub const fn tears_down(self) -> bool {
        matches!(self, Self::Unload)
    }
}
