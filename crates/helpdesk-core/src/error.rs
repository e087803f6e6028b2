#![forbid(unsafe_code)]

//! Error type shared by every launcher operation.
//!
//! Errors are always local: an operation that fails leaves the widget state
//! as it was, and the public façade logs instead of propagating.

use std::fmt;

/// Errors raised by launcher operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    /// An element the operation needs is not present in the document.
    MissingElement {
        /// DOM id that was looked up.
        id: String,
    },
    /// The operation requires a mounted widget and none is mounted.
    NotMounted,
    /// The host environment rejected a document call.
    Host(String),
}

impl WidgetError {
    pub(crate) fn missing(id: &str) -> Self {
        Self::MissingElement { id: id.to_owned() }
    }
}

impl fmt::Display for WidgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingElement { id } => write!(f, "missing element: #{id}"),
            Self::NotMounted => write!(f, "widget is not mounted"),
            Self::Host(msg) => write!(f, "host document error: {msg}"),
        }
    }
}

impl std::error::Error for WidgetError {}

/// Result type for launcher operations.
pub type WidgetResult<T> = Result<T, WidgetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_missing_id() {
        let err = WidgetError::missing("helpdeskTrigger");
        assert_eq!(err.to_string(), "missing element: #helpdeskTrigger");
    }

    #[test]
    fn host_errors_keep_their_message() {
        let err = WidgetError::Host("appendChild rejected".into());
        assert_eq!(err.to_string(), "host document error: appendChild rejected");
    }
}
