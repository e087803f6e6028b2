#![forbid(unsafe_code)]

//! Host input normalization.
//!
//! The web layer turns DOM events into [`HostInput`] values; the controller
//! maps them onto [`Command`]s. Events are processed in delivery order, one at
//! a time.

use crate::state::{Command, Phase};

/// Normalized keyboard key. Only the keys the launcher reacts to are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Escape,
    /// Any key the launcher ignores.
    Other,
}

impl KeyCode {
    /// Normalize a DOM `KeyboardEvent.key` value.
    ///
    /// `"Esc"` is accepted for older engines.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Self::Escape,
            _ => Self::Other,
        }
    }
}

/// Input delivered by the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostInput {
    TriggerClicked,
    CloseClicked,
    MaximizeClicked,
    KeyDown(KeyCode),
}

impl HostInput {
    /// Command this input asks for while the launcher is in `phase`, or
    /// `None` if the input is not for us.
    ///
    /// Escape is only claimed while the widget is visible so the host page
    /// keeps its own Escape handling when the launcher is closed.
    #[must_use]
    pub fn command(&self, phase: Phase) -> Option<Command> {
        match self {
            Self::TriggerClicked => Some(Command::Toggle),
            Self::CloseClicked => Some(Command::Close),
            Self::MaximizeClicked => Some(Command::ToggleMaximize),
            Self::KeyDown(KeyCode::Escape) if phase.is_open() => Some(Command::Escape),
            Self::KeyDown(_) => None,
        }
    }
}
