#![forbid(unsafe_code)]

//! Launcher state machine.
//!
//! ```text
//!              toggle / open                 toggle_maximize
//!   ┌────────┐ ─────────────▶ ┌──────┐ ─────────────────▶ ┌───────────────┐
//!   │ Closed │                │ Open │                     │ OpenMaximized │
//!   └────────┘ ◀───────────── └──────┘ ◀───────────────── └───────────────┘
//!       ▲       toggle/close/escape       toggle_maximize/escape    │
//!       └───────────────────────────────────────────────────────────┘
//!                               toggle / close
//! ```
//!
//! The machine is pure: [`WidgetStateMachine::step`] computes a
//! [`Transition`] without changing anything, and [`WidgetStateMachine::commit`]
//! adopts it once the caller has applied the presentation. Transitions can only
//! be obtained from `step`, so the phase cannot be set to anything the rules do
//! not allow.

use bitflags::bitflags;

/// Visible launcher phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Closed,
    Open,
    OpenMaximized,
}

impl Phase {
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::OpenMaximized)
    }

    #[must_use]
    pub const fn is_maximized(self) -> bool {
        matches!(self, Self::OpenMaximized)
    }

    #[must_use]
    pub const fn state(self) -> WidgetState {
        WidgetState {
            open: self.is_open(),
            maximized: self.is_maximized(),
        }
    }
}

/// Host-visible `{open, maximized}` pair. `maximized` implies `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WidgetState {
    pub open: bool,
    pub maximized: bool,
}

/// Operations the launcher accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Toggle,
    Open,
    Close,
    ToggleMaximize,
    /// Keyboard cancel: demotes a maximized widget, closes an open one.
    Escape,
}

impl Command {
    /// Host-facing operation name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Open => "open",
            Self::Close => "close",
            Self::ToggleMaximize => "maximize",
            Self::Escape => "escape",
        }
    }
}

bitflags! {
    /// Observable effects a transition must apply.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Effects: u8 {
        /// Container classes and its maximize control.
        const CONTAINER   = 0b001;
        /// Trigger icon and active color.
        const TRIGGER     = 0b010;
        /// `body` overflow lock.
        const SCROLL_LOCK = 0b100;
    }
}

/// Result of applying a [`Command`] to a [`Phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    command: Command,
    from: Phase,
    to: Phase,
    effects: Effects,
}

impl Transition {
    #[must_use]
    pub const fn command(&self) -> Command {
        self.command
    }

    #[must_use]
    pub const fn from(&self) -> Phase {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> Phase {
        self.to
    }

    #[must_use]
    pub const fn effects(&self) -> Effects {
        self.effects
    }

    /// Whether the phase changes.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    /// Whether this transition makes the widget visible.
    #[must_use]
    pub const fn opens(&self) -> bool {
        !self.from.is_open() && self.to.is_open()
    }
}

/// Target presentation for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub container_shown: bool,
    pub container_maximized: bool,
    pub trigger_active: bool,
    pub trigger_icon: &'static str,
    pub maximize_icon: &'static str,
    pub maximize_title: &'static str,
    pub scroll_locked: bool,
}

impl Presentation {
    pub const CLOSED: Self = Self {
        container_shown: false,
        container_maximized: false,
        trigger_active: false,
        trigger_icon: "💬",
        maximize_icon: "⛶",
        maximize_title: "Maximize",
        scroll_locked: false,
    };

    pub const OPEN: Self = Self {
        container_shown: true,
        trigger_active: true,
        trigger_icon: "×",
        ..Self::CLOSED
    };

    pub const MAXIMIZED: Self = Self {
        container_maximized: true,
        maximize_icon: "⮌",
        maximize_title: "Restore",
        scroll_locked: true,
        ..Self::OPEN
    };

    #[must_use]
    pub const fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Closed => Self::CLOSED,
            Phase::Open => Self::OPEN,
            Phase::OpenMaximized => Self::MAXIMIZED,
        }
    }
}

/// Owner of the launcher phase.
#[derive(Debug, Clone, Default)]
pub struct WidgetStateMachine {
    phase: Phase,
}

impl WidgetStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn state(&self) -> WidgetState {
        self.phase.state()
    }

    /// Compute the transition for `command` from the current phase.
    #[must_use]
    pub fn step(&self, command: Command) -> Transition {
        use Phase::{Closed, Open, OpenMaximized};

        let from = self.phase;
        let (to, effects) = match (command, from) {
            (Command::Toggle, Closed) | (Command::Open, Closed) => (Open, Effects::all()),
            (Command::Open, Open | OpenMaximized) => (from, Effects::empty()),
            (Command::Toggle, Open | OpenMaximized) => (Closed, Effects::all()),
            // Close re-applies the closed presentation even when already
            // closed, so classes edited from outside are reset.
            (Command::Close, _) => (Closed, Effects::all()),
            (Command::ToggleMaximize, Closed) => (Closed, Effects::empty()),
            (Command::ToggleMaximize, Open) => (OpenMaximized, Effects::all()),
            (Command::ToggleMaximize, OpenMaximized) => (Open, Effects::all()),
            (Command::Escape, Closed) => (Closed, Effects::empty()),
            (Command::Escape, Open) => (Closed, Effects::all()),
            (Command::Escape, OpenMaximized) => (Open, Effects::all()),
        };
        Transition {
            command,
            from,
            to,
            effects,
        }
    }

    /// Adopt a transition computed by [`step`](Self::step).
    ///
    /// A transition computed from a different phase is stale and ignored.
    /// Returns whether it was adopted.
    pub fn commit(&mut self, transition: &Transition) -> bool {
        if transition.from != self.phase {
            return false;
        }
        crate::debug!(
            target: "helpdesk_core::state",
            command = ?transition.command,
            from = ?transition.from,
            to = ?transition.to,
            "state transition"
        );
        self.phase = transition.to;
        true
    }

    /// Return to `Closed` without emitting effects. Used when the instance is
    /// rebuilt from scratch.
    pub fn reset(&mut self) {
        self.phase = Phase::Closed;
    }
}
