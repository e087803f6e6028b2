#![forbid(unsafe_code)]

//! Core of the helpdesk chat launcher.
//!
//! The launcher is a floating trigger button plus a container holding the
//! embedded chat frame. Everything in this crate is host-agnostic: the page
//! is reached through the [`dom::HostDocument`] trait, so the same code runs
//! against a real browser document (see `helpdesk-web`) and against the
//! in-memory [`dom::VirtualDocument`] used by the tests.
//!
//! Layering, leaf first:
//! - [`config`]: merges host overrides with defaults into an immutable snapshot,
//! - [`mount`] / [`markup`]: idempotent injection of the widget tree and styles,
//! - [`state`]: the closed/open/maximized machine and its presentation,
//! - [`frame`]: frame URL, load policy and the frame-to-launcher channel,
//! - [`controller`] / [`api`]: the single owner of all of the above and the
//!   thin façade the host page talks to.

pub mod api;
pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod frame;
pub mod input;
pub mod logging;
pub mod markup;
pub mod mount;
pub mod state;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, trace, warn};

pub use api::HelpdeskWidget;
pub use config::{Position, Theme, WidgetConfig};
pub use controller::WidgetController;
pub use dom::{HostDocument, NodeSpec, Tag, VirtualDocument};
pub use error::{WidgetError, WidgetResult};
pub use frame::{FrameBridge, FramePort, FrameSignal};
pub use input::{HostInput, KeyCode};
pub use mount::{ElementIds, WidgetInstance};
pub use state::{Command, Effects, Phase, Presentation, Transition, WidgetState};
