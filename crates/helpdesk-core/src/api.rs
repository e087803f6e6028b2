#![forbid(unsafe_code)]

//! Host-facing façade.
//!
//! [`HelpdeskWidget`] is the only surface the host page talks to. It wraps a
//! [`WidgetController`] and never propagates errors: a failed operation is
//! logged at `warn` and the call returns the unchanged state.
//!
//! # Example
//!
//! ```
//! use helpdesk_core::{HelpdeskWidget, VirtualDocument};
//! use serde_json::json;
//!
//! let mut widget = HelpdeskWidget::init(
//!     VirtualDocument::new(),
//!     "https://shop.test",
//!     Some(json!({ "apiUrl": "https://x.test" })),
//! );
//! widget.open();
//! widget.maximize();
//! assert!(widget.is_maximized());
//! widget.close();
//! assert!(!widget.is_open());
//! ```

use serde_json::Value;

use crate::config::WidgetConfig;
use crate::controller::WidgetController;
use crate::dom::HostDocument;
use crate::error::WidgetResult;
use crate::frame::FramePort;
use crate::input::HostInput;
use crate::mount::ElementIds;
use crate::state::{Command, WidgetState};

/// Public launcher API.
#[derive(Debug)]
pub struct HelpdeskWidget<D: HostDocument> {
    controller: WidgetController<D>,
}

impl<D: HostDocument> HelpdeskWidget<D> {
    /// Resolve `overrides` against defaults for a page served from `origin`
    /// and mount with the default element ids.
    #[must_use]
    pub fn init(doc: D, origin: &str, overrides: Option<Value>) -> Self {
        Self::init_with_ids(doc, origin, overrides, ElementIds::default())
    }

    /// Like [`init`](Self::init), with a custom id prefix for running several
    /// launchers on one page.
    #[must_use]
    pub fn init_with_ids(doc: D, origin: &str, overrides: Option<Value>, ids: ElementIds) -> Self {
        let mut controller = WidgetController::new(doc, WidgetConfig::defaults(origin), ids);
        let result = controller.init(overrides);
        log_failure("init", result);
        Self { controller }
    }

    pub fn toggle(&mut self) -> WidgetState {
        self.run(Command::Toggle)
    }

    pub fn open(&mut self) -> WidgetState {
        self.run(Command::Open)
    }

    pub fn close(&mut self) -> WidgetState {
        self.run(Command::Close)
    }

    /// Toggle between maximized and restored. No-op while closed.
    pub fn maximize(&mut self) -> WidgetState {
        self.run(Command::ToggleMaximize)
    }

    /// Feed a host input (click or key) to the launcher.
    pub fn handle_input(&mut self, input: &HostInput) -> WidgetState {
        let result = self.controller.handle_input(input);
        log_failure("input", result);
        self.controller.state()
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.controller.state().open
    }

    #[must_use]
    pub const fn is_maximized(&self) -> bool {
        self.controller.state().maximized
    }

    #[must_use]
    pub const fn state(&self) -> WidgetState {
        self.controller.state()
    }

    /// Resolved configuration snapshot.
    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        self.controller.config()
    }

    /// Rebuild the launcher, optionally with new overrides. Returns whether
    /// the new instance mounted.
    pub fn reinit(&mut self, overrides: Option<Value>) -> bool {
        let result = self.controller.reinit(overrides);
        log_failure("reinit", result)
    }

    /// Remove the launcher from the page.
    pub fn destroy(&mut self) {
        self.controller.teardown();
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.controller.instance().is_some()
    }

    /// Port the chat frame publishes its load notification through.
    #[must_use]
    pub fn frame_port(&self) -> FramePort {
        self.controller.frame_port()
    }

    /// Apply queued frame notifications.
    pub fn pump_frame_signals(&mut self) -> usize {
        self.controller.pump_frame_signals()
    }

    /// Direct load notification from the frame.
    pub fn frame_loaded(&mut self) -> bool {
        let result = self.controller.frame_loaded();
        let hidden = matches!(result, Ok(true));
        log_failure("frame_loaded", result);
        hidden
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.controller.is_loaded()
    }

    /// Element ids of this launcher, for the adapter that wires DOM listeners.
    #[must_use]
    pub fn element_ids(&self) -> &ElementIds {
        self.controller.ids()
    }

    #[must_use]
    pub fn document(&self) -> &D {
        self.controller.document()
    }

    fn run(&mut self, command: Command) -> WidgetState {
        let result = self.controller.dispatch(command);
        log_failure(command.name(), result);
        self.controller.state()
    }
}

/// Log `result` if it failed. Returns whether it succeeded.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn log_failure<T>(operation: &'static str, result: WidgetResult<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(err) => {
            crate::warn!(
                target: "helpdesk_core::api",
                operation,
                error = %err,
                "launcher operation aborted"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::VirtualDocument;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn aborted_operations_are_logged() {
        let mut widget = HelpdeskWidget::init(VirtualDocument::new(), "https://x.test", None);
        widget.destroy();
        assert_eq!(widget.open(), WidgetState::default());
        assert!(logs_contain("launcher operation aborted"));
        assert!(logs_contain("widget is not mounted"));
    }

    #[test]
    #[traced_test]
    fn no_op_commands_are_not_logged() {
        let mut widget = HelpdeskWidget::init(VirtualDocument::new(), "https://x.test", None);
        widget.destroy();
        assert_eq!(widget.maximize(), WidgetState::default());
        assert!(!logs_contain("launcher operation aborted"));
    }
}
