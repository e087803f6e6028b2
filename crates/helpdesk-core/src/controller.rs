#![forbid(unsafe_code)]

//! Single owner of a launcher instance.
//!
//! The controller holds the host document, the resolved configuration, the
//! mounted instance, the state machine and the frame bridge. Every mutation of
//! the `{open, maximized}` pair goes through [`WidgetController::dispatch`].
//!
//! # Atomicity
//!
//! A transition first checks that every element it will touch is present.
//! Only then are its effects applied and the new phase committed. A missing
//! element aborts the operation with [`WidgetError::MissingElement`] and the
//! document and phase are left as they were.

use serde_json::Value;

use crate::config::WidgetConfig;
use crate::dom::HostDocument;
use crate::error::{WidgetError, WidgetResult};
use crate::frame::{self, FrameBridge, FramePort};
use crate::input::HostInput;
use crate::markup::{ACTIVE_CLASS, MAXIMIZED_CLASS, SHOW_CLASS};
use crate::mount::{self, ElementIds, WidgetInstance};
use crate::state::{Command, Effects, Phase, Presentation, Transition, WidgetState, WidgetStateMachine};

/// Owner of one launcher instance bound to a host document.
#[derive(Debug)]
pub struct WidgetController<D: HostDocument> {
    doc: D,
    defaults: WidgetConfig,
    overrides: Option<Value>,
    config: WidgetConfig,
    ids: ElementIds,
    instance: Option<WidgetInstance>,
    machine: WidgetStateMachine,
    bridge: FrameBridge,
}

impl<D: HostDocument> WidgetController<D> {
    /// Create an unmounted controller. Call [`init`](Self::init) to mount.
    #[must_use]
    pub fn new(doc: D, defaults: WidgetConfig, ids: ElementIds) -> Self {
        Self {
            doc,
            config: defaults.clone(),
            defaults,
            overrides: None,
            ids,
            instance: None,
            machine: WidgetStateMachine::new(),
            bridge: FrameBridge::new(),
        }
    }

    /// Resolve `overrides` against the defaults and mount.
    pub fn init(&mut self, overrides: Option<Value>) -> WidgetResult<()> {
        self.overrides = overrides;
        self.rebuild()
    }

    /// Tear down and mount again from scratch, then return to `Closed`.
    ///
    /// `Some(overrides)` replaces the host overrides; `None` keeps the last
    /// ones. Either way a new configuration snapshot is resolved.
    pub fn reinit(&mut self, overrides: Option<Value>) -> WidgetResult<()> {
        if overrides.is_some() {
            self.overrides = overrides;
        }
        self.rebuild()
    }

    fn rebuild(&mut self) -> WidgetResult<()> {
        mount::unmount(&mut self.doc, &mut self.instance);
        self.machine.reset();
        self.bridge.attach();
        self.config = WidgetConfig::resolve(&self.defaults, self.overrides.as_ref());

        let src = (!self.config.lazy_load()).then(|| frame::frame_url(&self.config));
        let instance = mount::mount(&mut self.doc, &self.config, &self.ids, src.as_deref())?;
        self.instance = Some(instance);
        Ok(())
    }

    /// Remove the launcher from the document.
    ///
    /// Releases the scroll lock and invalidates outstanding frame ports.
    /// Returns `false` if nothing was mounted.
    pub fn teardown(&mut self) -> bool {
        let removed = mount::unmount(&mut self.doc, &mut self.instance);
        self.machine.reset();
        self.bridge.attach();
        removed
    }

    /// Apply `command`.
    ///
    /// No-op transitions succeed without touching the document, even when
    /// nothing is mounted.
    pub fn dispatch(&mut self, command: Command) -> WidgetResult<Transition> {
        let transition = self.machine.step(command);
        let effects = transition.effects();
        if effects.is_empty() {
            return Ok(transition);
        }

        let Some(instance) = self.instance.as_ref() else {
            return Err(WidgetError::NotMounted);
        };
        let ids = instance.ids();
        WidgetInstance::require(&self.doc, &required_ids(ids, &transition))?;

        if transition.opens() {
            self.bridge.ensure_loaded(&mut self.doc, ids, &self.config)?;
        }
        apply_presentation(
            &mut self.doc,
            ids,
            &Presentation::for_phase(transition.to()),
            effects,
        )?;
        self.machine.commit(&transition);
        Ok(transition)
    }

    /// Map a host input to a command and apply it.
    ///
    /// Returns `Ok(None)` when the input is not addressed to the launcher.
    pub fn handle_input(&mut self, input: &HostInput) -> WidgetResult<Option<Transition>> {
        match input.command(self.machine.phase()) {
            Some(command) => self.dispatch(command).map(Some),
            None => Ok(None),
        }
    }

    /// Set the frame source if it does not carry the embedded-mode marker.
    pub fn ensure_loaded(&mut self) -> WidgetResult<bool> {
        let Some(instance) = self.instance.as_ref() else {
            return Err(WidgetError::NotMounted);
        };
        self.bridge
            .ensure_loaded(&mut self.doc, instance.ids(), &self.config)
    }

    /// Publishing end for the currently mounted frame.
    #[must_use]
    pub fn frame_port(&self) -> FramePort {
        self.bridge.port()
    }

    /// Apply frame signals queued since the last call.
    pub fn pump_frame_signals(&mut self) -> usize {
        match self.instance.as_ref() {
            Some(instance) => self.bridge.pump(&mut self.doc, instance.ids()),
            None => 0,
        }
    }

    /// Handle a load notification delivered directly rather than through a
    /// [`FramePort`].
    pub fn frame_loaded(&mut self) -> WidgetResult<bool> {
        let Some(instance) = self.instance.as_ref() else {
            return Err(WidgetError::NotMounted);
        };
        self.bridge.on_frame_loaded(&mut self.doc, instance.ids())
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.machine.phase()
    }

    #[must_use]
    pub const fn state(&self) -> WidgetState {
        self.machine.state()
    }

    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    #[must_use]
    pub fn ids(&self) -> &ElementIds {
        &self.ids
    }

    #[must_use]
    pub fn instance(&self) -> Option<&WidgetInstance> {
        self.instance.as_ref()
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.bridge.is_loaded()
    }

    #[must_use]
    pub fn document(&self) -> &D {
        &self.doc
    }

    /// Mutable access to the host document, for hosts that edit the page
    /// around the launcher.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }
}

fn required_ids<'a>(ids: &'a ElementIds, transition: &Transition) -> Vec<&'a str> {
    let effects = transition.effects();
    let mut required = Vec::with_capacity(5);
    if effects.contains(Effects::CONTAINER) {
        required.push(ids.container.as_str());
        required.push(ids.maximize.as_str());
    }
    if effects.contains(Effects::TRIGGER) {
        required.push(ids.trigger.as_str());
    }
    if transition.opens() {
        required.push(ids.frame.as_str());
        required.push(ids.loading.as_str());
    }
    required
}

fn apply_presentation<D: HostDocument + ?Sized>(
    doc: &mut D,
    ids: &ElementIds,
    presentation: &Presentation,
    effects: Effects,
) -> WidgetResult<()> {
    if effects.contains(Effects::CONTAINER) {
        doc.set_class(&ids.container, SHOW_CLASS, presentation.container_shown)?;
        doc.set_class(
            &ids.container,
            MAXIMIZED_CLASS,
            presentation.container_maximized,
        )?;
        doc.set_text(&ids.maximize, presentation.maximize_icon)?;
        doc.set_attribute(&ids.maximize, "title", presentation.maximize_title)?;
    }
    if effects.contains(Effects::TRIGGER) {
        doc.set_class(&ids.trigger, ACTIVE_CLASS, presentation.trigger_active)?;
        doc.set_text(&ids.trigger, presentation.trigger_icon)?;
    }
    if effects.contains(Effects::SCROLL_LOCK) {
        if presentation.scroll_locked {
            mount::acquire_scroll_lock(doc, &ids.root);
        } else {
            mount::release_scroll_lock(doc, &ids.root);
        }
    }
    Ok(())
}
