#![forbid(unsafe_code)]

//! Bridge between the launcher and the embedded chat frame.
//!
//! The chat application lives at `{apiUrl}/chat?widget=true`. It reports that
//! it finished loading by publishing a [`FrameSignal`] through a [`FramePort`].
//! Ports are bound to one frame generation: every mount attaches a new
//! generation, and signals published by an older frame are dropped when the
//! bridge drains its channel.
//!
//! There is no load timeout. If the frame never signals, the loading
//! indicator stays up and [`FrameBridge::is_loaded`] stays `false`.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::config::WidgetConfig;
use crate::dom::HostDocument;
use crate::error::WidgetResult;
use crate::mount::{ElementIds, WidgetInstance};

/// Path of the chat application under `apiUrl`.
pub const CHAT_PATH: &str = "/chat";
/// Query pair telling the chat application it runs inside the launcher.
pub const WIDGET_MARKER: &str = "widget=true";

/// Frame URL for `config`.
///
/// Recomputed on every call; a trailing `/` on `apiUrl` is not doubled.
#[must_use]
pub fn frame_url(config: &WidgetConfig) -> String {
    format!(
        "{}{CHAT_PATH}?{WIDGET_MARKER}",
        config.api_url().trim_end_matches('/')
    )
}

/// Whether `src` already carries the embedded-mode marker in its query.
#[must_use]
pub fn carries_marker(src: &str) -> bool {
    let Some((_, rest)) = src.split_once('?') else {
        return false;
    };
    let query = rest.split('#').next().unwrap_or_default();
    query.split('&').any(|pair| pair == WIDGET_MARKER)
}

/// Identity of one mounted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

/// Notifications the frame can send to the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSignal {
    /// Frame content finished loading.
    Loaded,
}

/// Publishing end handed to the frame side.
#[derive(Debug, Clone)]
pub struct FramePort {
    frame: FrameId,
    tx: Sender<(FrameId, FrameSignal)>,
}

impl FramePort {
    #[must_use]
    pub const fn frame(&self) -> FrameId {
        self.frame
    }

    /// Publish `signal`. Returns `false` if the launcher is gone.
    pub fn publish(&self, signal: FrameSignal) -> bool {
        self.tx.send((self.frame, signal)).is_ok()
    }
}

/// Launcher-side frame state: current generation, `loaded` flag and the
/// receiving end of the signal channel.
#[derive(Debug)]
pub struct FrameBridge {
    current: FrameId,
    next: u64,
    loaded: bool,
    tx: Sender<(FrameId, FrameSignal)>,
    rx: Receiver<(FrameId, FrameSignal)>,
}

impl Default for FrameBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBridge {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            current: FrameId(0),
            next: 1,
            loaded: false,
            tx,
            rx,
        }
    }

    /// Start a new frame generation. Ports handed out before are now stale.
    pub fn attach(&mut self) -> FrameId {
        self.current = FrameId(self.next);
        self.next = self.next.wrapping_add(1);
        self.loaded = false;
        self.current
    }

    #[must_use]
    pub const fn current(&self) -> FrameId {
        self.current
    }

    /// Port bound to the current frame generation.
    #[must_use]
    pub fn port(&self) -> FramePort {
        FramePort {
            frame: self.current,
            tx: self.tx.clone(),
        }
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Point the frame at [`frame_url`] unless its source already carries
    /// the embedded-mode marker.
    ///
    /// Rewriting the source is a hard reload: `loaded` resets and the loading
    /// indicator is shown again. Returns whether the source was rewritten.
    pub fn ensure_loaded<D: HostDocument + ?Sized>(
        &mut self,
        doc: &mut D,
        ids: &ElementIds,
        config: &WidgetConfig,
    ) -> WidgetResult<bool> {
        WidgetInstance::require(doc, &[ids.frame.as_str(), ids.loading.as_str()])?;
        if doc
            .attribute(&ids.frame, "src")
            .is_some_and(|src| carries_marker(&src))
        {
            return Ok(false);
        }

        let url = frame_url(config);
        doc.set_style(&ids.loading, "display", "flex")?;
        doc.set_attribute(&ids.frame, "src", &url)?;
        self.loaded = false;
        crate::debug!(target: "helpdesk_core::frame", url = %url, "frame source set");
        Ok(true)
    }

    /// Handle the frame's load notification by hiding the loading indicator.
    ///
    /// No-op if already loaded or if the indicator is already hidden. Returns
    /// whether the indicator was hidden by this call.
    pub fn on_frame_loaded<D: HostDocument + ?Sized>(
        &mut self,
        doc: &mut D,
        ids: &ElementIds,
    ) -> WidgetResult<bool> {
        if self.loaded {
            return Ok(false);
        }
        WidgetInstance::require(doc, &[ids.loading.as_str()])?;
        self.loaded = true;
        if doc.style(&ids.loading, "display").as_deref() == Some("none") {
            return Ok(false);
        }
        doc.set_style(&ids.loading, "display", "none")?;
        crate::debug!(target: "helpdesk_core::frame", "frame loaded");
        Ok(true)
    }

    /// Drain pending signals and apply the ones addressed to the current
    /// frame. Returns the number applied.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn pump<D: HostDocument + ?Sized>(&mut self, doc: &mut D, ids: &ElementIds) -> usize {
        let mut applied = 0;
        while let Ok((frame, signal)) = self.rx.try_recv() {
            if frame != self.current {
                crate::trace!(
                    target: "helpdesk_core::frame",
                    frame = ?frame,
                    "dropped signal from detached frame"
                );
                continue;
            }
            match signal {
                FrameSignal::Loaded => match self.on_frame_loaded(doc, ids) {
                    Ok(_) => applied += 1,
                    Err(err) => {
                        crate::warn!(
                            target: "helpdesk_core::frame",
                            error = %err,
                            "frame load signal not applied"
                        );
                    }
                },
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::VirtualDocument;
    use crate::mount::mount;
    use serde_json::json;

    fn config(api_url: &str) -> WidgetConfig {
        WidgetConfig::resolve(
            &WidgetConfig::defaults("https://host.test"),
            Some(&json!({ "apiUrl": api_url })),
        )
    }

    fn mounted(src: Option<&str>) -> (VirtualDocument, ElementIds) {
        let mut doc = VirtualDocument::new();
        let ids = ElementIds::default();
        mount(&mut doc, &config("https://x.test"), &ids, src).unwrap();
        (doc, ids)
    }

    #[test]
    fn frame_url_scenario() {
        assert_eq!(
            frame_url(&config("https://x.test")),
            "https://x.test/chat?widget=true"
        );
        assert_eq!(
            frame_url(&config("https://x.test/")),
            "https://x.test/chat?widget=true"
        );
    }

    #[test]
    fn frame_url_follows_config() {
        assert_eq!(
            frame_url(&config("https://support.example")),
            "https://support.example/chat?widget=true"
        );
    }

    #[test]
    fn marker_detection() {
        assert!(carries_marker("https://x.test/chat?widget=true"));
        assert!(carries_marker("/chat?lang=en&widget=true#top"));
        assert!(!carries_marker("https://x.test/chat"));
        assert!(!carries_marker("https://x.test/chat?widget=truer"));
        assert!(!carries_marker("https://x.test/chat#widget=true"));
        assert!(!carries_marker(""));
    }

    #[test]
    fn ensure_loaded_sets_missing_source() {
        let (mut doc, ids) = mounted(None);
        let mut bridge = FrameBridge::new();
        bridge.attach();
        assert!(bridge.ensure_loaded(&mut doc, &ids, &config("https://x.test")).unwrap());
        assert_eq!(
            doc.attribute(&ids.frame, "src").as_deref(),
            Some("https://x.test/chat?widget=true")
        );
    }

    #[test]
    fn ensure_loaded_never_rewrites_marked_source() {
        let (mut doc, ids) = mounted(Some("https://x.test/chat?session=9&widget=true"));
        let mut bridge = FrameBridge::new();
        bridge.attach();
        bridge.on_frame_loaded(&mut doc, &ids).unwrap();

        let rewritten = bridge
            .ensure_loaded(&mut doc, &ids, &config("https://other.test"))
            .unwrap();
        assert!(!rewritten);
        assert!(bridge.is_loaded());
        assert_eq!(
            doc.attribute(&ids.frame, "src").as_deref(),
            Some("https://x.test/chat?session=9&widget=true")
        );
    }

    #[test]
    fn hard_reload_resets_loaded() {
        let (mut doc, ids) = mounted(Some("https://x.test/chat"));
        let mut bridge = FrameBridge::new();
        bridge.attach();
        bridge.on_frame_loaded(&mut doc, &ids).unwrap();
        assert!(bridge.is_loaded());

        assert!(bridge.ensure_loaded(&mut doc, &ids, &config("https://x.test")).unwrap());
        assert!(!bridge.is_loaded());
        assert_eq!(doc.style(&ids.loading, "display").as_deref(), Some("flex"));
    }

    #[test]
    fn load_signal_hides_indicator_once() {
        let (mut doc, ids) = mounted(Some("https://x.test/chat?widget=true"));
        let mut bridge = FrameBridge::new();
        bridge.attach();
        assert!(bridge.on_frame_loaded(&mut doc, &ids).unwrap());
        assert_eq!(doc.style(&ids.loading, "display").as_deref(), Some("none"));
        assert!(!bridge.on_frame_loaded(&mut doc, &ids).unwrap());
    }

    #[test]
    fn already_hidden_indicator_is_noop() {
        let (mut doc, ids) = mounted(None);
        doc.set_style(&ids.loading, "display", "none").unwrap();
        let mut bridge = FrameBridge::new();
        bridge.attach();
        assert!(!bridge.on_frame_loaded(&mut doc, &ids).unwrap());
        assert!(bridge.is_loaded());
    }

    #[test]
    fn missing_indicator_leaves_flag_untouched() {
        let (mut doc, ids) = mounted(None);
        doc.remove(&ids.loading);
        let mut bridge = FrameBridge::new();
        bridge.attach();
        assert!(bridge.on_frame_loaded(&mut doc, &ids).is_err());
        assert!(!bridge.is_loaded());
    }

    #[test]
    fn pump_drops_signals_from_old_frames() {
        let (mut doc, ids) = mounted(None);
        let mut bridge = FrameBridge::new();
        bridge.attach();
        let old_port = bridge.port();
        bridge.attach();
        let port = bridge.port();
        assert_ne!(old_port.frame(), port.frame());

        assert!(old_port.publish(FrameSignal::Loaded));
        assert_eq!(bridge.pump(&mut doc, &ids), 0);
        assert!(!bridge.is_loaded());

        assert!(port.publish(FrameSignal::Loaded));
        assert!(port.publish(FrameSignal::Loaded));
        assert_eq!(bridge.pump(&mut doc, &ids), 2);
        assert!(bridge.is_loaded());
        assert_eq!(doc.style(&ids.loading, "display").as_deref(), Some("none"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn unapplied_signal_is_logged() {
        let (mut doc, ids) = mounted(None);
        doc.remove(&ids.loading);
        let mut bridge = FrameBridge::new();
        bridge.attach();
        assert!(bridge.port().publish(FrameSignal::Loaded));
        assert_eq!(bridge.pump(&mut doc, &ids), 0);
        assert!(logs_contain("frame load signal not applied"));
    }

    #[test]
    fn no_signal_means_indicator_stays() {
        let (mut doc, ids) = mounted(Some("https://x.test/chat?widget=true"));
        let mut bridge = FrameBridge::new();
        bridge.attach();
        assert_eq!(bridge.pump(&mut doc, &ids), 0);
        assert!(!bridge.is_loaded());
        assert_eq!(doc.style(&ids.loading, "display").as_deref(), Some("flex"));
    }
}
