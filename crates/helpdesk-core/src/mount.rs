#![forbid(unsafe_code)]

//! Mounting and unmounting the launcher.
//!
//! # Invariants
//!
//! 1. After [`mount`], the document holds exactly one element with the root
//!    id. Any prior root (ours or a stale copy) is removed first, so mounting
//!    twice is the same as mounting once.
//! 2. The shared style sheet is keyed by [`STYLESHEET_ID`] and only inserted
//!    when absent; it is never duplicated and never removed by [`unmount`].
//! 3. [`unmount`] with nothing mounted is a no-op.
//! 4. The page scroll lock is shared. Each launcher registers its root id as a
//!    holder on `<body>`; the page's own `overflow` comes back only when the
//!    last holder releases, and a launcher that holds nothing never touches it.

use crate::config::WidgetConfig;
use crate::dom::HostDocument;
use crate::error::{WidgetError, WidgetResult};
use crate::markup::{self, STYLESHEET_ID};

/// `<body>` attribute listing the launcher roots holding the scroll lock.
pub const SCROLL_LOCK_ATTR: &str = "data-helpdesk-scroll-lock";
/// `<body>` attribute keeping the page's `overflow` from before the first lock.
pub const SAVED_OVERFLOW_ATTR: &str = "data-helpdesk-saved-overflow";

/// Default prefix for element ids.
pub const DEFAULT_ID_PREFIX: &str = "helpdesk";

/// Upper bound on stale roots swept before a mount. A page with more copies
/// than this is not one we can repair.
const MAX_STALE_ROOTS: usize = 64;

/// Element ids for one launcher instance.
///
/// Ids are derived from a prefix so that independent launchers with distinct
/// prefixes can share a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementIds {
    pub root: String,
    pub trigger: String,
    pub container: String,
    pub frame: String,
    pub loading: String,
    pub maximize: String,
    pub close: String,
}

impl ElementIds {
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            root: format!("{prefix}Widget"),
            trigger: format!("{prefix}Trigger"),
            container: format!("{prefix}Container"),
            frame: format!("{prefix}ChatFrame"),
            loading: format!("{prefix}Loading"),
            maximize: format!("{prefix}Maximize"),
            close: format!("{prefix}Close"),
        }
    }

    /// Every id a mounted instance is expected to provide.
    #[must_use]
    pub fn all(&self) -> [&str; 7] {
        [
            &self.root,
            &self.trigger,
            &self.container,
            &self.frame,
            &self.loading,
            &self.maximize,
            &self.close,
        ]
    }
}

impl Default for ElementIds {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_ID_PREFIX)
    }
}

/// Handle to a mounted launcher.
///
/// Holds ids only; the elements themselves live in the host document and may
/// disappear underneath us, which is why every use goes through
/// [`WidgetInstance::require`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetInstance {
    ids: ElementIds,
}

impl WidgetInstance {
    #[must_use]
    pub fn ids(&self) -> &ElementIds {
        &self.ids
    }

    /// Check that every id in `ids` is present in `doc`.
    pub fn require<D: HostDocument + ?Sized>(doc: &D, ids: &[&str]) -> WidgetResult<()> {
        match ids.iter().find(|id| !doc.contains(id)) {
            Some(missing) => Err(WidgetError::missing(missing)),
            None => Ok(()),
        }
    }

    /// Whether the instance's root is still attached.
    #[must_use]
    pub fn is_attached<D: HostDocument + ?Sized>(&self, doc: &D) -> bool {
        doc.contains(&self.ids.root)
    }
}

/// Inject the launcher into `doc`.
///
/// `frame_src` is the initial frame source; `None` mounts the frame without
/// one (lazy loading).
pub fn mount<D: HostDocument + ?Sized>(
    doc: &mut D,
    config: &WidgetConfig,
    ids: &ElementIds,
    frame_src: Option<&str>,
) -> WidgetResult<WidgetInstance> {
    let mut swept = 0usize;
    while swept < MAX_STALE_ROOTS && doc.remove(&ids.root) {
        swept += 1;
    }
    if swept > 0 {
        crate::debug!(
            target: "helpdesk_core::mount",
            root = %ids.root,
            swept,
            "removed previous launcher root"
        );
    }

    if doc.ensure_style(STYLESHEET_ID, markup::STYLESHEET)? {
        crate::trace!(target: "helpdesk_core::mount", "style sheet inserted");
    }

    let tree = markup::widget_tree(config, ids, frame_src);
    doc.append_to_body(&tree)?;
    WidgetInstance::require(doc, &ids.all())?;

    crate::info!(
        target: "helpdesk_core::mount",
        root = %ids.root,
        position = ?config.position(),
        lazy = config.lazy_load(),
        "launcher mounted"
    );
    Ok(WidgetInstance { ids: ids.clone() })
}

/// Remove the launcher held in `slot`, if any.
///
/// Releases the page scroll lock the launcher may hold. Returns `true` if an
/// instance was taken out of the slot.
pub fn unmount<D: HostDocument + ?Sized>(doc: &mut D, slot: &mut Option<WidgetInstance>) -> bool {
    let Some(instance) = slot.take() else {
        return false;
    };
    let mut swept = 0usize;
    while swept < MAX_STALE_ROOTS && doc.remove(&instance.ids.root) {
        swept += 1;
    }
    release_scroll_lock(doc, &instance.ids.root);
    crate::info!(
        target: "helpdesk_core::mount",
        root = %instance.ids.root,
        "launcher unmounted"
    );
    true
}

/// Lock page scrolling on behalf of `owner`. Holding twice is holding once.
pub fn acquire_scroll_lock<D: HostDocument + ?Sized>(doc: &mut D, owner: &str) {
    let mut holders = scroll_lock_holders(doc);
    if holders.iter().any(|holder| holder == owner) {
        return;
    }
    if holders.is_empty() {
        if let Some(previous) = doc.body_overflow() {
            doc.set_body_attribute(SAVED_OVERFLOW_ATTR, Some(&previous));
        }
        doc.set_body_overflow(Some("hidden"));
    }
    holders.push(owner.to_owned());
    doc.set_body_attribute(SCROLL_LOCK_ATTR, Some(&holders.join(" ")));
}

/// Drop `owner`'s hold on the scroll lock. Returns whether it held one.
pub fn release_scroll_lock<D: HostDocument + ?Sized>(doc: &mut D, owner: &str) -> bool {
    let mut holders = scroll_lock_holders(doc);
    let before = holders.len();
    holders.retain(|holder| holder != owner);
    if holders.len() == before {
        return false;
    }
    if holders.is_empty() {
        let previous = doc.body_attribute(SAVED_OVERFLOW_ATTR);
        doc.set_body_overflow(previous.as_deref());
        doc.set_body_attribute(SAVED_OVERFLOW_ATTR, None);
        doc.set_body_attribute(SCROLL_LOCK_ATTR, None);
    } else {
        doc.set_body_attribute(SCROLL_LOCK_ATTR, Some(&holders.join(" ")));
    }
    true
}

fn scroll_lock_holders<D: HostDocument + ?Sized>(doc: &D) -> Vec<String> {
    doc.body_attribute(SCROLL_LOCK_ATTR)
        .map(|raw| raw.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{NodeSpec, Tag, VirtualDocument};

    fn config() -> WidgetConfig {
        WidgetConfig::defaults("https://x.test")
    }

    #[test]
    fn ids_follow_prefix() {
        let ids = ElementIds::with_prefix("support");
        assert_eq!(ids.root, "supportWidget");
        assert_eq!(ids.frame, "supportChatFrame");
        assert_eq!(ElementIds::default().root, "helpdeskWidget");
    }

    #[test]
    fn mount_injects_one_root_and_one_sheet() {
        let mut doc = VirtualDocument::new();
        let ids = ElementIds::default();
        let instance = mount(&mut doc, &config(), &ids, None).unwrap();
        assert!(instance.is_attached(&doc));
        assert_eq!(doc.count(&ids.root), 1);
        assert_eq!(doc.count(STYLESHEET_ID), 1);
        for id in ids.all() {
            assert!(doc.contains(id), "missing {id}");
        }
    }

    #[test]
    fn mount_twice_is_mount_once() {
        let mut doc = VirtualDocument::new();
        let ids = ElementIds::default();
        mount(&mut doc, &config(), &ids, None).unwrap();
        doc.set_class(&ids.container, "show", true).unwrap();
        mount(&mut doc, &config(), &ids, None).unwrap();
        assert_eq!(doc.count(&ids.root), 1);
        assert_eq!(doc.count(&ids.trigger), 1);
        assert_eq!(doc.count(STYLESHEET_ID), 1);
        assert!(!doc.has_class(&ids.container, "show"));
    }

    #[test]
    fn mount_sweeps_stale_copies() {
        let mut doc = VirtualDocument::new();
        let ids = ElementIds::default();
        doc.insert_foreign(&NodeSpec::new(Tag::Div).id(&ids.root));
        doc.insert_foreign(&NodeSpec::new(Tag::Div).id(&ids.root));
        mount(&mut doc, &config(), &ids, None).unwrap();
        assert_eq!(doc.count(&ids.root), 1);
    }

    #[test]
    fn distinct_prefixes_coexist() {
        let mut doc = VirtualDocument::new();
        let a = ElementIds::with_prefix("a");
        let b = ElementIds::with_prefix("b");
        mount(&mut doc, &config(), &a, None).unwrap();
        mount(&mut doc, &config(), &b, None).unwrap();
        assert_eq!(doc.count(&a.root), 1);
        assert_eq!(doc.count(&b.root), 1);
        assert_eq!(doc.count(STYLESHEET_ID), 1);
    }

    #[test]
    fn unmount_removes_elements_but_keeps_sheet() {
        let mut doc = VirtualDocument::new();
        let ids = ElementIds::default();
        let mut slot = Some(mount(&mut doc, &config(), &ids, None).unwrap());
        acquire_scroll_lock(&mut doc, &ids.root);

        assert!(unmount(&mut doc, &mut slot));
        assert!(slot.is_none());
        assert_eq!(doc.count(&ids.root), 0);
        assert_eq!(doc.count(&ids.frame), 0);
        assert_eq!(doc.count(STYLESHEET_ID), 1);
        assert_eq!(doc.body_overflow(), None);
        assert_eq!(doc.body_attribute(SCROLL_LOCK_ATTR), None);
    }

    #[test]
    fn unmount_keeps_host_scroll_lock() {
        let mut doc = VirtualDocument::new();
        let ids = ElementIds::default();
        let mut slot = Some(mount(&mut doc, &config(), &ids, None).unwrap());
        doc.set_body_overflow(Some("hidden"));
        assert!(unmount(&mut doc, &mut slot));
        assert_eq!(doc.body_overflow().as_deref(), Some("hidden"));
    }

    #[test]
    fn scroll_lock_is_shared_between_instances() {
        let mut doc = VirtualDocument::new();
        acquire_scroll_lock(&mut doc, "aWidget");
        acquire_scroll_lock(&mut doc, "bWidget");
        acquire_scroll_lock(&mut doc, "aWidget");

        assert!(release_scroll_lock(&mut doc, "aWidget"));
        assert_eq!(doc.body_overflow().as_deref(), Some("hidden"));
        assert!(!release_scroll_lock(&mut doc, "aWidget"));

        assert!(release_scroll_lock(&mut doc, "bWidget"));
        assert_eq!(doc.body_overflow(), None);
        assert_eq!(doc.body_attribute(SCROLL_LOCK_ATTR), None);
    }

    #[test]
    fn scroll_lock_restores_page_overflow() {
        let mut doc = VirtualDocument::new();
        doc.set_body_overflow(Some("auto"));
        acquire_scroll_lock(&mut doc, "aWidget");
        assert_eq!(doc.body_overflow().as_deref(), Some("hidden"));
        assert!(release_scroll_lock(&mut doc, "aWidget"));
        assert_eq!(doc.body_overflow().as_deref(), Some("auto"));
        assert_eq!(doc.body_attribute(SAVED_OVERFLOW_ATTR), None);
    }

    #[test]
    fn release_without_hold_leaves_page_alone() {
        let mut doc = VirtualDocument::new();
        doc.set_body_overflow(Some("hidden"));
        assert!(!release_scroll_lock(&mut doc, "aWidget"));
        assert_eq!(doc.body_overflow().as_deref(), Some("hidden"));
    }

    #[test]
    fn unmount_without_instance_is_noop() {
        let mut doc = VirtualDocument::new();
        doc.set_body_overflow(Some("hidden"));
        let mut slot = None;
        assert!(!unmount(&mut doc, &mut slot));
        assert_eq!(doc.body_overflow().as_deref(), Some("hidden"));
    }

    #[test]
    fn require_reports_first_missing_id() {
        let mut doc = VirtualDocument::new();
        let ids = ElementIds::default();
        mount(&mut doc, &config(), &ids, None).unwrap();
        doc.remove(&ids.maximize);
        assert_eq!(
            WidgetInstance::require(&doc, &ids.all()),
            Err(WidgetError::missing(&ids.maximize))
        );
    }
}
