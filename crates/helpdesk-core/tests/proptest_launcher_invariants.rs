//! Property-based invariant tests for the launcher.
//!
//! Verifies:
//! 1. Toggle parity: from Closed, an even number of toggles is Closed and an
//!    odd number is Open.
//! 2. Close is idempotent and always leaves `maximized == false`.
//! 3. `maximized` implies `open` after any command sequence.
//! 4. Maximize from Closed is a no-op.
//! 5. DOM cardinality: any mix of commands and reinits leaves exactly one
//!    root and one style sheet.
//! 6. Scroll lock is held exactly while maximized.
//! 7. Frame URL always carries the marker, and `ensure_loaded` never rewrites
//!    a source that already has it.
//! 8. Failed operations leave state unchanged.

use helpdesk_core::frame::{carries_marker, frame_url};
use helpdesk_core::markup::STYLESHEET_ID;
use helpdesk_core::{
    Command, ElementIds, HelpdeskWidget, HostDocument, HostInput, KeyCode, VirtualDocument,
    WidgetConfig, WidgetController, WidgetState,
};
use proptest::prelude::*;
use serde_json::json;

// ── Strategy helpers ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Command(Command),
    Input(HostInput),
    Reinit,
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Toggle),
        Just(Command::Open),
        Just(Command::Close),
        Just(Command::ToggleMaximize),
        Just(Command::Escape),
    ]
}

fn arb_input() -> impl Strategy<Value = HostInput> {
    prop_oneof![
        Just(HostInput::TriggerClicked),
        Just(HostInput::CloseClicked),
        Just(HostInput::MaximizeClicked),
        Just(HostInput::KeyDown(KeyCode::Escape)),
        "[A-Za-z]{0,8}".prop_map(|key| HostInput::KeyDown(KeyCode::from_dom_key(&key))),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => arb_command().prop_map(Op::Command),
        3 => arb_input().prop_map(Op::Input),
        1 => Just(Op::Reinit),
    ]
}

fn arb_api_url() -> impl Strategy<Value = String> {
    "https://[a-z]{1,12}\\.test(/[a-z]{0,6})?/?"
}

fn controller() -> WidgetController<VirtualDocument> {
    let mut controller = WidgetController::new(
        VirtualDocument::new(),
        WidgetConfig::defaults("https://x.test"),
        ElementIds::default(),
    );
    controller.init(None).expect("mount into empty document");
    controller
}

fn apply(controller: &mut WidgetController<VirtualDocument>, op: &Op) {
    match op {
        Op::Command(command) => {
            controller.dispatch(*command).expect("mounted launcher");
        }
        Op::Input(input) => {
            controller.handle_input(input).expect("mounted launcher");
        }
        Op::Reinit => controller.reinit(None).expect("remount"),
    }
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn toggle_parity(n in 0usize..40) {
        let mut c = controller();
        for _ in 0..n {
            c.dispatch(Command::Toggle).unwrap();
        }
        let expected = WidgetState { open: n % 2 == 1, maximized: false };
        prop_assert_eq!(c.state(), expected);
    }

    #[test]
    fn close_is_idempotent(ops in prop::collection::vec(arb_op(), 0..30)) {
        let mut c = controller();
        for op in &ops {
            apply(&mut c, op);
        }
        c.dispatch(Command::Close).unwrap();
        let once_state = c.state();
        let once_doc = c.document().clone();
        c.dispatch(Command::Close).unwrap();

        prop_assert_eq!(c.state(), once_state);
        prop_assert!(!c.state().maximized);
        prop_assert_eq!(c.document().body(), once_doc.body());
        prop_assert_eq!(c.document().body_overflow(), None);
    }

    #[test]
    fn maximized_implies_open(ops in prop::collection::vec(arb_op(), 0..50)) {
        let mut c = controller();
        for op in &ops {
            apply(&mut c, op);
            let state = c.state();
            prop_assert!(!state.maximized || state.open);
        }
    }

    #[test]
    fn maximize_from_closed_is_noop(ops in prop::collection::vec(arb_op(), 0..20)) {
        let mut c = controller();
        for op in &ops {
            apply(&mut c, op);
        }
        c.dispatch(Command::Close).unwrap();
        let before = c.document().clone();
        c.dispatch(Command::ToggleMaximize).unwrap();
        prop_assert_eq!(c.state(), WidgetState::default());
        prop_assert_eq!(c.document().body(), before.body());
    }

    #[test]
    fn single_root_and_sheet(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut c = controller();
        let ids = c.ids().clone();
        for op in &ops {
            apply(&mut c, op);
            prop_assert_eq!(c.document().count(&ids.root), 1);
            prop_assert_eq!(c.document().count(STYLESHEET_ID), 1);
            for id in ids.all() {
                prop_assert_eq!(c.document().count(id), 1);
            }
        }
    }

    #[test]
    fn scroll_lock_tracks_maximized(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut c = controller();
        for op in &ops {
            apply(&mut c, op);
            let locked = c.document().body_overflow().as_deref() == Some("hidden");
            prop_assert_eq!(locked, c.state().maximized);
        }
    }

    #[test]
    fn frame_url_carries_marker(api_url in arb_api_url()) {
        let config = WidgetConfig::resolve(
            &WidgetConfig::defaults("https://host.test"),
            Some(&json!({ "apiUrl": api_url })),
        );
        let url = frame_url(&config);
        prop_assert!(carries_marker(&url));
        prop_assert!(url.ends_with("/chat?widget=true"));
        prop_assert!(!url.contains("//chat"));
    }

    #[test]
    fn ensure_loaded_keeps_marked_source(
        api_url in arb_api_url(),
        session in "[a-z0-9]{1,8}",
    ) {
        let mut c = controller();
        let frame = c.ids().frame.clone();
        let src = format!("https://chat.test/chat?s={session}&widget=true");
        c.reinit(Some(json!({ "apiUrl": api_url, "lazyLoad": true }))).unwrap();
        c.document_mut().set_attribute(&frame, "src", &src).unwrap();

        prop_assert!(!c.ensure_loaded().unwrap());
        c.dispatch(Command::Open).unwrap();
        let current = c.document().attribute(&frame, "src");
        prop_assert_eq!(current.as_deref(), Some(src.as_str()));
    }

    #[test]
    fn failures_leave_state_unchanged(
        ops in prop::collection::vec(arb_op(), 0..20),
        command in arb_command(),
        victim in 0usize..7,
    ) {
        let mut c = controller();
        for op in &ops {
            apply(&mut c, op);
        }
        let ids = c.ids().clone();
        let victim_id = ids.all()[victim].to_owned();
        c.document_mut().remove(&victim_id);

        let before = c.state();
        if c.dispatch(command).is_err() {
            prop_assert_eq!(c.state(), before);
        }
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────

#[test]
fn default_frame_url_scenario() {
    let widget = HelpdeskWidget::init(
        VirtualDocument::new(),
        "https://x.test",
        None,
    );
    assert_eq!(frame_url(widget.config()), "https://x.test/chat?widget=true");
}

#[test]
fn escape_demotes_scenario() {
    let mut widget = HelpdeskWidget::init(VirtualDocument::new(), "https://x.test", None);
    widget.open();
    widget.maximize();
    let state = widget.handle_input(&HostInput::KeyDown(KeyCode::Escape));
    assert_eq!(
        state,
        WidgetState {
            open: true,
            maximized: false
        }
    );
}

#[test]
fn restore_releases_scroll_scenario() {
    let mut widget = HelpdeskWidget::init(VirtualDocument::new(), "https://x.test", None);
    widget.open();
    widget.maximize();
    assert_eq!(widget.document().body_overflow().as_deref(), Some("hidden"));
    let state = widget.maximize();
    assert_eq!(
        state,
        WidgetState {
            open: true,
            maximized: false
        }
    );
    assert_eq!(widget.document().body_overflow(), None);
}

#[test]
fn repeated_reinit_keeps_one_instance() {
    let mut widget = HelpdeskWidget::init(VirtualDocument::new(), "https://x.test", None);
    for color in ["#000", "#111", "#222"] {
        assert!(widget.reinit(Some(json!({ "primaryColor": color }))));
    }
    let ids = widget.element_ids().clone();
    assert_eq!(widget.document().count(&ids.root), 1);
    assert_eq!(widget.document().count(STYLESHEET_ID), 1);
    assert_eq!(widget.config().primary_color(), "#222");
    assert!(!widget.is_open());
}

#[test]
fn facade_swallows_failures() {
    let mut widget = HelpdeskWidget::init(VirtualDocument::new(), "https://x.test", None);
    widget.destroy();
    assert!(!widget.is_mounted());
    assert_eq!(widget.open(), WidgetState::default());
    assert!(!widget.frame_loaded());
    assert_eq!(widget.pump_frame_signals(), 0);
    assert!(widget.reinit(None));
    assert!(widget.is_mounted());
}

#[test]
fn config_passthrough_is_visible_to_host() {
    let widget = HelpdeskWidget::init(
        VirtualDocument::new(),
        "https://x.test",
        Some(json!({ "welcome": "Hi there", "theme": "light" })),
    );
    let record = widget.config().to_json();
    assert_eq!(record["welcome"], json!("Hi there"));
    assert_eq!(record["theme"], json!("light"));
    assert_eq!(record["apiUrl"], json!("https://x.test"));
}
