#![forbid(unsafe_code)]

use std::cell::RefCell;

use helpdesk_core::{
    ElementIds, FramePort, FrameSignal, HelpdeskWidget, HostDocument, HostInput, KeyCode, NodeSpec,
    WidgetError, WidgetResult, WidgetState,
};
use js_sys::{JSON, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlIFrameElement, KeyboardEvent,
    MessageEvent, PageTransitionEvent, Window,
};

use crate::protocol;

// ─────────────────────────────────────────────────────────────────────────────
// DOM document
// ─────────────────────────────────────────────────────────────────────────────

/// [`HostDocument`] over the live page.
#[derive(Debug, Clone)]
pub struct DomDocument {
    document: Document,
}

fn host_error(err: JsValue) -> WidgetError {
    WidgetError::Host(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl DomDocument {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn element(&self, id: &str) -> WidgetResult<Element> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| WidgetError::MissingElement { id: id.to_owned() })
    }

    fn html_element(&self, id: &str) -> WidgetResult<HtmlElement> {
        self.element(id)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| WidgetError::Host(format!("#{id} is not an HTML element")))
    }

    fn body(&self) -> WidgetResult<HtmlElement> {
        self.document
            .body()
            .ok_or_else(|| WidgetError::Host("document has no <body>".to_owned()))
    }

    fn build(&self, spec: &NodeSpec) -> WidgetResult<Element> {
        let element = self
            .document
            .create_element(spec.tag.name())
            .map_err(host_error)?;
        if let Some(id) = &spec.id {
            element.set_id(id);
        }
        if !spec.classes.is_empty() {
            element.set_class_name(&spec.classes.join(" "));
        }
        for (name, value) in &spec.attributes {
            element.set_attribute(name, value).map_err(host_error)?;
        }
        if !spec.style.is_empty() {
            element
                .set_attribute("style", &spec.style_attribute())
                .map_err(host_error)?;
        }
        if let Some(text) = &spec.text {
            element.set_text_content(Some(text));
        }
        for child in &spec.children {
            let child = self.build(child)?;
            element.append_child(&child).map_err(host_error)?;
        }
        Ok(element)
    }

    /// Window of the chat frame `id`, if it is mounted and navigated.
    fn frame_window(&self, id: &str) -> Option<Window> {
        self.document
            .get_element_by_id(id)?
            .dyn_into::<HtmlIFrameElement>()
            .ok()?
            .content_window()
    }
}

impl HostDocument for DomDocument {
    fn contains(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn count(&self, id: &str) -> usize {
        self.document
            .query_selector_all(&format!("[id=\"{id}\"]"))
            .map(|nodes| nodes.length() as usize)
            .unwrap_or(0)
    }

    fn ensure_style(&mut self, id: &str, css: &str) -> WidgetResult<bool> {
        if self.contains(id) {
            return Ok(false);
        }
        let head = self
            .document
            .head()
            .ok_or_else(|| WidgetError::Host("document has no <head>".to_owned()))?;
        let sheet = self.document.create_element("style").map_err(host_error)?;
        sheet.set_id(id);
        sheet.set_text_content(Some(css));
        head.append_child(&sheet).map_err(host_error)?;
        Ok(true)
    }

    fn append_to_body(&mut self, node: &NodeSpec) -> WidgetResult<()> {
        let body = self.body()?;
        let element = self.build(node)?;
        body.append_child(&element).map_err(host_error)?;
        Ok(())
    }

    fn remove(&mut self, id: &str) -> bool {
        match self.document.get_element_by_id(id) {
            Some(element) => {
                element.remove();
                true
            }
            None => false,
        }
    }

    fn set_class(&mut self, id: &str, class: &str, present: bool) -> WidgetResult<()> {
        self.element(id)?
            .class_list()
            .toggle_with_force(class, present)
            .map_err(host_error)?;
        Ok(())
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.document
            .get_element_by_id(id)
            .is_some_and(|element| element.class_list().contains(class))
    }

    fn set_text(&mut self, id: &str, text: &str) -> WidgetResult<()> {
        self.element(id)?.set_text_content(Some(text));
        Ok(())
    }

    fn text(&self, id: &str) -> Option<String> {
        self.document.get_element_by_id(id)?.text_content()
    }

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> WidgetResult<()> {
        self.element(id)?
            .set_attribute(name, value)
            .map_err(host_error)
    }

    fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.document.get_element_by_id(id)?.get_attribute(name)
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) -> WidgetResult<()> {
        self.html_element(id)?
            .style()
            .set_property(property, value)
            .map_err(host_error)
    }

    fn style(&self, id: &str, property: &str) -> Option<String> {
        let element = self.html_element(id).ok()?;
        let value = element.style().get_property_value(property).ok()?;
        (!value.is_empty()).then_some(value)
    }

    fn set_body_overflow(&mut self, value: Option<&str>) {
        let Ok(body) = self.body() else {
            return;
        };
        let style = body.style();
        let result = match value {
            Some(value) => style.set_property("overflow", value),
            None => style.remove_property("overflow").map(drop),
        };
        if let Err(err) = result {
            tracing::warn!(
                target: "helpdesk_web::dom",
                error = ?err,
                "could not update body overflow"
            );
        }
    }

    fn body_overflow(&self) -> Option<String> {
        let body = self.body().ok()?;
        let value = body.style().get_property_value("overflow").ok()?;
        (!value.is_empty()).then_some(value)
    }

    fn body_attribute(&self, name: &str) -> Option<String> {
        self.body().ok()?.get_attribute(name)
    }

    fn set_body_attribute(&mut self, name: &str, value: Option<&str>) {
        let Ok(body) = self.body() else {
            return;
        };
        let result = match value {
            Some(value) => body.set_attribute(name, value),
            None => body.remove_attribute(name),
        };
        if let Err(err) = result {
            tracing::warn!(
                target: "helpdesk_web::dom",
                attribute = name,
                error = ?err,
                "could not update body attribute"
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Page-global launcher
// ─────────────────────────────────────────────────────────────────────────────

/// Listener closures kept alive for as long as they are registered.
#[derive(Default)]
struct Listeners {
    controls: Vec<(Element, Closure<dyn FnMut(Event)>)>,
    port: Option<FramePort>,
    api: Option<Object>,
    keydown: Option<Closure<dyn FnMut(KeyboardEvent)>>,
    message: Option<Closure<dyn FnMut(MessageEvent)>>,
    pagehide: Option<Closure<dyn FnMut(Event)>>,
    ready: Option<Closure<dyn FnMut(Event)>>,
}

thread_local! {
    static WIDGET: RefCell<Option<HelpdeskWidget<DomDocument>>> = const { RefCell::new(None) };
    static LISTENERS: RefCell<Listeners> = RefCell::new(Listeners::default());
}

fn with_widget<R>(f: impl FnOnce(&mut HelpdeskWidget<DomDocument>) -> R) -> Option<R> {
    WIDGET.with(|slot| {
        let Ok(mut slot) = slot.try_borrow_mut() else {
            tracing::warn!(target: "helpdesk_web", "re-entrant launcher call ignored");
            return None;
        };
        slot.as_mut().map(f)
    })
}

fn js_json(value: &serde_json::Value) -> JsValue {
    JSON::parse(&value.to_string()).unwrap_or(JsValue::NULL)
}

/// JSON text of a JS value, or `None` for `undefined`/`null`/unserializable.
fn json_text(value: &JsValue) -> Option<String> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    JSON::stringify(value).ok()?.as_string()
}

fn listen<T: ?Sized>(target: &EventTarget, kind: &str, callback: &Closure<T>) -> bool {
    match target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref()) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                target: "helpdesk_web",
                event = kind,
                error = ?err,
                "could not register listener"
            );
            false
        }
    }
}

fn unlisten<T: ?Sized>(target: &EventTarget, kind: &str, callback: &Closure<T>) {
    let _ = target.remove_event_listener_with_callback(kind, callback.as_ref().unchecked_ref());
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let Some(window) = web_sys::window() else {
        return;
    };
    if window
        .location()
        .href()
        .is_ok_and(|href| protocol::is_embedded_page(&href))
    {
        tracing::debug!(target: "helpdesk_web", "running inside the launcher frame, not booting");
        return;
    }
    let Some(document) = window.document() else {
        return;
    };

    if document.ready_state() == "loading" {
        let ready = Closure::<dyn FnMut(Event)>::new(|_event: Event| boot());
        if listen(&document, "DOMContentLoaded", &ready) {
            LISTENERS.with(|listeners| listeners.borrow_mut().ready = Some(ready));
        }
    } else {
        boot();
    }
}

fn boot() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    if WIDGET.with(|slot| slot.borrow().is_some()) {
        return;
    }

    let origin = window.location().origin().unwrap_or_default();
    let overrides = Reflect::get(&window, &JsValue::from_str(protocol::GLOBAL_NAME))
        .ok()
        .and_then(|global| json_text(&global))
        .and_then(|raw| protocol::parse_overrides(&raw));

    let widget = HelpdeskWidget::init(DomDocument::new(document.clone()), &origin, overrides);
    tracing::info!(
        target: "helpdesk_web",
        origin = %origin,
        mounted = widget.is_mounted(),
        "launcher booted"
    );
    WIDGET.with(|slot| *slot.borrow_mut() = Some(widget));

    wire_controls();
    install_page_listeners(&window, &document);
    install_global_api(&window);
}

/// (Re)bind click handlers to the currently mounted controls and refresh the
/// frame port.
fn wire_controls() {
    unwire_controls();
    let Some((ids, port)) = with_widget(|widget| {
        widget
            .is_mounted()
            .then(|| (widget.element_ids().clone(), widget.frame_port()))
    })
    .flatten() else {
        return;
    };
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };

    let mut controls = Vec::with_capacity(3);
    for (id, input) in control_inputs(&ids) {
        let Some(element) = document.get_element_by_id(id) else {
            continue;
        };
        let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            with_widget(|widget| widget.handle_input(&input));
        });
        if listen(&element, "click", &callback) {
            controls.push((element, callback));
        }
    }

    LISTENERS.with(|listeners| {
        let mut listeners = listeners.borrow_mut();
        listeners.controls = controls;
        listeners.port = Some(port);
    });
}

fn control_inputs(ids: &ElementIds) -> [(&str, HostInput); 3] {
    [
        (ids.trigger.as_str(), HostInput::TriggerClicked),
        (ids.maximize.as_str(), HostInput::MaximizeClicked),
        (ids.close.as_str(), HostInput::CloseClicked),
    ]
}

fn unwire_controls() {
    let controls = LISTENERS.with(|listeners| {
        let mut listeners = listeners.borrow_mut();
        listeners.port = None;
        std::mem::take(&mut listeners.controls)
    });
    for (element, callback) in controls {
        let _ = element
            .remove_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
    }
}

/// Register the page-wide listeners unless they are already in place.
fn install_page_listeners(window: &Window, document: &Document) {
    if LISTENERS.with(|listeners| listeners.borrow().pagehide.is_some()) {
        return;
    }
    let keydown = Closure::<dyn FnMut(KeyboardEvent)>::new(|event: KeyboardEvent| {
        let key = KeyCode::from_dom_key(&event.key());
        if key == KeyCode::Escape {
            with_widget(|widget| widget.handle_input(&HostInput::KeyDown(key)));
        }
    });
    let message = Closure::<dyn FnMut(MessageEvent)>::new(on_message);
    let pagehide = Closure::<dyn FnMut(PageTransitionEvent)>::new(on_page_hide);

    let keydown = listen(document, "keydown", &keydown).then_some(keydown);
    let message = listen(window, "message", &message).then_some(message);
    let pagehide = listen(window, "pagehide", &pagehide).then_some(pagehide);
    LISTENERS.with(|listeners| {
        let mut listeners = listeners.borrow_mut();
        listeners.keydown = keydown;
        listeners.message = message;
        listeners.pagehide = pagehide;
    });
}

/// Tear down on a real unload. A page entering the back/forward cache keeps
/// its launcher so it is intact when the visitor navigates back.
fn on_page_hide(event: PageTransitionEvent) {
    let hide = protocol::PageHide::from_persisted(event.persisted());
    tracing::debug!(target: "helpdesk_web", ?hide, "page hidden");
    if hide.tears_down() {
        destroy();
    }
}

fn remove_page_listeners() {
    let (keydown, message, pagehide) = LISTENERS.with(|listeners| {
        let mut listeners = listeners.borrow_mut();
        (
            listeners.keydown.take(),
            listeners.message.take(),
            listeners.pagehide.take(),
        )
    });
    let Some(window) = web_sys::window() else {
        return;
    };
    if let (Some(keydown), Some(document)) = (keydown, window.document()) {
        unlisten(&document, "keydown", &keydown);
    }
    if let Some(message) = message {
        unlisten(&window, "message", &message);
    }
    if let Some(pagehide) = pagehide {
        unlisten(&window, "pagehide", &pagehide);
    }
}

/// Accept the frame's load notification, but only from the launcher's own
/// frame window.
fn on_message(event: MessageEvent) {
    let Some(source) = event.source() else {
        return;
    };
    let from_frame = with_widget(|widget| {
        widget
            .document()
            .frame_window(&widget.element_ids().frame)
            .is_some_and(|frame| Object::is(&source, &frame))
    })
    .unwrap_or(false);
    if !from_frame {
        return;
    }
    if !json_text(&event.data()).is_some_and(|raw| protocol::is_frame_loaded(&raw)) {
        return;
    }

    let published = LISTENERS.with(|listeners| {
        listeners
            .borrow()
            .port
            .as_ref()
            .is_some_and(|port| port.publish(FrameSignal::Loaded))
    });
    if published {
        let applied = with_widget(HelpdeskWidget::pump_frame_signals).unwrap_or(0);
        tracing::debug!(target: "helpdesk_web::frame", applied, "frame load notification");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

fn state_value(run: impl FnOnce(&mut HelpdeskWidget<DomDocument>) -> WidgetState) -> JsValue {
    let state = with_widget(run).unwrap_or_default();
    js_json(&protocol::state_record(state))
}

/// Open when closed, close when open. Returns `{open, maximized}`.
#[wasm_bindgen]
pub fn toggle() -> JsValue {
    state_value(HelpdeskWidget::toggle)
}

#[wasm_bindgen]
pub fn open() -> JsValue {
    state_value(HelpdeskWidget::open)
}

#[wasm_bindgen]
pub fn close() -> JsValue {
    state_value(HelpdeskWidget::close)
}

/// Toggle maximized/restored. No-op while closed.
#[wasm_bindgen]
pub fn maximize() -> JsValue {
    state_value(HelpdeskWidget::maximize)
}

#[wasm_bindgen(js_name = isOpen)]
pub fn is_open() -> bool {
    with_widget(|widget| widget.is_open()).unwrap_or(false)
}

#[wasm_bindgen(js_name = isMaximized)]
pub fn is_maximized() -> bool {
    with_widget(|widget| widget.is_maximized()).unwrap_or(false)
}

/// Whether the chat frame has reported that it finished loading.
#[wasm_bindgen(js_name = isLoaded)]
pub fn is_loaded() -> bool {
    with_widget(|widget| widget.is_loaded()).unwrap_or(false)
}

/// Resolved configuration as a plain object.
#[wasm_bindgen]
pub fn config() -> JsValue {
    with_widget(|widget| js_json(&widget.config().to_json())).unwrap_or(JsValue::NULL)
}

/// Rebuild the launcher. `overrides` replaces the host configuration; pass
/// `undefined` to keep the current one.
#[wasm_bindgen]
pub fn reinit(overrides: JsValue) -> bool {
    let overrides = json_text(&overrides).and_then(|raw| protocol::parse_overrides(&raw));
    let mounted = with_widget(|widget| widget.reinit(overrides)).unwrap_or(false);
    wire_controls();
    if let Some(window) = web_sys::window() {
        if let Some(document) = window.document() {
            install_page_listeners(&window, &document);
        }
    }
    refresh_config_snapshot();
    mounted
}

/// Remove the launcher and its page listeners. `reinit` brings both back.
#[wasm_bindgen]
pub fn destroy() {
    unwire_controls();
    remove_page_listeners();
    with_widget(HelpdeskWidget::destroy);
    tracing::info!(target: "helpdesk_web", "launcher destroyed");
}

/// Called by the chat page once it has loaded inside the launcher frame.
#[wasm_bindgen(js_name = notifyLauncherLoaded)]
pub fn notify_launcher_loaded() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let Some(parent) = window.parent()? else {
        return Ok(());
    };
    parent.post_message(&js_json(&protocol::frame_loaded_message()), "*")
}

/// Replace `window.HelpdeskWidget` with the public API object.
fn install_global_api(window: &Window) {
    let api = Object::new();
    let methods: [(&str, JsValue); 9] = [
        ("toggle", Closure::<dyn FnMut() -> JsValue>::new(toggle).into_js_value()),
        ("open", Closure::<dyn FnMut() -> JsValue>::new(open).into_js_value()),
        ("close", Closure::<dyn FnMut() -> JsValue>::new(close).into_js_value()),
        ("maximize", Closure::<dyn FnMut() -> JsValue>::new(maximize).into_js_value()),
        ("isOpen", Closure::<dyn FnMut() -> bool>::new(is_open).into_js_value()),
        ("isMaximized", Closure::<dyn FnMut() -> bool>::new(is_maximized).into_js_value()),
        ("isLoaded", Closure::<dyn FnMut() -> bool>::new(is_loaded).into_js_value()),
        ("reinit", Closure::<dyn FnMut(JsValue) -> bool>::new(reinit).into_js_value()),
        ("destroy", Closure::<dyn FnMut()>::new(destroy).into_js_value()),
    ];
    for (name, method) in methods {
        let _ = Reflect::set(&api, &JsValue::from_str(name), &method);
    }
    if let Err(err) = Reflect::set(window, &JsValue::from_str(protocol::GLOBAL_NAME), &api) {
        tracing::warn!(target: "helpdesk_web", error = ?err, "could not publish the launcher API");
        return;
    }
    LISTENERS.with(|listeners| listeners.borrow_mut().api = Some(api));
    refresh_config_snapshot();
}

/// Keep `window.HelpdeskWidget.config` in sync with the resolved snapshot.
fn refresh_config_snapshot() {
    let Some(api) = LISTENERS.with(|listeners| listeners.borrow().api.clone()) else {
        return;
    };
    let _ = Reflect::set(&api, &JsValue::from_str("config"), &config());
}
