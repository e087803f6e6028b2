#![forbid(unsafe_code)]

//! Widget markup and styles as pure functions of the configuration.
//!
//! Class names are fixed and shared by every instance so one style sheet
//! serves them all. Per-instance values (colors, anchor side) are inline.

use crate::config::WidgetConfig;
use crate::dom::{NodeSpec, Tag};
use crate::mount::ElementIds;
use crate::state::Presentation;

/// Stable id of the shared `<style>` element.
pub const STYLESHEET_ID: &str = "helpdesk-widget-styles";

pub const ROOT_CLASS: &str = "helpdesk-widget";
pub const TRIGGER_CLASS: &str = "widget-trigger";
pub const CONTAINER_CLASS: &str = "widget-container";
pub const CONTROLS_CLASS: &str = "widget-controls";
pub const LOADING_CLASS: &str = "widget-loading";

/// Container is visible.
pub const SHOW_CLASS: &str = "show";
/// Container covers the viewport.
pub const MAXIMIZED_CLASS: &str = "maximized";
/// Trigger shows its close affordance.
pub const ACTIVE_CLASS: &str = "active";

/// Shared launcher style sheet.
pub const STYLESHEET: &str = r#"
.helpdesk-widget .widget-trigger:hover {
  transform: scale(1.1);
  box-shadow: 0 6px 25px rgba(102, 126, 234, 0.6);
}

.helpdesk-widget .widget-trigger.active {
  background: linear-gradient(135deg, #dc3545, #c82333) !important;
}

.helpdesk-widget .widget-container.show {
  transform: translateY(0) scale(1) !important;
  opacity: 1 !important;
  visibility: visible !important;
}

.helpdesk-widget .widget-container.maximized {
  position: fixed !important;
  top: 0 !important;
  left: 0 !important;
  right: 0 !important;
  bottom: 0 !important;
  width: 100vw !important;
  height: 100vh !important;
  border-radius: 0 !important;
  z-index: 20000;
  transform: none !important;
}

.helpdesk-widget .widget-controls button:hover {
  background: rgba(0, 0, 0, 0.9) !important;
  transform: scale(1.1);
}

@media (max-width: 768px) {
  .helpdesk-widget .widget-container {
    width: calc(100vw - 40px) !important;
    right: 20px !important;
    left: 20px !important;
    height: 80vh !important;
  }

  .helpdesk-widget .widget-trigger {
    width: 55px !important;
    height: 55px !important;
    font-size: 22px !important;
  }
}
"#;

const CONTROL_BUTTON_STYLE: [(&str, &str); 10] = [
    ("background", "rgba(0, 0, 0, 0.7)"),
    ("color", "white"),
    ("border", "none"),
    ("border-radius", "50%"),
    ("cursor", "pointer"),
    ("width", "35px"),
    ("height", "35px"),
    ("display", "flex"),
    ("align-items", "center"),
    ("justify-content", "center"),
];

/// Build the full launcher subtree.
///
/// The initial presentation is the closed one; `frame_src` is left off the
/// frame when `None`.
#[must_use]
pub fn widget_tree(config: &WidgetConfig, ids: &ElementIds, frame_src: Option<&str>) -> NodeSpec {
    let closed = Presentation::CLOSED;
    let side = config.position().anchor_side();

    NodeSpec::new(Tag::Div)
        .id(&ids.root)
        .class(ROOT_CLASS)
        .style("position", "fixed")
        .style("bottom", "20px")
        .style(side, "20px")
        .style("z-index", "10000")
        .style("font-family", "'Segoe UI', sans-serif")
        .child(trigger(config, ids, &closed))
        .child(container(config, ids, &closed, frame_src))
}

fn trigger(config: &WidgetConfig, ids: &ElementIds, presentation: &Presentation) -> NodeSpec {
    NodeSpec::new(Tag::Button)
        .id(&ids.trigger)
        .class(TRIGGER_CLASS)
        .attr("type", "button")
        .attr("aria-label", "Open chat")
        .style("width", "60px")
        .style("height", "60px")
        .style("border-radius", "50%")
        .style(
            "background",
            format!(
                "linear-gradient(135deg, {} 0%, {} 100%)",
                config.primary_color(),
                config.secondary_color()
            ),
        )
        .style("border", "none")
        .style("cursor", "pointer")
        .style("display", "flex")
        .style("align-items", "center")
        .style("justify-content", "center")
        .style("transition", "all 0.3s ease")
        .style("color", "white")
        .style("font-size", "24px")
        .text(presentation.trigger_icon)
}

fn container(
    config: &WidgetConfig,
    ids: &ElementIds,
    presentation: &Presentation,
    frame_src: Option<&str>,
) -> NodeSpec {
    let side = config.position().anchor_side();

    let mut frame = NodeSpec::new(Tag::IFrame)
        .id(&ids.frame)
        .attr("title", "Helpdesk chat")
        .style("width", "100%")
        .style("height", "100%")
        .style("border", "none")
        .style("border-radius", "15px");
    if let Some(src) = frame_src {
        frame = frame.attr("src", src);
    }

    let loading = NodeSpec::new(Tag::Div)
        .id(&ids.loading)
        .class(LOADING_CLASS)
        .style("position", "absolute")
        .style("inset", "0")
        .style("display", "flex")
        .style("align-items", "center")
        .style("justify-content", "center")
        .style("color", config.primary_color())
        .text("Loading…");

    let mut controls = NodeSpec::new(Tag::Div)
        .class(CONTROLS_CLASS)
        .style("position", "absolute")
        .style("top", "15px")
        .style("right", "15px")
        .style("z-index", "1000")
        .style("display", "flex")
        .style("gap", "8px");
    let mut maximize = NodeSpec::new(Tag::Button)
        .id(&ids.maximize)
        .attr("type", "button")
        .attr("title", presentation.maximize_title)
        .text(presentation.maximize_icon);
    let mut close = NodeSpec::new(Tag::Button)
        .id(&ids.close)
        .attr("type", "button")
        .attr("title", "Close")
        .text("×");
    for (property, value) in CONTROL_BUTTON_STYLE {
        maximize = maximize.style(property, value);
        close = close.style(property, value);
    }
    controls = controls.child(maximize).child(close);

    NodeSpec::new(Tag::Div)
        .id(&ids.container)
        .class(CONTAINER_CLASS)
        .style("position", "absolute")
        .style("bottom", "80px")
        .style(side, "0")
        .style("width", "420px")
        .style("height", "650px")
        .style("background", config.theme().surface_color())
        .style("border-radius", "15px")
        .style("box-shadow", "0 10px 40px rgba(0, 0, 0, 0.3)")
        .style("transform", "translateY(20px) scale(0.9)")
        .style("opacity", "0")
        .style("visibility", "hidden")
        .style("transition", "all 0.3s ease")
        .style("overflow", "hidden")
        .child(frame)
        .child(loading)
        .child(controls)
}
