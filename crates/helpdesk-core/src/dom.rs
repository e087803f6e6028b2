#![forbid(unsafe_code)]

//! Host document abstraction.
//!
//! The launcher never touches a browser API directly. It describes the
//! elements it wants as [`NodeSpec`] trees and manipulates them by id through
//! [`HostDocument`].
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                 HostDocument                   │
//! │   - id-addressed element queries and updates   │
//! │   - <head> style sheets, <body> scroll lock    │
//! └───────────────────────────────────────────────┘
//!               │                        │
//!               ▼                        ▼
//!   VirtualDocument (here)       DomDocument (helpdesk-web)
//!   in-memory, for tests         web-sys over the real page
//! ```

use std::collections::BTreeMap;

use crate::error::{WidgetError, WidgetResult};

/// Element kinds the launcher creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    Button,
    IFrame,
    Span,
    Style,
}

impl Tag {
    /// HTML tag name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Div => "div",
            Self::Button => "button",
            Self::IFrame => "iframe",
            Self::Span => "span",
            Self::Style => "style",
        }
    }
}

/// Typed description of an element subtree, built before anything touches
/// the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub tag: Tag,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    /// Inline style declarations, in insertion order.
    pub style: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    #[must_use]
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            style: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.push((property.into(), value.into()));
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Find a descendant (or `self`) by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&NodeSpec> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Serialized `style` attribute value.
    #[must_use]
    pub fn style_attribute(&self) -> String {
        self.style
            .iter()
            .map(|(property, value)| format!("{property}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Id-addressed view of the page the launcher is embedded in.
///
/// Mutating calls return [`WidgetError::MissingElement`] when the id is not
/// present. Implementations must not panic.
pub trait HostDocument {
    /// Whether at least one element with `id` exists.
    fn contains(&self, id: &str) -> bool;

    /// Number of elements carrying `id`. Used to check the single-instance
    /// invariant; a healthy page reports 0 or 1.
    fn count(&self, id: &str) -> usize;

    /// Append a `<style>` element with `id` to `<head>` unless one exists.
    ///
    /// Returns `true` if a sheet was inserted.
    fn ensure_style(&mut self, id: &str, css: &str) -> WidgetResult<bool>;

    /// Build `node` and append it to `<body>`.
    fn append_to_body(&mut self, node: &NodeSpec) -> WidgetResult<()>;

    /// Detach the first element with `id`. Returns `false` if none existed.
    fn remove(&mut self, id: &str) -> bool;

    fn set_class(&mut self, id: &str, class: &str, present: bool) -> WidgetResult<()>;

    fn has_class(&self, id: &str, class: &str) -> bool;

    fn set_text(&mut self, id: &str, text: &str) -> WidgetResult<()>;

    fn text(&self, id: &str) -> Option<String>;

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> WidgetResult<()>;

    fn attribute(&self, id: &str, name: &str) -> Option<String>;

    fn set_style(&mut self, id: &str, property: &str, value: &str) -> WidgetResult<()>;

    fn style(&self, id: &str, property: &str) -> Option<String>;

    /// Set `document.body.style.overflow`; `None` restores the page default.
    fn set_body_overflow(&mut self, value: Option<&str>);

    fn body_overflow(&self) -> Option<String>;

    fn body_attribute(&self, name: &str) -> Option<String>;

    /// Set (`Some`) or remove (`None`) an attribute on `<body>`.
    fn set_body_attribute(&mut self, name: &str, value: Option<&str>);
}

// ─────────────────────────────────────────────────────────────────────────────
// Virtual Document (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// One element in a [`VirtualDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    pub tag: Tag,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<VirtualNode>,
}

impl VirtualNode {
    fn from_spec(spec: &NodeSpec) -> Self {
        Self {
            tag: spec.tag,
            id: spec.id.clone(),
            classes: spec.classes.clone(),
            attributes: spec.attributes.iter().cloned().collect(),
            style: spec.style.iter().cloned().collect(),
            text: spec.text.clone().unwrap_or_default(),
            children: spec.children.iter().map(Self::from_spec).collect(),
        }
    }
}

/// In-memory document for tests and non-browser hosts.
///
/// Behaves like a DOM with respect to ids: duplicates are allowed (and
/// counted), lookups return the first match in document order.
#[derive(Debug, Default, Clone)]
pub struct VirtualDocument {
    head: Vec<VirtualNode>,
    body: Vec<VirtualNode>,
    body_overflow: Option<String>,
    body_attributes: BTreeMap<String, String>,
}

impl VirtualDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level `<head>` children.
    #[must_use]
    pub fn head(&self) -> &[VirtualNode] {
        &self.head
    }

    /// Top-level `<body>` children.
    #[must_use]
    pub fn body(&self) -> &[VirtualNode] {
        &self.body
    }

    /// Append an arbitrary node to `<body>`, bypassing the launcher.
    ///
    /// Lets tests model host pages that already contain conflicting markup.
    pub fn insert_foreign(&mut self, node: &NodeSpec) {
        self.body.push(VirtualNode::from_spec(node));
    }

    /// Look up an element by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&VirtualNode> {
        find(&self.head, id).or_else(|| find(&self.body, id))
    }

    fn get_mut(&mut self, id: &str) -> WidgetResult<&mut VirtualNode> {
        if let Some(node) = find_mut(&mut self.head, id) {
            return Ok(node);
        }
        find_mut(&mut self.body, id).ok_or_else(|| WidgetError::missing(id))
    }
}

fn find<'a>(nodes: &'a [VirtualNode], id: &str) -> Option<&'a VirtualNode> {
    nodes.iter().find_map(|node| {
        if node.id.as_deref() == Some(id) {
            Some(node)
        } else {
            find(&node.children, id)
        }
    })
}

fn find_mut<'a>(nodes: &'a mut [VirtualNode], id: &str) -> Option<&'a mut VirtualNode> {
    nodes.iter_mut().find_map(|node| {
        if node.id.as_deref() == Some(id) {
            Some(node)
        } else {
            find_mut(&mut node.children, id)
        }
    })
}

fn count(nodes: &[VirtualNode], id: &str) -> usize {
    nodes
        .iter()
        .map(|node| usize::from(node.id.as_deref() == Some(id)) + count(&node.children, id))
        .sum()
}

fn remove_first(nodes: &mut Vec<VirtualNode>, id: &str) -> bool {
    if let Some(pos) = nodes.iter().position(|node| node.id.as_deref() == Some(id)) {
        nodes.remove(pos);
        return true;
    }
    nodes
        .iter_mut()
        .any(|node| remove_first(&mut node.children, id))
}

impl HostDocument for VirtualDocument {
    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn count(&self, id: &str) -> usize {
        count(&self.head, id) + count(&self.body, id)
    }

    fn ensure_style(&mut self, id: &str, css: &str) -> WidgetResult<bool> {
        if self.contains(id) {
            return Ok(false);
        }
        let sheet = NodeSpec::new(Tag::Style).id(id).text(css);
        self.head.push(VirtualNode::from_spec(&sheet));
        Ok(true)
    }

    fn append_to_body(&mut self, node: &NodeSpec) -> WidgetResult<()> {
        self.body.push(VirtualNode::from_spec(node));
        Ok(())
    }

    fn remove(&mut self, id: &str) -> bool {
        remove_first(&mut self.head, id) || remove_first(&mut self.body, id)
    }

    fn set_class(&mut self, id: &str, class: &str, present: bool) -> WidgetResult<()> {
        let node = self.get_mut(id)?;
        let has = node.classes.iter().any(|c| c == class);
        if present && !has {
            node.classes.push(class.to_owned());
        } else if !present && has {
            node.classes.retain(|c| c != class);
        }
        Ok(())
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.get(id)
            .is_some_and(|node| node.classes.iter().any(|c| c == class))
    }

    fn set_text(&mut self, id: &str, text: &str) -> WidgetResult<()> {
        self.get_mut(id)?.text = text.to_owned();
        Ok(())
    }

    fn text(&self, id: &str) -> Option<String> {
        self.get(id).map(|node| node.text.clone())
    }

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> WidgetResult<()> {
        self.get_mut(id)?
            .attributes
            .insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.get(id)?.attributes.get(name).cloned()
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) -> WidgetResult<()> {
        self.get_mut(id)?
            .style
            .insert(property.to_owned(), value.to_owned());
        Ok(())
    }

    fn style(&self, id: &str, property: &str) -> Option<String> {
        self.get(id)?.style.get(property).cloned()
    }

    fn set_body_overflow(&mut self, value: Option<&str>) {
        self.body_overflow = value.map(str::to_owned);
    }

    fn body_overflow(&self) -> Option<String> {
        self.body_overflow.clone()
    }

    fn body_attribute(&self, name: &str) -> Option<String> {
        self.body_attributes.get(name).cloned()
    }

    fn set_body_attribute(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.body_attributes.insert(name.to_owned(), value.to_owned());
            }
            None => {
                self.body_attributes.remove(name);
            }
        }
    }
}
