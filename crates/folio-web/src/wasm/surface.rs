#![forbid(unsafe_code)]

//! [`Surface`] over the live DOM.
//!
//! Node handles are `web_sys::Element`s. Failed DOM calls are logged at
//! trace level and otherwise ignored, matching the no-op contract of the
//! trait.
//!
//! `commit_then_transition` commits the `from` frame at once and queues the
//! play half; the frame loop calls [`WebSurface::play_committed`] at the
//! start of the next animation frame.

use folio_core::flip::Motion;
use folio_core::geometry::Rect;
use folio_core::markup::{self, Markup};
use folio_core::view::KEY_ATTRIBUTE;
use folio_core::{FolioError, GalleryEvent, Surface};
use gloo::events::EventListener;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Document, Element, HtmlElement, HtmlSelectElement, Window};

use crate::mailbox::Mailbox;

/// The page the gallery renders into.
pub struct WebSurface {
    window: Window,
    document: Document,
    mailbox: Mailbox,
    viewport: Vec<EventListener>,
    committed: Vec<(Element, Motion)>,
}

impl std::fmt::Debug for WebSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSurface")
            .field("viewport_watched", &!self.viewport.is_empty())
            .field("committed", &self.committed.len())
            .finish_non_exhaustive()
    }
}

impl WebSurface {
    /// Bind to the current window. Viewport changes are posted to `mailbox`.
    pub fn new(mailbox: Mailbox) -> Result<Self, FolioError> {
        let window = web_sys::window().ok_or(FolioError::Unavailable("window"))?;
        let document = window
            .document()
            .ok_or(FolioError::Unavailable("document"))?;
        Ok(Self {
            window,
            document,
            mailbox,
            viewport: Vec::new(),
            committed: Vec::new(),
        })
    }

    #[must_use]
    pub const fn window(&self) -> &Window {
        &self.window
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Whether motions are waiting for their play half.
    #[must_use]
    pub fn has_committed(&self) -> bool {
        !self.committed.is_empty()
    }

    /// Apply the transition and target frame of every committed motion.
    pub fn play_committed(&mut self) {
        for (node, motion) in std::mem::take(&mut self.committed) {
            if !node.is_connected() {
                continue;
            }
            let Some(style) = inline_style(&node) else {
                continue;
            };
            check("play", style.set_property("transition", &motion.transition.to_string()));
            for (property, value) in motion.to.declarations() {
                check("play", style.set_property(property, &value));
            }
        }
    }

    fn build_node(&self, markup: &markup::Element) -> Option<Element> {
        let node = self.document.create_element(markup.tag).ok()?;
        if !markup.classes.is_empty() {
            node.set_class_name(&markup.classes.join(" "));
        }
        for (name, value) in &markup.attributes {
            check("set_attribute", node.set_attribute(name, value));
        }
        for child in &markup.children {
            match child {
                Markup::Element(element) => {
                    if let Some(child) = self.build_node(element) {
                        check("append_child", node.append_child(&child));
                    }
                }
                Markup::Text(text) => {
                    let text = self.document.create_text_node(text);
                    check("append_child", node.append_child(&text));
                }
            }
        }
        Some(node)
    }
}

fn inline_style(node: &Element) -> Option<CssStyleDeclaration> {
    node.dyn_ref::<HtmlElement>().map(HtmlElement::style)
}

fn check<T>(op: &'static str, result: Result<T, JsValue>) {
    if let Err(err) = result {
        tracing::trace!(op, ?err, "dom call failed");
    }
}

impl Surface for WebSurface {
    type Node = Element;

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_within(&self, root: &Element, selector: &str) -> Option<Element> {
        root.query_selector(selector).ok().flatten()
    }

    fn query_all_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        let Ok(list) = root.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn cards(&self, container: &Element) -> Vec<Element> {
        let children = container.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .filter(|child| child.class_list().contains("project"))
            .collect()
    }

    fn card_key(&self, card: &Element) -> Option<String> {
        card.get_attribute(KEY_ATTRIBUTE)
    }

    fn build(&mut self, markup: &markup::Element) -> Option<Element> {
        self.build_node(markup)
    }

    fn append_child(&mut self, parent: &Element, child: &Element) {
        check("append_child", parent.append_child(child));
    }

    fn insert_before(&mut self, parent: &Element, child: &Element, reference: &Element) {
        check("insert_before", parent.insert_before(child, Some(reference)));
    }

    fn next_sibling(&self, node: &Element) -> Option<Element> {
        node.next_element_sibling()
    }

    fn remove(&mut self, node: &Element) {
        node.remove();
    }

    fn is_attached(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        check("add_class", node.class_list().add_1(class));
    }

    fn remove_class(&mut self, node: &Element, class: &str) {
        check("remove_class", node.class_list().remove_1(class));
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
        check("set_attribute", node.set_attribute(name, value));
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_style(&mut self, node: &Element, property: &str, value: &str) {
        if let Some(style) = inline_style(node) {
            check("set_style", style.set_property(property, value));
        }
    }

    fn clear_style(&mut self, node: &Element, property: &str) {
        if let Some(style) = inline_style(node) {
            check("clear_style", style.remove_property(property));
        }
    }

    fn bounding_rect(&self, node: &Element) -> Rect {
        let rect = node.get_bounding_client_rect();
        Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    fn force_layout(&mut self) {
        if let Some(body) = self.document.body() {
            // Reading a layout property flushes pending style and layout.
            let _ = body.offset_height();
        }
    }

    fn commit_then_transition(&mut self, node: &Element, motion: &Motion) {
        let Some(style) = inline_style(node) else {
            return;
        };
        check("commit", style.set_property("transition", "none"));
        for (property, value) in motion.from.declarations() {
            check("commit", style.set_property(property, &value));
        }
        let _ = node.get_bounding_client_rect();
        self.committed.push((node.clone(), motion.clone()));
    }

    fn scrollbar_width(&self) -> f64 {
        let inner = self
            .window
            .inner_width()
            .ok()
            .and_then(|width| width.as_f64())
            .unwrap_or_default();
        let client = self
            .document
            .document_element()
            .map_or(inner, |root| f64::from(root.client_width()));
        (inner - client).max(0.0)
    }

    fn set_viewport_watch(&mut self, active: bool) {
        if !active {
            self.viewport.clear();
            return;
        }
        if !self.viewport.is_empty() {
            return;
        }
        for event_type in ["scroll", "resize"] {
            let mailbox = self.mailbox.clone();
            self.viewport.push(EventListener::new(&self.window, event_type, move |_| {
                mailbox.post(GalleryEvent::ViewportChanged);
            }));
        }
    }

    fn control_value(&self, selector: &str) -> Option<String> {
        let control = self.query(selector)?.dyn_into::<HtmlSelectElement>().ok()?;
        Some(control.value())
    }

    fn set_control_value(&mut self, selector: &str, value: &str) {
        if let Some(control) = self
            .query(selector)
            .and_then(|node| node.dyn_into::<HtmlSelectElement>().ok())
        {
            control.set_value(value);
        }
    }
}
