#![forbid(unsafe_code)]

//! In-memory [`Surface`] with a deterministic grid layout.
//!
//! Nodes live in an arena and are never freed, so a [`NodeId`] stays valid
//! after removal and simply reports itself as detached. Layout is computed
//! on demand from the tree, which makes every read "flushed".
//!
//! # Layout model
//!
//! Elements with class `project` are placed on a grid among their `project`
//! siblings, in document order:
//!
//! - `hidden-project` cards have no box (empty rect) and take no slot;
//! - an `expanded` card starts a new row, spans the full grid width and is
//!   [`GridLayout::expanded_height`] tall;
//! - every other card takes the next cell.
//!
//! Every other node reports an empty rect.
//!
//! Inline styles never move a box. A card in the middle of a motion reports
//! its grid slot, while a browser's `getBoundingClientRect` includes the
//! inline `transform`. A FLIP started on top of a running one therefore
//! measures from the slot here and from the visible position in a browser.
//!
//! # Selectors
//!
//! Only compound selectors are understood: an optional tag, an optional
//! `#id` and any number of `.class` parts (`img.current`, `.project.expanded`).

use std::collections::BTreeMap;

use crate::flip::Motion;
use crate::geometry::Rect;
use crate::markup::{Element, Markup};

use super::Surface;

const TEXT_TAG: &str = "#text";

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    text: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Grid geometry used for card boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub left: f64,
    pub top: f64,
    pub columns: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub gap: f64,
    pub expanded_height: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            left: 40.0,
            top: 200.0,
            columns: 3,
            cell_width: 320.0,
            cell_height: 240.0,
            gap: 20.0,
            expanded_height: 900.0,
        }
    }
}

impl GridLayout {
    fn full_width(&self) -> f64 {
        let cols = self.columns.max(1) as f64;
        cols * self.cell_width + (cols - 1.0) * self.gap
    }
}

/// One recorded `commit_then_transition` call.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionRecord {
    pub node: NodeId,
    pub motion: Motion,
}

/// Arena-backed document.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    nodes: Vec<NodeData>,
    root: NodeId,
    layout: GridLayout,
    motions: Vec<MotionRecord>,
    layout_flushes: usize,
    viewport_watch: bool,
    scrollbar_width: f64,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl MemorySurface {
    /// An empty `<html><body></body></html>` document.
    #[must_use]
    pub fn new() -> Self {
        let mut surface = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            layout: GridLayout::default(),
            motions: Vec::new(),
            layout_flushes: 0,
            viewport_watch: false,
            scrollbar_width: 0.0,
        };
        let root = surface.alloc("html");
        surface.root = root;
        let body = surface.alloc("body");
        surface.attach(root, body);
        surface
    }

    /// A document with the regions the gallery expects: header, filter and
    /// sort selects, logo, call-to-action elements and the card container.
    #[must_use]
    pub fn gallery_page() -> Self {
        let mut surface = Self::new();
        let page = [
            Element::new("header"),
            Element::new("select").attr("id", "filterSelect").attr("value", "all"),
            Element::new("select").attr("id", "sortSelect").attr("value", "rank"),
            Element::new("div").class("logo-circle"),
            Element::new("div").class("cta-circle"),
            Element::new("a").class("cta-button"),
            Element::new("div").attr("id", "projectsContainer"),
        ];
        if let Some(body) = surface.query("body") {
            for element in &page {
                if let Some(node) = surface.build(element) {
                    surface.append_child(&body, &node);
                }
            }
        }
        surface
    }

    /// Replace the grid geometry (builder pattern).
    #[must_use]
    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Report a vertical scrollbar of `width` pixels (builder pattern).
    #[must_use]
    pub fn with_scrollbar_width(mut self, width: f64) -> Self {
        self.scrollbar_width = width;
        self
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            tag: tag.to_owned(),
            ..NodeData::default()
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0)
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(n) = self.node_mut(child) {
            n.parent = Some(parent);
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn can_adopt(&self, parent: NodeId, child: NodeId) -> bool {
        self.node(parent).is_some_and(|p| p.tag != TEXT_TAG)
            && self.node(child).is_some()
            && !self.is_inclusive_ancestor(child, parent)
    }

    fn build_markup(&mut self, markup: &Markup) -> NodeId {
        match markup {
            Markup::Text(text) => {
                let id = self.alloc(TEXT_TAG);
                if let Some(n) = self.node_mut(id) {
                    n.text.clone_from(text);
                }
                id
            }
            Markup::Element(el) => {
                let id = self.alloc(el.tag);
                if let Some(n) = self.node_mut(id) {
                    n.classes.clone_from(&el.classes);
                    n.attributes = el.attributes.iter().cloned().collect();
                }
                for child in &el.children {
                    let child_id = self.build_markup(child);
                    self.attach(id, child_id);
                }
                id
            }
        }
    }

    fn descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
        if let Some(n) = self.node(root) {
            for &child in &n.children {
                out.push(child);
                self.descendants(child, out);
            }
        }
    }

    fn matches(&self, id: NodeId, selector: &Compound) -> bool {
        let Some(n) = self.node(id) else {
            return false;
        };
        if n.tag == TEXT_TAG {
            return false;
        }
        if let Some(tag) = &selector.tag
            && !n.tag.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id_attr) = &selector.id
            && n.attributes.get("id") != Some(id_attr)
        {
            return false;
        }
        selector
            .classes
            .iter()
            .all(|class| n.classes.iter().any(|c| c == class))
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

impl MemorySurface {
    /// Concatenated text of `node`'s subtree.
    #[must_use]
    pub fn text_content(&self, node: &NodeId) -> String {
        let Some(n) = self.node(*node) else {
            return String::new();
        };
        if n.tag == TEXT_TAG {
            return n.text.clone();
        }
        n.children
            .iter()
            .map(|child| self.text_content(child))
            .collect()
    }

    /// Inline style value.
    #[must_use]
    pub fn style(&self, node: &NodeId, property: &str) -> Option<&str> {
        self.node(*node)
            .and_then(|n| n.styles.get(property))
            .map(String::as_str)
    }

    #[must_use]
    pub fn classes(&self, node: &NodeId) -> &[String] {
        self.node(*node)
            .map(|n| n.classes.as_slice())
            .unwrap_or(&[])
    }

    /// Element children of `node`.
    #[must_use]
    pub fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.node(*node).map_or_else(Vec::new, |n| {
            n.children
                .iter()
                .copied()
                .filter(|&c| self.node(c).is_some_and(|d| d.tag != TEXT_TAG))
                .collect()
        })
    }

    #[must_use]
    pub fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node).and_then(|n| n.parent)
    }

    /// Every `commit_then_transition` call so far.
    #[must_use]
    pub fn motions(&self) -> &[MotionRecord] {
        &self.motions
    }

    /// Drain recorded motions.
    pub fn take_motions(&mut self) -> Vec<MotionRecord> {
        std::mem::take(&mut self.motions)
    }

    #[must_use]
    pub const fn layout_flushes(&self) -> usize {
        self.layout_flushes
    }

    #[must_use]
    pub const fn viewport_watched(&self) -> bool {
        self.viewport_watch
    }

    #[must_use]
    pub const fn layout(&self) -> &GridLayout {
        &self.layout
    }
}

// ---------------------------------------------------------------------------
// Surface implementation
// ---------------------------------------------------------------------------

impl Surface for MemorySurface {
    type Node = NodeId;

    fn query(&self, selector: &str) -> Option<NodeId> {
        let compound = Compound::parse(selector);
        if self.matches(self.root, &compound) {
            return Some(self.root);
        }
        self.query_within(&self.root, selector)
    }

    fn query_within(&self, root: &NodeId, selector: &str) -> Option<NodeId> {
        let compound = Compound::parse(selector);
        let mut all = Vec::new();
        self.descendants(*root, &mut all);
        all.into_iter().find(|&id| self.matches(id, &compound))
    }

    fn query_all_within(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
        let compound = Compound::parse(selector);
        let mut all = Vec::new();
        self.descendants(*root, &mut all);
        all.retain(|&id| self.matches(id, &compound));
        all
    }

    fn cards(&self, container: &NodeId) -> Vec<NodeId> {
        self.children(container)
            .into_iter()
            .filter(|c| self.has_class(c, "project"))
            .collect()
    }

    fn card_key(&self, card: &NodeId) -> Option<String> {
        self.attribute(card, "data-key")
    }

    fn build(&mut self, markup: &Element) -> Option<NodeId> {
        Some(self.build_markup(&Markup::Element(markup.clone())))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        if !self.can_adopt(*parent, *child) {
            return;
        }
        self.detach(*child);
        self.attach(*parent, *child);
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: &NodeId) {
        if child == reference
            || !self.can_adopt(*parent, *child)
            || self.node(*reference).and_then(|n| n.parent) != Some(*parent)
        {
            return;
        }
        self.detach(*child);
        let Some(index) = self
            .node(*parent)
            .and_then(|p| p.children.iter().position(|c| c == reference))
        else {
            return;
        };
        if let Some(n) = self.node_mut(*child) {
            n.parent = Some(*parent);
        }
        if let Some(p) = self.node_mut(*parent) {
            p.children.insert(index, *child);
        }
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let parent = self.node(*node)?.parent?;
        let siblings = self.children(&parent);
        let index = siblings.iter().position(|c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn remove(&mut self, node: &NodeId) {
        if *node != self.root {
            self.detach(*node);
        }
    }

    fn is_attached(&self, node: &NodeId) -> bool {
        self.node(*node).is_some() && self.is_inclusive_ancestor(self.root, *node)
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        if let Some(n) = self.node_mut(*node)
            && !n.classes.iter().any(|c| c == class)
        {
            n.classes.push(class.to_owned());
        }
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        if let Some(n) = self.node_mut(*node) {
            n.classes.retain(|c| c != class);
        }
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.node(*node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(*node) {
            n.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.node(*node).and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) {
        if let Some(n) = self.node_mut(*node) {
            n.styles.insert(property.to_owned(), value.to_owned());
        }
    }

    fn clear_style(&mut self, node: &NodeId, property: &str) {
        if let Some(n) = self.node_mut(*node) {
            n.styles.remove(property);
        }
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        if !self.is_attached(node) || !self.has_class(node, "project") {
            return Rect::default();
        }
        let Some(parent) = self.parent(node) else {
            return Rect::default();
        };
        let grid = self.layout;
        let mut col = 0usize;
        let mut y = grid.top;
        for sibling in self.cards(&parent) {
            if self.has_class(&sibling, "hidden-project") {
                if sibling == *node {
                    return Rect::default();
                }
                continue;
            }
            if self.has_class(&sibling, "expanded") {
                if col != 0 {
                    y += grid.cell_height + grid.gap;
                    col = 0;
                }
                let rect = Rect::new(grid.left, y, grid.full_width(), grid.expanded_height);
                if sibling == *node {
                    return rect;
                }
                y += grid.expanded_height + grid.gap;
                continue;
            }
            let x = grid.left + col as f64 * (grid.cell_width + grid.gap);
            if sibling == *node {
                return Rect::new(x, y, grid.cell_width, grid.cell_height);
            }
            col += 1;
            if col == grid.columns.max(1) {
                col = 0;
                y += grid.cell_height + grid.gap;
            }
        }
        Rect::default()
    }

    fn force_layout(&mut self) {
        self.layout_flushes += 1;
    }

    fn commit_then_transition(&mut self, node: &NodeId, motion: &Motion) {
        if self.node(*node).is_none() {
            return;
        }
        self.set_style(node, "transition", "none");
        for (property, value) in motion.from.declarations() {
            self.set_style(node, property, &value);
        }
        self.layout_flushes += 1;
        // No frames here: the play half runs right after the commit.
        self.set_style(node, "transition", &motion.transition.to_string());
        for (property, value) in motion.to.declarations() {
            self.set_style(node, property, &value);
        }
        self.motions.push(MotionRecord {
            node: *node,
            motion: motion.clone(),
        });
    }

    fn scrollbar_width(&self) -> f64 {
        self.scrollbar_width
    }

    fn set_viewport_watch(&mut self, active: bool) {
        self.viewport_watch = active;
    }

    fn control_value(&self, selector: &str) -> Option<String> {
        let node = self.query(selector)?;
        self.attribute(&node, "value")
    }

    fn set_control_value(&mut self, selector: &str, value: &str) {
        if let Some(node) = self.query(selector) {
            self.set_attribute(&node, "value", value);
        }
    }
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(selector: &str) -> Self {
        let mut out = Self::default();
        let mut kind = ' ';
        let mut buf = String::new();
        for ch in selector.trim().chars().chain(std::iter::once('.')) {
            if ch == '.' || ch == '#' {
                if !buf.is_empty() {
                    let part = std::mem::take(&mut buf);
                    match kind {
                        '.' => out.classes.push(part),
                        '#' => out.id = Some(part),
                        _ => out.tag = Some(part),
                    }
                }
                kind = ch;
            } else {
                buf.push(ch);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flip::FlipDelta;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn card(key: &str) -> Element {
        Element::new("div")
            .class("project")
            .attr("data-key", key)
            .child(Element::new("h3").text(key))
    }

    fn page_with_cards(keys: &[&str]) -> (MemorySurface, NodeId, Vec<NodeId>) {
        let mut s = MemorySurface::gallery_page();
        let container = s.query("#projectsContainer").unwrap();
        let cards = keys
            .iter()
            .map(|k| {
                let node = s.build(&card(k)).unwrap();
                s.append_child(&container, &node);
                node
            })
            .collect();
        (s, container, cards)
    }

    #[test]
    fn parses_compound_selectors() {
        assert_eq!(
            Compound::parse("img.current"),
            Compound {
                tag: Some("img".into()),
                id: None,
                classes: vec!["current".into()],
            }
        );
        assert_eq!(Compound::parse("#projectsContainer").id.as_deref(), Some("projectsContainer"));
        assert_eq!(Compound::parse(".project.expanded").classes.len(), 2);
    }

    #[test]
    fn gallery_page_has_expected_regions() {
        let s = MemorySurface::gallery_page();
        for selector in ["header", "#filterSelect", "#sortSelect", ".logo-circle", ".cta-circle", ".cta-button", "#projectsContainer", "body"] {
            assert!(s.query(selector).is_some(), "{selector}");
        }
        assert_eq!(s.control_value("#filterSelect").as_deref(), Some("all"));
    }

    #[test]
    fn cards_flow_on_a_grid() {
        let (s, _, cards) = page_with_cards(&["a", "b", "c", "d"]);
        let g = *s.layout();
        assert_eq!(s.bounding_rect(&cards[0]), Rect::new(g.left, g.top, g.cell_width, g.cell_height));
        assert_eq!(s.bounding_rect(&cards[1]).left, g.left + g.cell_width + g.gap);
        assert_eq!(s.bounding_rect(&cards[3]).top, g.top + g.cell_height + g.gap);
    }

    #[test]
    fn hidden_cards_have_no_box_and_expanded_cards_span_a_row() {
        let (mut s, _, cards) = page_with_cards(&["a", "b", "c"]);
        s.add_class(&cards[0], "hidden-project");
        s.add_class(&cards[1], "expanded");
        assert!(s.bounding_rect(&cards[0]).is_empty());
        let expanded = s.bounding_rect(&cards[1]);
        assert_eq!(expanded.height, s.layout().expanded_height);
        assert_eq!(expanded.width, s.layout().full_width());
        assert_eq!(s.bounding_rect(&cards[2]).top, expanded.bottom() + s.layout().gap);
    }

    #[test]
    fn append_moves_and_insert_before_reorders() {
        let (mut s, container, cards) = page_with_cards(&["a", "b", "c"]);
        s.append_child(&container, &cards[0]);
        assert_eq!(s.cards(&container), vec![cards[1], cards[2], cards[0]]);
        s.insert_before(&container, &cards[0], &cards[1]);
        assert_eq!(s.cards(&container), vec![cards[0], cards[1], cards[2]]);
        assert_eq!(s.next_sibling(&cards[0]), Some(cards[1]));
        assert_eq!(s.next_sibling(&cards[2]), None);
    }

    #[test]
    fn removed_nodes_are_detached_but_still_addressable() {
        let (mut s, container, cards) = page_with_cards(&["a", "b"]);
        s.remove(&cards[0]);
        assert!(!s.is_attached(&cards[0]));
        assert_eq!(s.cards(&container), vec![cards[1]]);
        assert!(s.bounding_rect(&cards[0]).is_empty());
        // Mutations on detached nodes are harmless.
        s.add_class(&cards[0], "show");
        assert_eq!(s.card_key(&cards[0]).as_deref(), Some("a"));
    }

    #[test]
    fn appending_an_ancestor_into_its_descendant_is_ignored() {
        let (mut s, container, cards) = page_with_cards(&["a"]);
        s.append_child(&cards[0], &container);
        assert!(s.is_attached(&container));
        assert_eq!(s.parent(&cards[0]), Some(container));
    }

    #[test]
    fn commit_then_transition_records_and_lands_on_target() {
        let (mut s, _, cards) = page_with_cards(&["a"]);
        let motion = Motion::reflow(FlipDelta { dx: 10.0, dy: 0.0, sx: 1.0, sy: 1.0 }, Duration::from_millis(1600));
        s.commit_then_transition(&cards[0], &motion);
        assert_eq!(s.motions().len(), 1);
        assert_eq!(s.style(&cards[0], "transform"), Some("translate(0px, 0px)"));
        assert!(s.style(&cards[0], "transition").unwrap().starts_with("transform 1600ms"));
    }

    #[test]
    fn text_content_and_queries_within() {
        let (s, _, cards) = page_with_cards(&["alpha"]);
        let title = s.query_within(&cards[0], "h3").unwrap();
        assert_eq!(s.text_content(&title), "alpha");
        assert_eq!(s.query_all_within(&cards[0], "h3").len(), 1);
        assert!(s.query_within(&cards[0], ".missing").is_none());
    }
}
