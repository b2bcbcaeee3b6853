#![forbid(unsafe_code)]

//! The DOM abstraction the gallery renders into.
//!
//! A [`Surface`] is the only way the core reads layout or mutates the page.
//! `folio-web` implements it over `web_sys` elements; [`memory::MemorySurface`]
//! implements it in memory for tests and headless runs.
//!
//! # Contract
//!
//! - Operations on detached or unknown nodes are silent no-ops; reads on
//!   them return empty values. Timers routinely fire against nodes that were
//!   removed after they were scheduled.
//! - `bounding_rect` reflects every mutation made so far (reading it may
//!   force a synchronous layout).
//! - `commit_then_transition` applies `motion.from` with transitions disabled,
//!   forces the browser to commit that style, and only afterwards (no earlier
//!   than the next frame) applies `motion.transition` and `motion.to`.

pub mod memory;

use std::fmt;

use crate::flip::Motion;
use crate::geometry::Rect;
use crate::markup::Element;

/// Host page operations used by the gallery.
pub trait Surface {
    /// Handle to an element.
    type Node: Clone + PartialEq + fmt::Debug;

    /// First element in the document matching `selector`.
    fn query(&self, selector: &str) -> Option<Self::Node>;

    /// First descendant of `root` matching `selector`.
    fn query_within(&self, root: &Self::Node, selector: &str) -> Option<Self::Node>;

    /// All descendants of `root` matching `selector`, in document order.
    fn query_all_within(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    /// Card children of `container`, in document order.
    fn cards(&self, container: &Self::Node) -> Vec<Self::Node>;

    /// Identity key a card was built with.
    fn card_key(&self, card: &Self::Node) -> Option<String>;

    /// Materialize a detached element tree.
    fn build(&mut self, markup: &Element) -> Option<Self::Node>;

    /// Append (or move) `child` to the end of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Insert (or move) `child` right before `reference` inside `parent`.
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: &Self::Node);

    /// Next element sibling.
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Detach `node` from the document.
    fn remove(&mut self, node: &Self::Node);

    /// Whether `node` is attached to the document.
    fn is_attached(&self, node: &Self::Node) -> bool;

    fn add_class(&mut self, node: &Self::Node, class: &str);

    fn remove_class(&mut self, node: &Self::Node, class: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Set an inline style property.
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);

    /// Remove an inline style property.
    fn clear_style(&mut self, node: &Self::Node, property: &str);

    /// Border box relative to the viewport.
    fn bounding_rect(&self, node: &Self::Node) -> Rect;

    /// Flush pending style and layout work.
    fn force_layout(&mut self);

    /// Commit `motion.from`, then play into `motion.to` (see module docs).
    fn commit_then_transition(&mut self, node: &Self::Node, motion: &Motion);

    /// Width of the page's vertical scrollbar, `0.0` when there is none.
    fn scrollbar_width(&self) -> f64;

    /// Start or stop reporting scroll/resize as viewport changes.
    fn set_viewport_watch(&mut self, active: bool);

    /// Current value of a form control.
    fn control_value(&self, selector: &str) -> Option<String>;

    /// Set the value of a form control without emitting a change event.
    fn set_control_value(&mut self, selector: &str, value: &str);
}
