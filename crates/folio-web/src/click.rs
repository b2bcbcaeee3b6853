#![forbid(unsafe_code)]

//! DOM input → [`GalleryEvent`] routing.
//!
//! The page installs a single delegated click listener. For every click the
//! host collects the element path from the target up to the document as
//! [`PathNode`]s and asks [`route_click`] what it means.
//!
//! # Invariants
//!
//! 1. The innermost control wins: a click on the close button inside a card
//!    is a close, not a card click.
//! 2. Slider controls only count inside a `.screenshots-slider`; solution
//!    titles only inside an indexed `.solution-item`.
//! 3. A card click needs a `data-key`; anything else routes to nothing.

use folio_core::GalleryEvent;

/// One element on a click path, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathNode {
    pub classes: Vec<String>,
    /// `data-key` attribute (cards).
    pub key: Option<String>,
    /// `data-index` attribute (solution items).
    pub index: Option<String>,
}

impl PathNode {
    /// A node carrying the space-separated `classes`.
    #[must_use]
    pub fn with_classes(classes: &str) -> Self {
        Self {
            classes: classes.split_whitespace().map(str::to_owned).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Translate a click on `path` (target first) into a gallery event.
#[must_use]
pub fn route_click(path: &[PathNode]) -> Option<GalleryEvent> {
    for (depth, node) in path.iter().enumerate() {
        let outer = &path[depth + 1..];
        if node.has_class("lightbox") {
            return Some(GalleryEvent::LightboxClicked);
        }
        if node.has_class("close-details") || node.has_class("back-floating") {
            return Some(GalleryEvent::CloseRequested);
        }
        if inside(outer, "screenshots-slider") {
            if node.has_class("prev") {
                return Some(GalleryEvent::SlidePrev);
            }
            if node.has_class("next") {
                return Some(GalleryEvent::SlideNext);
            }
            if node.has_class("current") {
                return Some(GalleryEvent::ScreenshotClicked);
            }
        }
        if node.has_class("solution-title") {
            let index = outer
                .iter()
                .find(|n| n.has_class("solution-item"))
                .and_then(|item| item.index.as_deref())
                .and_then(|index| index.parse().ok());
            return index.map(|index| GalleryEvent::SolutionToggled { index });
        }
        if node.has_class("project") {
            return node.key.clone().map(|key| GalleryEvent::CardClicked { key });
        }
    }
    None
}

/// Translate a `keydown` `key` value.
#[must_use]
pub fn route_key(key: &str) -> Option<GalleryEvent> {
    matches!(key, "Escape" | "Esc").then_some(GalleryEvent::CancelKey)
}

fn inside(outer: &[PathNode], class: &str) -> bool {
    outer.iter().any(|n| n.has_class(class))
}
