#![forbid(unsafe_code)]

//! Full-screen screenshot overlay. At most one exists at a time.

use crate::surface::Surface;
use crate::view::lightbox_markup;

/// Handle to the single overlay, if shown.
#[derive(Debug)]
pub struct Lightbox<N> {
    node: Option<N>,
}

impl<N> Default for Lightbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Lightbox<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self { node: None }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.node.is_some()
    }

    /// Show `src` full screen, replacing any overlay already shown.
    pub fn open<S>(&mut self, surface: &mut S, body_selector: &str, src: &str) -> bool
    where
        S: Surface<Node = N>,
    {
        self.close(surface);
        let Some(body) = surface.query(body_selector) else {
            tracing::debug!(selector = body_selector, "no body for lightbox");
            return false;
        };
        let Some(node) = surface.build(&lightbox_markup(src)) else {
            return false;
        };
        surface.append_child(&body, &node);
        self.node = Some(node);
        true
    }

    /// Remove the overlay. Returns whether one was shown.
    pub fn close<S>(&mut self, surface: &mut S) -> bool
    where
        S: Surface<Node = N>,
    {
        match self.node.take() {
            Some(node) => {
                surface.remove(&node);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::memory::MemorySurface;

    #[test]
    fn opening_twice_keeps_a_single_overlay() {
        let mut surface = MemorySurface::gallery_page();
        let mut lightbox = Lightbox::new();
        assert!(lightbox.open(&mut surface, "body", "a.png"));
        assert!(lightbox.open(&mut surface, "body", "b.png"));
        let body = surface.query("body").unwrap();
        let overlays = surface.query_all_within(&body, ".lightbox");
        assert_eq!(overlays.len(), 1);
        let img = surface.query_within(&overlays[0], "img").unwrap();
        assert_eq!(surface.attribute(&img, "src").as_deref(), Some("b.png"));
    }

    #[test]
    fn close_reports_whether_anything_was_open() {
        let mut surface = MemorySurface::gallery_page();
        let mut lightbox = Lightbox::new();
        assert!(!lightbox.close(&mut surface));
        lightbox.open(&mut surface, "body", "a.png");
        assert!(lightbox.is_open());
        assert!(lightbox.close(&mut surface));
        assert!(!lightbox.is_open());
        assert!(surface.query(".lightbox").is_none());
    }

    #[test]
    fn missing_body_is_tolerated() {
        let mut surface = MemorySurface::gallery_page();
        let mut lightbox = Lightbox::new();
        assert!(!lightbox.open(&mut surface, "main", "a.png"));
        assert!(!lightbox.is_open());
    }
}
