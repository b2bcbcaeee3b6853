#![forbid(unsafe_code)]

//! Inputs the gallery reacts to.
//!
//! The host translates raw DOM events into these and pushes them with
//! [`Gallery::push_event`](crate::Gallery::push_event). Clicks are already
//! routed to their target here: the core never sees a raw click.

/// A user or navigation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryEvent {
    /// A card (or anything inside it not covered below) was clicked.
    CardClicked { key: String },
    /// The close button or the floating back control was clicked.
    CloseRequested,
    /// The category control changed.
    FilterChanged,
    /// The sort control changed.
    SortChanged,
    /// Previous screenshot.
    SlidePrev,
    /// Next screenshot.
    SlideNext,
    /// The current screenshot was clicked.
    ScreenshotClicked,
    /// A solution title was clicked.
    SolutionToggled { index: usize },
    /// The lightbox overlay was clicked.
    LightboxClicked,
    /// The cancel key (Escape) was pressed.
    CancelKey,
    /// Back/forward navigation; the history already points at the new entry.
    PopState,
    /// The page scrolled or the viewport resized.
    ViewportChanged,
}

impl GalleryEvent {
    /// Convenience constructor for [`GalleryEvent::CardClicked`].
    #[must_use]
    pub fn card(key: impl Into<String>) -> Self {
        Self::CardClicked { key: key.into() }
    }
}
