#![forbid(unsafe_code)]

//! Gallery options: timings, page selectors and the initial sort order.
//!
//! Every field has a default, so an empty JSON object (or no options at all)
//! yields the stock behavior. Timings are stored in milliseconds to keep the
//! JSON surface simple and exposed as [`Duration`] accessors.

use std::time::Duration;

use serde::Deserialize;

use crate::error::FolioError;
use crate::filter::SortOrder;

/// Top-level gallery configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub timings: Timings,
    pub selectors: Selectors,
    /// Sort order applied on first render.
    pub initial_sort: SortOrder,
}

impl GalleryConfig {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        serde_json::from_str(json).map_err(|e| FolioError::InvalidConfig(e.to_string()))
    }
}

/// Animation and continuation delays, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Delay after a sequencer step that does not name its own.
    pub step_ms: u64,
    /// Time a leaving card stays in the tree before removal.
    pub exit_ms: u64,
    /// Gap between two entering cards.
    pub card_stagger_ms: u64,
    /// Reorder (FLIP reflow) transform duration.
    pub reflow_ms: u64,
    /// Expand transform duration.
    pub expand_ms: u64,
    /// Collapse transform duration; restoration runs when it elapses.
    pub collapse_ms: u64,
    /// Extra wait after the expand settles before siblings fade out.
    pub sibling_fade_ms: u64,
    /// Screenshot fade-out before the source swap.
    pub slide_swap_ms: u64,
    /// Wait before retrying a deep link whose card was not rendered.
    pub retry_ms: u64,
    /// Opacity/blur fade duration.
    pub fade_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            step_ms: 600,
            exit_ms: 800,
            card_stagger_ms: 200,
            reflow_ms: 1600,
            expand_ms: 1300,
            collapse_ms: 1300,
            sibling_fade_ms: 200,
            slide_swap_ms: 220,
            retry_ms: 600,
            fade_ms: 300,
        }
    }
}

impl Timings {
    #[must_use]
    pub const fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    #[must_use]
    pub const fn exit(&self) -> Duration {
        Duration::from_millis(self.exit_ms)
    }

    #[must_use]
    pub const fn card_stagger(&self) -> Duration {
        Duration::from_millis(self.card_stagger_ms)
    }

    #[must_use]
    pub const fn reflow(&self) -> Duration {
        Duration::from_millis(self.reflow_ms)
    }

    #[must_use]
    pub const fn expand(&self) -> Duration {
        Duration::from_millis(self.expand_ms)
    }

    #[must_use]
    pub const fn collapse(&self) -> Duration {
        Duration::from_millis(self.collapse_ms)
    }

    #[must_use]
    pub const fn sibling_fade(&self) -> Duration {
        Duration::from_millis(self.sibling_fade_ms)
    }

    #[must_use]
    pub const fn slide_swap(&self) -> Duration {
        Duration::from_millis(self.slide_swap_ms)
    }

    #[must_use]
    pub const fn retry(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }

    #[must_use]
    pub const fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}

/// Selectors for the page regions the gallery touches.
///
/// `container` is a hard dependency; everything else is optional and
/// skipped when absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub container: String,
    pub sort_select: String,
    pub filter_select: String,
    pub header: String,
    pub logo: String,
    pub cta_circle: String,
    pub cta_button: String,
    pub body: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            container: "#projectsContainer".into(),
            sort_select: "#sortSelect".into(),
            filter_select: "#filterSelect".into(),
            header: "header".into(),
            logo: ".logo-circle".into(),
            cta_circle: ".cta-circle".into(),
            cta_button: ".cta-button".into(),
            body: "body".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        let config = GalleryConfig::from_json("{}").unwrap();
        assert_eq!(config, GalleryConfig::default());
        assert_eq!(config.timings.step(), Duration::from_millis(600));
        assert_eq!(config.initial_sort, SortOrder::Year);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = GalleryConfig::from_json(
            r#"{"timings": {"exit_ms": 50}, "initial_sort": "name", "selectors": {"container": "main"}}"#,
        )
        .unwrap();
        assert_eq!(config.timings.exit(), Duration::from_millis(50));
        assert_eq!(config.timings.reflow(), Duration::from_millis(1600));
        assert_eq!(config.initial_sort, SortOrder::Name);
        assert_eq!(config.selectors.container, "main");
        assert_eq!(config.selectors.sort_select, "#sortSelect");
    }

    #[test]
    fn malformed_options_are_rejected() {
        let err = GalleryConfig::from_json(r#"{"timings": {"exit_ms": "soon"}}"#).unwrap_err();
        assert!(matches!(err, FolioError::InvalidConfig(_)));
    }
}
