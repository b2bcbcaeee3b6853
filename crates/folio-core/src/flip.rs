#![forbid(unsafe_code)]

//! FLIP primitives: First, Last, Invert, Play.
//!
//! A [`FlipDelta`] is computed from two bounding boxes captured around a DOM
//! change. Its inverse transform is committed with transitions disabled, and
//! then the element is transitioned back to identity. The pair of styles plus
//! the transition to run between them is a [`Motion`], which a
//! [`Surface`](crate::surface::Surface) plays through
//! `commit_then_transition`.
//!
//! # Invariants
//!
//! 1. `FlipDelta::between(r, r)` is the identity for every `r`.
//! 2. Scale factors are always finite and positive; a degenerate `Last` box
//!    yields a factor of 1.
//! 3. Translation-only deltas never carry a scale.

use std::fmt;
use std::time::Duration;

use crate::geometry::Rect;

/// Identity transform a motion plays back to.
pub const IDENTITY_TRANSFORM: &str = "translate(0px, 0px) scale(1, 1)";

/// Offset and scale that map a `Last` box back onto its `First` box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipDelta {
    pub dx: f64,
    pub dy: f64,
    pub sx: f64,
    pub sy: f64,
}

impl FlipDelta {
    pub const IDENTITY: Self = Self {
        dx: 0.0,
        dy: 0.0,
        sx: 1.0,
        sy: 1.0,
    };

    /// Translation-only delta (reorders keep their size).
    #[must_use]
    pub fn translation(first: Rect, last: Rect) -> Self {
        Self {
            dx: first.left - last.left,
            dy: first.top - last.top,
            sx: 1.0,
            sy: 1.0,
        }
    }

    /// Translation plus scale (expand/collapse change the box size).
    #[must_use]
    pub fn between(first: Rect, last: Rect) -> Self {
        Self {
            sx: scale_factor(first.width, last.width),
            sy: scale_factor(first.height, last.height),
            ..Self::translation(first, last)
        }
    }

    #[must_use]
    pub fn has_offset(&self) -> bool {
        self.dx != 0.0 || self.dy != 0.0
    }

    #[must_use]
    pub fn has_scale(&self) -> bool {
        self.sx != 1.0 || self.sy != 1.0
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        !self.has_offset() && !self.has_scale()
    }

    /// CSS transform that places the `Last` box over the `First` box.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({}, {})",
            self.dx, self.dy, self.sx, self.sy
        )
    }
}

fn scale_factor(first: f64, last: f64) -> f64 {
    let ratio = first / last;
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A `cubic-bezier()` timing function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier(pub f32, pub f32, pub f32, pub f32);

impl CubicBezier {
    /// Strong ease-out used by every card motion.
    pub const EASE_OUT: Self = Self(0.22, 1.0, 0.36, 1.0);
}

impl fmt::Display for CubicBezier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cubic-bezier({}, {}, {}, {})", self.0, self.1, self.2, self.3)
    }
}

/// Timing function of one transitioned property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timing {
    Ease,
    CubicBezier(CubicBezier),
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ease => f.write_str("ease"),
            Self::CubicBezier(curve) => curve.fmt(f),
        }
    }
}

/// One `property duration timing` entry of a CSS `transition`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionPart {
    pub property: &'static str,
    pub duration: Duration,
    pub timing: Timing,
}

/// A CSS `transition` value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    parts: Vec<TransitionPart>,
}

impl Transition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transitioned property (builder pattern).
    #[must_use]
    pub fn with(mut self, property: &'static str, duration: Duration, timing: Timing) -> Self {
        self.parts.push(TransitionPart {
            property,
            duration,
            timing,
        });
        self
    }

    #[must_use]
    pub fn parts(&self) -> &[TransitionPart] {
        &self.parts
    }

    /// Longest member duration; the motion is over once this elapses.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.parts
            .iter()
            .map(|p| p.duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Duration of one property's transition, if present.
    #[must_use]
    pub fn duration_of(&self, property: &str) -> Option<Duration> {
        self.parts
            .iter()
            .find(|p| p.property == property)
            .map(|p| p.duration)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{} {}ms {}",
                part.property,
                part.duration.as_millis(),
                part.timing
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Motions
// ---------------------------------------------------------------------------

/// Inline visual state at one end of a motion. `None` leaves a property alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionFrame {
    pub transform: Option<String>,
    pub opacity: Option<f64>,
    pub blur_px: Option<f64>,
}

impl MotionFrame {
    /// Style declarations, in a stable order.
    #[must_use]
    pub fn declarations(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::with_capacity(3);
        if let Some(transform) = &self.transform {
            out.push(("transform", transform.clone()));
        }
        if let Some(opacity) = self.opacity {
            out.push(("opacity", opacity.to_string()));
        }
        if let Some(blur) = self.blur_px {
            out.push(("filter", format!("blur({blur}px)")));
        }
        out
    }
}

/// A committed `from` state, the `to` state it plays into, and how.
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub from: MotionFrame,
    pub to: MotionFrame,
    pub transition: Transition,
}

impl Motion {
    /// Slide a reordered card from its old slot.
    #[must_use]
    pub fn reflow(delta: FlipDelta, duration: Duration) -> Self {
        Self {
            from: MotionFrame {
                transform: Some(format!("translate({}px, {}px)", delta.dx, delta.dy)),
                ..MotionFrame::default()
            },
            to: MotionFrame {
                transform: Some("translate(0px, 0px)".to_owned()),
                ..MotionFrame::default()
            },
            transition: Transition::new().with(
                "transform",
                duration,
                Timing::CubicBezier(CubicBezier::EASE_OUT),
            ),
        }
    }

    /// Grow the expanding card out of its collapsed box.
    #[must_use]
    pub fn expand(delta: FlipDelta, duration: Duration, fade: Duration) -> Self {
        Self {
            from: MotionFrame {
                transform: Some(delta.to_css()),
                ..MotionFrame::default()
            },
            to: MotionFrame {
                transform: Some(IDENTITY_TRANSFORM.to_owned()),
                ..MotionFrame::default()
            },
            transition: Transition::new()
                .with(
                    "transform",
                    duration,
                    Timing::CubicBezier(CubicBezier::EASE_OUT),
                )
                .with("opacity", fade, Timing::Ease),
        }
    }

    /// Move a card into its collapsed-gallery slot while it fades in.
    #[must_use]
    pub fn collapse(delta: FlipDelta, duration: Duration, fade: Duration, blur_px: f64) -> Self {
        Self {
            from: MotionFrame {
                transform: Some(delta.to_css()),
                opacity: Some(0.0),
                blur_px: Some(blur_px),
            },
            to: MotionFrame {
                transform: Some(IDENTITY_TRANSFORM.to_owned()),
                opacity: Some(1.0),
                blur_px: Some(0.0),
            },
            transition: Transition::new()
                .with(
                    "transform",
                    duration,
                    Timing::CubicBezier(CubicBezier::EASE_OUT),
                )
                .with("opacity", fade, Timing::Ease)
                .with("filter", fade, Timing::Ease),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const MS_300: Duration = Duration::from_millis(300);
    const MS_1600: Duration = Duration::from_millis(1600);

    #[test]
    fn translation_points_back_to_first() {
        let first = Rect::new(0.0, 0.0, 100.0, 100.0);
        let last = Rect::new(120.0, 40.0, 100.0, 100.0);
        let delta = FlipDelta::translation(first, last);
        assert_eq!(delta.dx, -120.0);
        assert_eq!(delta.dy, -40.0);
        assert!(!delta.has_scale());
    }

    #[test]
    fn scale_uses_first_over_last() {
        let first = Rect::new(0.0, 0.0, 100.0, 50.0);
        let last = Rect::new(0.0, 0.0, 400.0, 200.0);
        let delta = FlipDelta::between(first, last);
        assert_eq!(delta.sx, 0.25);
        assert_eq!(delta.sy, 0.25);
    }

    #[test]
    fn degenerate_last_box_scales_by_one() {
        let first = Rect::new(0.0, 0.0, 100.0, 50.0);
        let delta = FlipDelta::between(first, Rect::default());
        assert_eq!(delta.sx, 1.0);
        assert_eq!(delta.sy, 1.0);
    }

    #[test]
    fn transition_renders_as_css() {
        let t = Transition::new()
            .with("transform", MS_1600, Timing::CubicBezier(CubicBezier::EASE_OUT))
            .with("opacity", MS_300, Timing::Ease);
        assert_eq!(
            t.to_string(),
            "transform 1600ms cubic-bezier(0.22, 1, 0.36, 1), opacity 300ms ease"
        );
        assert_eq!(t.total(), MS_1600);
        assert_eq!(t.duration_of("opacity"), Some(MS_300));
        assert_eq!(Transition::new().total(), Duration::ZERO);
    }

    #[test]
    fn collapse_motion_fades_in() {
        let motion = Motion::collapse(FlipDelta::IDENTITY, MS_1600, MS_300, 6.0);
        assert_eq!(
            motion.from.declarations(),
            vec![
                ("transform", "translate(0px, 0px) scale(1, 1)".to_owned()),
                ("opacity", "0".to_owned()),
                ("filter", "blur(6px)".to_owned()),
            ]
        );
        assert_eq!(motion.to.opacity, Some(1.0));
    }

    proptest! {
        #[test]
        fn same_box_is_identity(
            left in -2000.0f64..2000.0,
            top in -2000.0f64..2000.0,
            width in 1.0f64..2000.0,
            height in 1.0f64..2000.0,
        ) {
            let r = Rect::new(left, top, width, height);
            prop_assert!(FlipDelta::between(r, r).is_identity());
            prop_assert!(FlipDelta::translation(r, r).is_identity());
        }

        #[test]
        fn scale_is_always_positive_and_finite(
            w1 in 0.0f64..2000.0, h1 in 0.0f64..2000.0,
            w2 in 0.0f64..2000.0, h2 in 0.0f64..2000.0,
        ) {
            let d = FlipDelta::between(Rect::new(0.0, 0.0, w1, h1), Rect::new(0.0, 0.0, w2, h2));
            prop_assert!(d.sx.is_finite() && d.sx > 0.0);
            prop_assert!(d.sy.is_finite() && d.sy > 0.0);
        }
    }
}
