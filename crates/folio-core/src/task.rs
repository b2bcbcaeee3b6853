#![forbid(unsafe_code)]

//! Deferred continuations and the context they run in.
//!
//! Every delayed piece of work the gallery performs is a [`Task`] on the
//! [`TimerQueue`]. Tasks hold node handles, never borrows, so they stay
//! valid (if stale) after the page changes underneath them.
//!
//! Tasks that end a motion carry the [`MotionToken`] it was started with. A
//! newer motion on the same node replaces the token, so the older task finds
//! itself stale and leaves the newer motion running.

use crate::config::GalleryConfig;
use crate::flip::Motion;
use crate::schedule::TimerQueue;
use crate::sequencer::Sequence;
use crate::surface::Surface;

/// A continuation waiting on the timer queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Task<N> {
    /// Fire the next cue of an entrance (or any other) sequence.
    Sequence(Sequence<N>),
    /// Detach a card whose exit animation has run.
    RemoveCard(N),
    /// Clear the inline motion a reorder left on a card.
    SettleReflow { card: N, token: MotionToken },
    /// The expand transform finished on this card.
    SettleExpand { card: N, token: MotionToken },
    /// Fade the siblings of an expanded card.
    FadeSiblings(N),
    /// The collapse transform finished; put the card back. `collapse`
    /// names the close that scheduled it.
    FinishCollapse { card: N, collapse: u64 },
    /// Swap the screenshot source after its fade-out.
    SwapSlide { image: N, src: String },
    /// Second attempt at opening a deep link.
    RetryOpen(String),
}

// ---------------------------------------------------------------------------
// Motion ledger
// ---------------------------------------------------------------------------

/// Identifies one committed motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MotionToken(u64);

#[derive(Debug)]
struct Running<N> {
    node: N,
    token: MotionToken,
    /// Inline properties left behind, including those of replaced motions.
    properties: Vec<&'static str>,
}

/// The latest motion started on each node.
///
/// # Invariants
///
/// 1. A node has at most one running entry; starting a motion replaces it.
/// 2. Tokens are never reused.
#[derive(Debug)]
pub struct MotionLedger<N> {
    next: u64,
    running: Vec<Running<N>>,
}

impl<N> Default for MotionLedger<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> MotionLedger<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: 0,
            running: Vec::new(),
        }
    }

    /// Number of motions still running.
    #[must_use]
    pub fn len(&self) -> usize {
        self.running.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}

impl<N: PartialEq> MotionLedger<N> {
    /// Record `motion` as the latest on `node`.
    pub fn begin(&mut self, node: N, motion: &Motion) -> MotionToken {
        let token = MotionToken(self.next);
        self.next += 1;
        let mut properties = motion_properties(motion);
        if let Some(i) = self.running.iter().position(|r| r.node == node) {
            for property in self.running.swap_remove(i).properties {
                if !properties.contains(&property) {
                    properties.push(property);
                }
            }
        }
        self.running.push(Running {
            node,
            token,
            properties,
        });
        token
    }

    /// Whether `token` is still the latest motion on `node`.
    #[must_use]
    pub fn is_current(&self, node: &N, token: MotionToken) -> bool {
        self.running
            .iter()
            .any(|r| &r.node == node && r.token == token)
    }

    /// End the motion `token` on `node` and return the properties to clear.
    ///
    /// `None` when a newer motion replaced it or it already ended.
    pub fn finish(&mut self, node: &N, token: MotionToken) -> Option<Vec<&'static str>> {
        let i = self
            .running
            .iter()
            .position(|r| &r.node == node && r.token == token)?;
        Some(self.running.swap_remove(i).properties)
    }

    /// Drop whatever is recorded for `node` (it left the page).
    pub fn forget(&mut self, node: &N) {
        self.running.retain(|r| &r.node != node);
    }
}

fn motion_properties(motion: &Motion) -> Vec<&'static str> {
    let mut properties = vec!["transition"];
    for (property, _) in motion.from.declarations().into_iter().chain(motion.to.declarations()) {
        if !properties.contains(&property) {
            properties.push(property);
        }
    }
    properties
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Mutable context shared by the renderer and the expansion machine.
pub struct Stage<'a, S: Surface> {
    pub surface: &'a mut S,
    pub timers: &'a mut TimerQueue<Task<S::Node>>,
    pub motions: &'a mut MotionLedger<S::Node>,
    pub config: &'a GalleryConfig,
}

impl<S: Surface> Stage<'_, S> {
    /// Commit `motion` on `node` and return the token that ends it.
    pub fn play(&mut self, node: &S::Node, motion: &Motion) -> MotionToken {
        self.surface.commit_then_transition(node, motion);
        self.motions.begin(node.clone(), motion)
    }

    /// Clear what motion `token` left on `node`, unless a newer motion
    /// replaced it. Returns whether anything was cleared.
    pub fn settle(&mut self, node: &S::Node, token: MotionToken) -> bool {
        let Some(properties) = self.motions.finish(node, token) else {
            tracing::trace!(?node, "stale motion settle ignored");
            return false;
        };
        for property in properties {
            self.surface.clear_style(node, property);
        }
        true
    }

    /// Fire the first cue now and queue the rest.
    pub fn run_sequence(&mut self, mut sequence: Sequence<S::Node>) {
        if let Some(wait) = sequence.fire(&mut *self.surface) {
            self.timers.schedule(wait, Task::Sequence(sequence));
        }
    }

    /// Live card children of `container`, in document order.
    ///
    /// Cards on their way out (`hide`) are not live.
    #[must_use]
    pub fn live_cards(&self, container: &S::Node) -> Vec<S::Node> {
        self.surface
            .cards(container)
            .into_iter()
            .filter(|card| !self.surface.has_class(card, "hide"))
            .collect()
    }

    /// The live card built for `key`.
    #[must_use]
    pub fn find_card(&self, container: &S::Node, key: &str) -> Option<S::Node> {
        self.live_cards(container)
            .into_iter()
            .find(|card| self.surface.card_key(card).as_deref() == Some(key))
    }
}
