#![forbid(unsafe_code)]

//! Card expansion state machine.
//!
//! One card at a time grows into a detail view. Opening hides the siblings,
//! appends a detail panel and plays a FLIP from the collapsed box; closing
//! reveals the siblings again and plays a FLIP on every card, so the whole
//! gallery reflows around the shrinking card.
//!
//! ```text
//!   Collapsed ──open──▶ Expanding ──settle──▶ Expanded
//!       ▲                   │                    │
//!       └──finish── Collapsing ◀──────close──────┘
//! ```
//!
//! # Invariants
//!
//! 1. At most one card is open (`Expanding` or `Expanded`). Opening another
//!    card closes the current one first.
//! 2. A detail panel exists only inside the open card and is rebuilt on
//!    every open.
//! 3. Deferred steps check that their card is still the one they were
//!    scheduled for, and that the open or close they belong to is still the
//!    latest one; stale settles are no-ops.
//! 4. Ending a collapse only clears motions the collapse itself started.
//!
//! # Failure Modes
//!
//! - Card detached while open: close still runs; restoring its position is
//!   skipped.
//! - Anchor card gone by the time the collapse finishes: the card is
//!   appended at the end.

use crate::flip::{FlipDelta, Motion};
use crate::project::Project;
use crate::surface::Surface;
use crate::task::{MotionToken, Stage, Task};
use crate::view::{INDEX_ATTRIBUTE, back_control_markup, detail_markup};

/// Blur applied to cards as they fade back in after a collapse.
pub const COLLAPSE_BLUR_PX: f64 = 6.0;

/// Offset of the floating back control from the card's corner.
pub const BACK_CONTROL_INSET: f64 = 16.0;

/// Lifecycle of one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardPhase {
    #[default]
    Collapsed,
    Expanding,
    Expanded,
    Collapsing,
}

/// Where a collapsed card goes back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restore {
    /// Right before the live card with this key.
    Before(String),
    /// After every other card.
    End,
    /// Leave it where it is (the gallery was reordered meanwhile).
    Stay,
}

// ---------------------------------------------------------------------------
// Screenshot slider
// ---------------------------------------------------------------------------

/// Cyclic screenshot cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slider {
    screenshots: Vec<String>,
    index: usize,
}

impl Slider {
    /// A slider on the first screenshot; `None` when there are none.
    #[must_use]
    pub fn new(screenshots: Vec<String>) -> Option<Self> {
        if screenshots.is_empty() {
            return None;
        }
        Some(Self {
            screenshots,
            index: 0,
        })
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.screenshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.screenshots.is_empty()
    }

    #[must_use]
    pub fn current(&self) -> &str {
        self.screenshots
            .get(self.index)
            .map_or("", String::as_str)
    }

    /// Select `index` modulo the screenshot count (negative wraps from the
    /// end) and return its source.
    pub fn show(&mut self, index: isize) -> &str {
        let len = isize::try_from(self.screenshots.len()).unwrap_or(isize::MAX);
        if len > 0 {
            self.index = index.rem_euclid(len).unsigned_abs();
        }
        self.current()
    }

    /// Select the screenshot `offset` steps away from the current one.
    pub fn step(&mut self, offset: isize) -> &str {
        let current = isize::try_from(self.index).unwrap_or(0);
        self.show(current.saturating_add(offset))
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct OpenCard<N> {
    key: String,
    card: N,
    /// The expand motion.
    token: MotionToken,
    phase: CardPhase,
    restore: Restore,
    slider: Option<Slider>,
    back: Option<N>,
    slug: Option<String>,
}

#[derive(Debug)]
struct Collapse<N> {
    card: N,
    id: u64,
    restore: Restore,
    /// The motion started on every card the collapse reflowed.
    motions: Vec<(N, MotionToken)>,
}

/// A card that has just started collapsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed {
    pub key: String,
    pub slug: Option<String>,
}

/// Owner of the single open card.
#[derive(Debug)]
pub struct ExpansionMachine<N> {
    open: Option<OpenCard<N>>,
    /// Cards on their way back, oldest first.
    collapsing: Vec<Collapse<N>>,
    next_collapse: u64,
    padded: bool,
}

impl<N> Default for ExpansionMachine<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> ExpansionMachine<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            open: None,
            collapsing: Vec::new(),
            next_collapse: 0,
            padded: false,
        }
    }

    /// Key of the open card.
    #[must_use]
    pub fn expanded_key(&self) -> Option<&str> {
        self.open.as_ref().map(|open| open.key.as_str())
    }

    #[must_use]
    pub fn expanded_card(&self) -> Option<&N> {
        self.open.as_ref().map(|open| &open.card)
    }

    #[must_use]
    pub fn slider(&self) -> Option<&Slider> {
        self.open.as_ref().and_then(|open| open.slider.as_ref())
    }

    /// Whether the page carries scrollbar compensation.
    #[must_use]
    pub const fn is_padded(&self) -> bool {
        self.padded
    }

    /// Drop the recorded position of the open card and of every card
    /// still collapsing.
    ///
    /// Called after the gallery reorders, when the old neighbor no longer
    /// describes where a card belongs.
    pub fn forget_anchor(&mut self) {
        if let Some(open) = &mut self.open {
            open.restore = Restore::Stay;
        }
        for collapse in &mut self.collapsing {
            collapse.restore = Restore::Stay;
        }
    }
}

impl<N: Clone + PartialEq> ExpansionMachine<N> {
    #[must_use]
    pub fn phase_of(&self, card: &N) -> CardPhase {
        match &self.open {
            Some(open) if &open.card == card => open.phase,
            _ if self.collapsing.iter().any(|c| &c.card == card) => CardPhase::Collapsing,
            _ => CardPhase::Collapsed,
        }
    }

    /// Expand `card` into the detail view of `project`.
    ///
    /// Returns `false` when the card is already open.
    pub fn open<S>(&mut self, stage: &mut Stage<'_, S>, container: &N, project: &Project, card: &N) -> bool
    where
        S: Surface<Node = N>,
    {
        if self.expanded_card() == Some(card) || stage.surface.has_class(card, "expanded") {
            tracing::debug!(project = %project.name, "already expanded");
            return false;
        }
        if self.open.is_some() {
            self.close(stage, container);
        }

        let siblings: Vec<N> = stage
            .live_cards(container)
            .into_iter()
            .filter(|other| other != card)
            .collect();
        let restore = next_live_key(stage, container, card).map_or(Restore::End, Restore::Before);

        let surface = &mut *stage.surface;
        for sibling in &siblings {
            surface.add_class(sibling, "hidden-project");
        }
        surface.add_class(container, "expanded");
        surface.remove_class(card, "collapsing");
        surface.add_class(card, "will-expand");
        for collapse in &mut self.collapsing {
            if &collapse.card == card {
                collapse.restore = Restore::Stay;
            }
        }

        let first = surface.bounding_rect(card);

        if let Some(stale) = surface.query_within(card, ".project-details") {
            surface.remove(&stale);
        }
        if let Some(panel) = surface.build(&detail_markup(project)) {
            surface.append_child(card, &panel);
        }
        surface.add_class(card, "expanded");
        surface.add_class(card, "expanding");
        surface.set_attribute(card, "aria-expanded", "true");

        let back = stage
            .surface
            .query(&stage.config.selectors.body)
            .and_then(|body| {
                let back = stage.surface.build(&back_control_markup())?;
                stage.surface.append_child(&body, &back);
                Some(back)
            });

        stage.surface.force_layout();
        let last = stage.surface.bounding_rect(card);

        let timings = &stage.config.timings;
        let (expand, fade) = (timings.expand(), timings.fade());
        let token = stage.play(card, &Motion::expand(FlipDelta::between(first, last), expand, fade));
        stage.timers.schedule(
            expand,
            Task::SettleExpand {
                card: card.clone(),
                token,
            },
        );

        if let Some(back) = &back {
            place_back_control(&mut *stage.surface, back, card);
            stage.surface.set_viewport_watch(true);
        }

        tracing::debug!(project = %project.name, ?restore, "card expanding");
        self.open = Some(OpenCard {
            key: project.name.clone(),
            card: card.clone(),
            token,
            phase: CardPhase::Expanding,
            restore,
            slider: Slider::new(project.screenshots.clone()),
            back,
            slug: project.slug().map(str::to_owned),
        });
        true
    }

    /// Collapse the open card and reflow the gallery around it.
    ///
    /// Returns what was closed, or `None` when nothing was open.
    pub fn close<S>(&mut self, stage: &mut Stage<'_, S>, container: &N) -> Option<Closed>
    where
        S: Surface<Node = N>,
    {
        let open = self.open.take()?;
        let surface = &mut *stage.surface;

        if let Some(back) = &open.back {
            surface.remove(back);
        }
        surface.set_viewport_watch(false);

        let scrollbar = surface.scrollbar_width();
        if scrollbar > 0.0
            && let Some(body) = surface.query(&stage.config.selectors.body)
        {
            surface.set_style(&body, "padding-right", &format!("{scrollbar}px"));
            self.padded = true;
        }

        let cards = stage.live_cards(container);
        let surface = &mut *stage.surface;
        for card in &cards {
            surface.remove_class(card, "hidden-project");
        }
        let firsts: Vec<_> = cards.iter().map(|c| surface.bounding_rect(c)).collect();

        let card = &open.card;
        surface.remove_class(card, "expanded");
        surface.remove_class(card, "expanding");
        surface.remove_class(card, "will-expand");
        surface.add_class(card, "collapsing");
        surface.set_attribute(card, "aria-expanded", "false");
        surface.remove_class(container, "expanded");
        surface.force_layout();

        let config = stage.config;
        let mut motions = Vec::with_capacity(cards.len());
        for (other, first) in cards.iter().zip(firsts) {
            let last = stage.surface.bounding_rect(other);
            let motion = Motion::collapse(
                FlipDelta::between(first, last),
                config.timings.collapse(),
                config.timings.fade(),
                COLLAPSE_BLUR_PX,
            );
            motions.push((other.clone(), stage.play(other, &motion)));
        }

        if let Some(panel) = stage.surface.query_within(card, ".project-details") {
            stage.surface.remove(&panel);
        }

        let id = self.next_collapse;
        self.next_collapse += 1;
        stage.timers.schedule(
            config.timings.collapse(),
            Task::FinishCollapse {
                card: card.clone(),
                collapse: id,
            },
        );
        self.collapsing.push(Collapse {
            card: card.clone(),
            id,
            restore: open.restore,
            motions,
        });

        tracing::debug!(project = %open.key, "card collapsing");
        Some(Closed {
            key: open.key,
            slug: open.slug,
        })
    }

    /// The expand transform `token` has run its course on `card`.
    ///
    /// Ignored unless `token` belongs to the current open. The inline motion
    /// stays if a newer motion (a reorder) replaced it.
    pub fn settle_expand<S>(&mut self, stage: &mut Stage<'_, S>, card: &N, token: MotionToken)
    where
        S: Surface<Node = N>,
    {
        let Some(open) = self.open.as_mut().filter(|open| {
            &open.card == card && open.token == token && open.phase == CardPhase::Expanding
        }) else {
            tracing::trace!("stale expand settle ignored");
            return;
        };
        stage.settle(card, token);
        stage.surface.remove_class(card, "expanding");
        stage.surface.remove_class(card, "will-expand");
        open.phase = CardPhase::Expanded;
        stage.timers.schedule(
            stage.config.timings.sibling_fade(),
            Task::FadeSiblings(card.clone()),
        );
    }

    /// Fade out the (already hidden) siblings of the open card.
    pub fn fade_siblings<S>(&self, stage: &mut Stage<'_, S>, container: &N, card: &N)
    where
        S: Surface<Node = N>,
    {
        if self.expanded_card() != Some(card) {
            return;
        }
        for sibling in stage.live_cards(container) {
            if &sibling != card {
                stage.surface.set_style(&sibling, "opacity", "0");
                stage.surface.set_style(&sibling, "pointer-events", "none");
            }
        }
    }

    /// Collapse `id` of `card` has run its course: put the card back, clear
    /// the motions the collapse started and release the scrollbar padding.
    ///
    /// A card reopened or closed again meanwhile stays where it is. Motions
    /// replaced since the collapse began keep running.
    pub fn finish_collapse<S>(&mut self, stage: &mut Stage<'_, S>, container: &N, card: &N, id: u64)
    where
        S: Surface<Node = N>,
    {
        let Some(i) = self
            .collapsing
            .iter()
            .position(|c| &c.card == card && c.id == id)
        else {
            tracing::trace!(id, "stale collapse finish ignored");
            return;
        };
        let Collapse {
            restore, motions, ..
        } = self.collapsing.remove(i);
        let reopened = self.expanded_card() == Some(card);
        let closed_again = self.collapsing.iter().any(|c| &c.card == card);

        if !reopened && !closed_again && stage.surface.is_attached(card) {
            match &restore {
                Restore::Before(key) => match stage.find_card(container, key).filter(|a| a != card) {
                    Some(anchor) => stage.surface.insert_before(container, card, &anchor),
                    None => stage.surface.append_child(container, card),
                },
                Restore::End => stage.surface.append_child(container, card),
                Restore::Stay => {}
            }
            stage.surface.remove_class(card, "collapsing");
        }

        for (other, token) in &motions {
            if self.expanded_card() == Some(other) {
                continue;
            }
            stage.settle(other, *token);
            stage.surface.clear_style(other, "pointer-events");
        }

        if self.padded
            && self.collapsing.is_empty()
            && let Some(body) = stage.surface.query(&stage.config.selectors.body)
        {
            stage.surface.clear_style(&body, "padding-right");
            self.padded = false;
        }
        tracing::trace!(id, ?restore, reopened, closed_again, "collapse finished");
    }

    /// Show the screenshot at `index` (wrapping) in the open card.
    ///
    /// The image fades out now and swaps its source after the swap delay.
    /// Returns the selected index.
    pub fn show_slide<S>(&mut self, stage: &mut Stage<'_, S>, index: isize) -> Option<usize>
    where
        S: Surface<Node = N>,
    {
        let open = self.open.as_mut()?;
        let slider = open.slider.as_mut()?;
        let src = slider.show(index).to_owned();
        let selected = slider.index();
        let image = stage.surface.query_within(&open.card, "img.current")?;
        stage.surface.add_class(&image, "fade-out");
        stage
            .timers
            .schedule(stage.config.timings.slide_swap(), Task::SwapSlide { image, src });
        Some(selected)
    }

    /// Show the screenshot `offset` steps away from the current one.
    pub fn step_slide<S>(&mut self, stage: &mut Stage<'_, S>, offset: isize) -> Option<usize>
    where
        S: Surface<Node = N>,
    {
        let current = isize::try_from(self.slider()?.index()).unwrap_or(0);
        self.show_slide(stage, current.saturating_add(offset))
    }

    /// Toggle one solution item of the open card. Items toggle
    /// independently: opening one leaves the others as they are.
    pub fn toggle_solution<S>(&self, surface: &mut S, index: usize) -> bool
    where
        S: Surface<Node = N>,
    {
        let Some(open) = &self.open else {
            return false;
        };
        let wanted = index.to_string();
        let Some(item) = surface
            .query_all_within(&open.card, ".solution-item")
            .into_iter()
            .find(|item| surface.attribute(item, INDEX_ATTRIBUTE).as_deref() == Some(wanted.as_str()))
        else {
            tracing::debug!(index, "no such solution item");
            return false;
        };
        toggle_class(surface, &item, "active");
        if let Some(desc) = surface.query_within(&item, ".solution-desc") {
            toggle_class(surface, &desc, "show");
        }
        true
    }

    /// Keep the back control on the open card's corner.
    pub fn track_back_control<S>(&self, surface: &mut S)
    where
        S: Surface<Node = N>,
    {
        if let Some(open) = &self.open
            && let Some(back) = &open.back
        {
            place_back_control(surface, back, &open.card);
        }
    }
}

/// Finish a screenshot swap started by [`ExpansionMachine::show_slide`].
pub fn swap_slide<S: Surface>(surface: &mut S, image: &S::Node, src: &str) {
    surface.set_attribute(image, "src", src);
    surface.remove_class(image, "fade-out");
}

fn toggle_class<S: Surface>(surface: &mut S, node: &S::Node, class: &str) {
    if surface.has_class(node, class) {
        surface.remove_class(node, class);
    } else {
        surface.add_class(node, class);
    }
}

fn next_live_key<S: Surface>(stage: &Stage<'_, S>, container: &S::Node, card: &S::Node) -> Option<String> {
    let live = stage.live_cards(container);
    let position = live.iter().position(|c| c == card)?;
    live.get(position + 1)
        .and_then(|next| stage.surface.card_key(next))
}

fn place_back_control<S: Surface>(surface: &mut S, back: &S::Node, card: &S::Node) {
    let rect = surface.bounding_rect(card);
    let top = rect.top.max(0.0) + BACK_CONTROL_INSET;
    let left = rect.left + BACK_CONTROL_INSET;
    surface.set_style(back, "top", &format!("{top}px"));
    surface.set_style(back, "left", &format!("{left}px"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use crate::project::Solution;
    use crate::renderer;
    use crate::schedule::TimerQueue;
    use crate::surface::memory::{MemorySurface, NodeId};
    use crate::task::MotionLedger;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::time::Duration;

    const MS_1300: Duration = Duration::from_millis(1300);

    struct Fixture {
        surface: MemorySurface,
        timers: TimerQueue<Task<NodeId>>,
        motions: MotionLedger<NodeId>,
        config: GalleryConfig,
        container: NodeId,
        machine: ExpansionMachine<NodeId>,
        projects: Vec<Project>,
    }

    impl Fixture {
        fn new(surface: MemorySurface) -> Self {
            let container = surface.query("#projectsContainer").unwrap();
            let projects = vec![
                Project {
                    screenshots: vec!["1.png".into(), "2.png".into(), "3.png".into()],
                    solutions: vec![
                        Solution {
                            title: "one".into(),
                            description: "first".into(),
                        },
                        Solution {
                            title: "two".into(),
                            description: "second".into(),
                        },
                    ],
                    link: Some("shop-x".into()),
                    ..Project::named("a")
                },
                Project::named("b"),
                Project::named("c"),
                Project::named("d"),
            ];
            let mut fixture = Self {
                surface,
                timers: TimerQueue::new(),
                motions: MotionLedger::new(),
                config: GalleryConfig::default(),
                container,
                machine: ExpansionMachine::new(),
                projects,
            };
            let desired: Vec<&Project> = fixture.projects.iter().collect();
            let mut stage = Stage {
                surface: &mut fixture.surface,
                timers: &mut fixture.timers,
                motions: &mut fixture.motions,
                config: &fixture.config,
            };
            renderer::render(&mut stage, &container, &desired);
            fixture
        }

        fn card(&self, i: usize) -> NodeId {
            self.surface.cards(&self.container)[i]
        }

        fn open(&mut self, i: usize) -> bool {
            let card = self.card(i);
            let mut stage = Stage {
                surface: &mut self.surface,
                timers: &mut self.timers,
                motions: &mut self.motions,
                config: &self.config,
            };
            let project = self
                .projects
                .iter()
                .find(|p| stage.surface.card_key(&card).as_deref() == Some(p.name.as_str()))
                .unwrap();
            self.machine.open(&mut stage, &self.container, project, &card)
        }

        fn close(&mut self) -> Option<Closed> {
            let mut stage = Stage {
                surface: &mut self.surface,
                timers: &mut self.timers,
                motions: &mut self.motions,
                config: &self.config,
            };
            self.machine.close(&mut stage, &self.container)
        }

        fn advance(&mut self, until: Duration) {
            while let Some(task) = self.timers.pop_due(until) {
                let mut stage = Stage {
                    surface: &mut self.surface,
                    timers: &mut self.timers,
                    motions: &mut self.motions,
                    config: &self.config,
                };
                match task {
                    Task::Sequence(seq) => stage.run_sequence(seq),
                    Task::SettleExpand { card, token } => {
                        self.machine.settle_expand(&mut stage, &card, token);
                    }
                    Task::FadeSiblings(card) => self.machine.fade_siblings(&mut stage, &self.container, &card),
                    Task::FinishCollapse { card, collapse } => {
                        self.machine
                            .finish_collapse(&mut stage, &self.container, &card, collapse);
                    }
                    Task::SwapSlide { image, src } => swap_slide(stage.surface, &image, &src),
                    Task::RemoveCard(card) => stage.surface.remove(&card),
                    Task::SettleReflow { card, token } => {
                        stage.settle(&card, token);
                    }
                    Task::RetryOpen(_) => {}
                }
            }
            self.timers.settle_at(until);
        }

        fn expanded_count(&self) -> usize {
            self.surface
                .cards(&self.container)
                .iter()
                .filter(|c| self.surface.has_class(c, "expanded"))
                .count()
        }
    }

    #[test]
    fn slider_wraps_both_directions() {
        let mut slider = Slider::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(slider.show(-1), "c");
        assert_eq!(slider.index(), 2);
        assert_eq!(slider.show(3), "a");
        assert_eq!(slider.index(), 0);
        assert_eq!(slider.step(-1), "c");
        assert_eq!(slider.step(1), "a");
        assert!(Slider::new(Vec::new()).is_none());
    }

    #[test]
    fn open_hides_siblings_and_builds_panel() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        assert!(f.open(0));
        let card = f.card(0);
        assert_eq!(f.machine.expanded_key(), Some("a"));
        assert_eq!(f.machine.phase_of(&card), CardPhase::Expanding);
        assert!(f.surface.has_class(&card, "expanded"));
        assert!(f.surface.has_class(&card, "expanding"));
        assert_eq!(f.surface.attribute(&card, "aria-expanded").as_deref(), Some("true"));
        assert!(f.surface.query_within(&card, ".project-details").is_some());
        assert!(f.surface.has_class(&f.container, "expanded"));
        for i in 1..4 {
            assert!(f.surface.has_class(&f.card(i), "hidden-project"));
        }
        assert!(f.surface.query(".back-floating").is_some());
        assert!(f.surface.viewport_watched());
    }

    #[test]
    fn open_plays_scaled_flip_from_collapsed_box() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        f.surface.take_motions();
        f.open(1);
        let motions = f.surface.take_motions();
        assert_eq!(motions.len(), 1);
        let g = *f.surface.layout();
        let from = motions[0].motion.from.transform.clone().unwrap();
        // Siblings hidden first, so the card starts in the first cell.
        let sx = g.cell_width / (g.columns as f64 * g.cell_width + (g.columns as f64 - 1.0) * g.gap);
        let sy = g.cell_height / g.expanded_height;
        assert_eq!(from, format!("translate(0px, 0px) scale({sx}, {sy})"));
        assert_eq!(motions[0].motion.transition.total(), MS_1300);
    }

    #[test]
    fn opening_an_open_card_is_a_no_op() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        assert!(f.open(0));
        assert!(!f.open(0));
        assert_eq!(f.expanded_count(), 1);
    }

    #[test]
    fn opening_another_card_closes_the_first() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        f.open(0);
        let a = f.card(0);
        f.open(2);
        assert_eq!(f.expanded_count(), 1);
        assert_eq!(f.machine.expanded_key(), Some("c"));
        assert_eq!(f.machine.phase_of(&a), CardPhase::Collapsing);
        assert!(f.surface.query_within(&a, ".project-details").is_none());
        assert_eq!(f.surface.query_all_within(&f.surface.query("body").unwrap(), ".back-floating").len(), 1);
    }

    #[test]
    fn expand_settles_then_fades_siblings() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        f.open(0);
        let card = f.card(0);
        f.advance(MS_1300);
        assert_eq!(f.machine.phase_of(&card), CardPhase::Expanded);
        assert!(!f.surface.has_class(&card, "expanding"));
        assert_eq!(f.surface.style(&card, "transform"), None);
        assert_eq!(f.surface.style(&f.card(1), "opacity"), None);
        f.advance(Duration::from_millis(1500));
        assert_eq!(f.surface.style(&f.card(1), "opacity"), Some("0"));
        assert_eq!(f.surface.style(&f.card(1), "pointer-events"), Some("none"));
    }

    #[test]
    fn close_reflows_every_card_and_restores() {
        let mut f = Fixture::new(MemorySurface::gallery_page().with_scrollbar_width(15.0));
        f.open(1);
        f.advance(Duration::from_secs(2));
        f.surface.take_motions();

        let closed = f.close().unwrap();
        assert_eq!(closed, Closed { key: "b".into(), slug: None });
        let card = f.card(1);
        assert!(f.surface.has_class(&card, "collapsing"));
        assert!(!f.surface.has_class(&card, "expanded"));
        assert!(!f.surface.has_class(&f.container, "expanded"));
        assert!(f.surface.query(".back-floating").is_none());
        assert!(!f.surface.viewport_watched());
        assert_eq!(f.surface.motions().len(), 4, "every card animates");
        assert!(f.surface.query_within(&card, ".project-details").is_none());
        let body = f.surface.query("body").unwrap();
        assert_eq!(f.surface.style(&body, "padding-right"), Some("15px"));
        assert!(f.machine.is_padded());

        f.advance(Duration::from_secs(2) + MS_1300);
        assert!(!f.surface.has_class(&card, "collapsing"));
        assert_eq!(f.machine.phase_of(&card), CardPhase::Collapsed);
        for c in f.surface.cards(&f.container) {
            assert_eq!(f.surface.style(&c, "opacity"), None);
            assert_eq!(f.surface.style(&c, "transform"), None);
        }
        assert_eq!(f.surface.style(&body, "padding-right"), None);
        let keys: Vec<_> = f
            .surface
            .cards(&f.container)
            .iter()
            .filter_map(|c| f.surface.card_key(c))
            .collect();
        assert_eq!(keys, ["a", "b", "c", "d"]);
    }

    #[test]
    fn collapse_falls_back_to_end_when_anchor_is_gone() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        f.open(1);
        let b = f.card(1);
        let c = f.card(2);
        f.surface.remove(&c);
        f.close();
        f.advance(MS_1300);
        assert_eq!(f.surface.cards(&f.container).last(), Some(&b));
    }

    #[test]
    fn reorder_during_collapse_keeps_the_new_order() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        f.open(1);
        f.close();
        let b = f.card(1);
        f.surface.append_child(&f.container, &b);
        f.machine.forget_anchor();
        f.advance(MS_1300);
        let keys: Vec<_> = f
            .surface
            .cards(&f.container)
            .iter()
            .filter_map(|c| f.surface.card_key(c))
            .collect();
        assert_eq!(keys, ["a", "c", "d", "b"]);
    }

    #[test]
    fn second_close_is_finished_by_its_own_task() {
        let mut f = Fixture::new(MemorySurface::gallery_page().with_scrollbar_width(15.0));
        let body = f.surface.query("body").unwrap();
        f.open(1);
        let b = f.card(1);
        let c = f.card(2);
        f.advance(Duration::from_secs(2));
        f.close();
        f.advance(Duration::from_millis(2300));
        assert!(f.open(1));
        f.advance(Duration::from_millis(2600));
        f.close();

        // The first close's task is due here.
        f.advance(Duration::from_millis(3300));
        assert_eq!(f.machine.phase_of(&b), CardPhase::Collapsing);
        assert!(f.surface.has_class(&b, "collapsing"));
        assert!(f.surface.style(&b, "transform").is_some());
        assert!(f.surface.style(&c, "transform").is_some());
        assert_eq!(f.surface.style(&body, "padding-right"), Some("15px"));

        f.advance(Duration::from_millis(3900));
        assert_eq!(f.machine.phase_of(&b), CardPhase::Collapsed);
        assert!(!f.surface.has_class(&b, "collapsing"));
        for card in f.surface.cards(&f.container) {
            assert_eq!(f.surface.style(&card, "transform"), None);
            assert_eq!(f.surface.style(&card, "transition"), None);
        }
        assert_eq!(f.surface.style(&body, "padding-right"), None);
        assert!(f.motions.is_empty());
    }

    #[test]
    fn reopened_card_keeps_its_new_expand_motion() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        f.open(0);
        let a = f.card(0);
        f.advance(Duration::from_millis(100));
        f.close();
        f.advance(Duration::from_millis(200));
        assert!(f.open(0));

        // The first open's settle is due here; this open runs until 1500.
        f.advance(MS_1300);
        assert_eq!(f.machine.phase_of(&a), CardPhase::Expanding);
        assert!(f.surface.has_class(&a, "expanding"));
        assert!(f.surface.style(&a, "transform").is_some());

        f.advance(Duration::from_millis(1500));
        assert_eq!(f.machine.phase_of(&a), CardPhase::Expanded);
        assert_eq!(f.surface.style(&a, "transform"), None);
    }

    #[test]
    fn close_without_open_card_is_none() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        assert!(f.close().is_none());
        f.open(0);
        assert!(f.close().is_some());
        assert!(f.close().is_none());
    }

    #[test]
    fn stale_expand_settle_is_ignored() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        f.open(0);
        let card = f.card(0);
        f.close();
        f.advance(MS_1300);
        assert!(!f.surface.has_class(&card, "expanded"));
        assert_eq!(f.machine.phase_of(&card), CardPhase::Collapsed);
    }

    #[test]
    fn slides_fade_then_swap() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        f.open(0);
        let card = f.card(0);
        let image = f.surface.query_within(&card, "img.current").unwrap();
        let mut stage = Stage {
            surface: &mut f.surface,
            timers: &mut f.timers,
            motions: &mut f.motions,
            config: &f.config,
        };
        assert_eq!(f.machine.step_slide(&mut stage, -1), Some(2));
        assert!(f.surface.has_class(&image, "fade-out"));
        assert_eq!(f.surface.attribute(&image, "src").as_deref(), Some("1.png"));
        f.advance(Duration::from_millis(220));
        assert!(!f.surface.has_class(&image, "fade-out"));
        assert_eq!(f.surface.attribute(&image, "src").as_deref(), Some("3.png"));
        assert_eq!(f.machine.slider().map(Slider::current), Some("3.png"));
    }

    #[test]
    fn solutions_toggle_independently() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        f.open(0);
        let card = f.card(0);
        assert!(f.machine.toggle_solution(&mut f.surface, 0));
        assert!(f.machine.toggle_solution(&mut f.surface, 1));
        let items = f.surface.query_all_within(&card, ".solution-item");
        let descs = f.surface.query_all_within(&card, ".solution-desc");
        assert!(items.iter().all(|i| f.surface.has_class(i, "active")));
        assert!(descs.iter().all(|d| f.surface.has_class(d, "show")));

        assert!(f.machine.toggle_solution(&mut f.surface, 0));
        assert!(!f.surface.has_class(&items[0], "active"));
        assert!(f.surface.has_class(&items[1], "active"));
        assert!(!f.machine.toggle_solution(&mut f.surface, 7));
    }

    #[test]
    fn back_control_follows_the_card() {
        let mut f = Fixture::new(MemorySurface::gallery_page());
        f.open(0);
        let back = f.surface.query(".back-floating").unwrap();
        let top = f.surface.layout().top + BACK_CONTROL_INSET;
        assert_eq!(f.surface.style(&back, "top"), Some(format!("{top}px").as_str()));
        f.surface.set_style(&back, "top", "0px");
        f.machine.track_back_control(&mut f.surface);
        assert_eq!(f.surface.style(&back, "top"), Some(format!("{top}px").as_str()));
    }

    proptest! {
        #[test]
        fn at_most_one_card_is_expanded(ops in prop::collection::vec((0usize..5, 0u64..2000), 1..24)) {
            let mut f = Fixture::new(MemorySurface::gallery_page());
            let mut now = Duration::ZERO;
            for (op, wait) in ops {
                if op == 4 {
                    f.close();
                } else {
                    f.open(op);
                }
                prop_assert!(f.expanded_count() <= 1);
                now += Duration::from_millis(wait);
                f.advance(now);
                prop_assert!(f.expanded_count() <= 1);
                prop_assert_eq!(f.expanded_count(), usize::from(f.machine.expanded_key().is_some()));
            }
        }
    }
}
