#![forbid(unsafe_code)]

//! List renderer and FLIP reflow.
//!
//! [`render`] reconciles the live card set against a desired project list by
//! identity key; [`reflow`] handles the pure-reorder case by moving the
//! existing nodes and animating them from their old slots.
//!
//! # Invariants
//!
//! 1. A card whose key stays in the desired list is never rebuilt.
//! 2. A leaving card is marked `hide` at once and detached only after the
//!    exit delay. While leaving it is no longer live: a project that comes
//!    back in the meantime gets a fresh card.
//! 3. Reflow measures every First box before moving anything, and every Last
//!    box after a single layout flush.
//! 4. Cards that did not move get no motion at all.

use std::time::Duration;

use crate::config::{Selectors, Timings};
use crate::flip::{FlipDelta, Motion};
use crate::project::Project;
use crate::sequencer::{Sequence, Step};
use crate::surface::Surface;
use crate::task::{Stage, Task};
use crate::view::card_markup;

const HEADER_HOLD: Duration = Duration::from_millis(300);
const CONTAINER_HOLD: Duration = Duration::from_millis(500);
const LOGO_HOLD: Duration = Duration::from_millis(300);
const CTA_HOLD: Duration = Duration::from_millis(600);
const ENCORE_HOLD: Duration = Duration::from_millis(1000);

/// What [`render`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome<N> {
    /// Cards built in this pass, in desired order.
    pub created: Vec<N>,
    /// Cards marked for removal.
    pub leaving: Vec<N>,
}

/// The entrance choreography: page chrome first, then each new card in
/// turn, then a second reveal of the logo and call to action.
#[must_use]
pub fn entrance<N: Clone>(selectors: &Selectors, timings: &Timings, cards: &[N]) -> Sequence<N> {
    let mut sequence = Sequence::new(timings.step())
        .then(Step::selector(selectors.header.as_str(), "show").delay(HEADER_HOLD))
        .then(Step::selector(selectors.container.as_str(), "ready").delay(CONTAINER_HOLD))
        .then(Step::selector(selectors.logo.as_str(), "show").delay(LOGO_HOLD))
        .then(Step::selector(selectors.cta_circle.as_str(), "show").delay(CTA_HOLD));
    for card in cards {
        sequence.push(Step::node(card.clone(), "show").delay(timings.card_stagger()));
    }
    sequence
        .then(Step::selector(selectors.logo.as_str(), "show").delay(ENCORE_HOLD))
        .then(Step::selector(selectors.cta_button.as_str(), "show").delay(ENCORE_HOLD))
}

/// Reconcile the cards in `container` with `desired`.
///
/// Leaving cards switch `show` for `hide` and are removed after the exit
/// delay. Missing projects get new cards. Live cards end up in desired
/// order, then the entrance sequence reveals the new ones.
pub fn render<S: Surface>(
    stage: &mut Stage<'_, S>,
    container: &S::Node,
    desired: &[&Project],
) -> RenderOutcome<S::Node> {
    let mut outcome = RenderOutcome {
        created: Vec::new(),
        leaving: Vec::new(),
    };

    for card in stage.live_cards(container) {
        let key = stage.surface.card_key(&card);
        let wanted = key
            .as_deref()
            .is_some_and(|key| desired.iter().any(|p| p.name == key));
        if !wanted {
            stage.surface.remove_class(&card, "show");
            stage.surface.add_class(&card, "hide");
            stage
                .timers
                .schedule(stage.config.timings.exit(), Task::RemoveCard(card.clone()));
            outcome.leaving.push(card);
        }
    }

    for project in desired {
        let card = match stage.find_card(container, &project.name) {
            Some(card) => card,
            None => {
                let Some(card) = stage.surface.build(&card_markup(project)) else {
                    tracing::debug!(project = %project.name, "card could not be built");
                    continue;
                };
                outcome.created.push(card.clone());
                card
            }
        };
        stage.surface.append_child(container, &card);
    }

    tracing::debug!(
        created = outcome.created.len(),
        leaving = outcome.leaving.len(),
        "cards reconciled"
    );

    let sequence = entrance(&stage.config.selectors, &stage.config.timings, &outcome.created);
    stage.run_sequence(sequence);
    outcome
}

/// Reorder the live cards to match `desired` and animate the move.
///
/// Returns the number of cards that received a motion.
pub fn reflow<S: Surface>(
    stage: &mut Stage<'_, S>,
    container: &S::Node,
    desired: &[&Project],
) -> usize {
    let cards = stage.live_cards(container);
    let firsts: Vec<_> = cards
        .iter()
        .map(|card| stage.surface.bounding_rect(card))
        .collect();

    for project in desired {
        if let Some(card) = stage.find_card(container, &project.name) {
            stage.surface.append_child(container, &card);
        }
    }
    stage.surface.force_layout();

    let duration = stage.config.timings.reflow();
    let mut moved = 0;
    for (card, first) in cards.iter().zip(firsts) {
        let last = stage.surface.bounding_rect(card);
        let delta = FlipDelta::translation(first, last);
        if !delta.has_offset() {
            continue;
        }
        let token = stage.play(card, &Motion::reflow(delta, duration));
        stage.timers.schedule(
            duration,
            Task::SettleReflow {
                card: card.clone(),
                token,
            },
        );
        moved += 1;
    }
    tracing::debug!(moved, "cards reflowed");
    moved
}
