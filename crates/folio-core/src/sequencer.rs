#![forbid(unsafe_code)]

//! Staged class toggling.
//!
//! A [`Sequence`] is an ordered list of [`Cue`]s. Firing a cue adds its
//! class(es) to the resolved target(s) and reports how long to wait before
//! the next cue. The owner schedules the remaining sequence on its timer
//! queue, so one sequence is one chain of continuations.
//!
//! # Invariants
//!
//! 1. Cues fire strictly in order, one per [`Sequence::fire`] call.
//! 2. A step without its own delay waits the sequence's default delay.
//! 3. A parallel cue applies all members at once and waits the longest
//!    member delay (zero for an empty group).
//! 4. Missing or detached targets are skipped; the chain continues.
//!
//! # Failure Modes
//!
//! - Selector matches nothing: the step is a no-op.
//! - Node target was removed: the class is added to the detached node,
//!   which has no visible effect.

use std::time::Duration;

use crate::surface::Surface;

/// What a step applies its class to.
#[derive(Debug, Clone, PartialEq)]
pub enum Target<N> {
    /// First element matching a selector, resolved when the step fires.
    Selector(String),
    /// A specific element.
    Node(N),
}

/// Add `class` to `target`, then wait `delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<N> {
    pub target: Target<N>,
    pub class: String,
    pub delay: Option<Duration>,
}

impl<N> Step<N> {
    #[must_use]
    pub fn selector(selector: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            target: Target::Selector(selector.into()),
            class: class.into(),
            delay: None,
        }
    }

    #[must_use]
    pub fn node(node: N, class: impl Into<String>) -> Self {
        Self {
            target: Target::Node(node),
            class: class.into(),
            delay: None,
        }
    }

    /// Override the wait after this step (builder pattern).
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn wait(&self, default: Duration) -> Duration {
        self.delay.unwrap_or(default)
    }
}

/// One entry of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue<N> {
    Single(Step<N>),
    Parallel(Vec<Step<N>>),
}

impl<N> Cue<N> {
    /// Wait before the following cue.
    #[must_use]
    pub fn wait(&self, default: Duration) -> Duration {
        match self {
            Self::Single(step) => step.wait(default),
            Self::Parallel(steps) => steps
                .iter()
                .map(|s| s.wait(default))
                .max()
                .unwrap_or(Duration::ZERO),
        }
    }
}

/// An in-flight chain of cues.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<N> {
    cues: Vec<Cue<N>>,
    cursor: usize,
    default_delay: Duration,
}

impl<N: Clone> Sequence<N> {
    /// Empty sequence whose steps wait `default_delay` unless told otherwise.
    #[must_use]
    pub fn new(default_delay: Duration) -> Self {
        Self {
            cues: Vec::new(),
            cursor: 0,
            default_delay,
        }
    }

    /// Append a single step (builder pattern).
    #[must_use]
    pub fn then(mut self, step: Step<N>) -> Self {
        self.cues.push(Cue::Single(step));
        self
    }

    /// Append a parallel group (builder pattern).
    #[must_use]
    pub fn then_together(mut self, steps: Vec<Step<N>>) -> Self {
        self.cues.push(Cue::Parallel(steps));
        self
    }

    /// Append a single step (mutating).
    pub fn push(&mut self, step: Step<N>) {
        self.cues.push(Cue::Single(step));
    }

    #[must_use]
    pub fn cues(&self) -> &[Cue<N>] {
        &self.cues
    }

    /// Cues not yet fired.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cues.len().saturating_sub(self.cursor)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Fire the next cue.
    ///
    /// Returns the wait before the following cue, or `None` once the
    /// sequence is exhausted (nothing left to schedule).
    pub fn fire<S>(&mut self, surface: &mut S) -> Option<Duration>
    where
        S: Surface<Node = N>,
    {
        let cue = self.cues.get(self.cursor)?;
        match cue {
            Cue::Single(step) => apply(surface, step),
            Cue::Parallel(steps) => {
                for step in steps {
                    apply(surface, step);
                }
            }
        }
        let wait = cue.wait(self.default_delay);
        self.cursor += 1;
        (!self.is_finished()).then_some(wait)
    }
}

fn apply<S: Surface>(surface: &mut S, step: &Step<S::Node>) {
    let node = match &step.target {
        Target::Selector(selector) => surface.query(selector),
        Target::Node(node) => Some(node.clone()),
    };
    match node {
        Some(node) => {
            tracing::trace!(class = %step.class, "sequence step");
            surface.add_class(&node, &step.class);
        }
        None => tracing::trace!(class = %step.class, "sequence step skipped: no target"),
    }
}
