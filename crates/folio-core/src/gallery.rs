#![forbid(unsafe_code)]

//! The gallery controller.
//!
//! [`Gallery`] owns every piece of mutable state: the page surface, the
//! history, the timer queue, the open card and the lightbox. The host drives
//! it without threads or blocking:
//!
//! 1. [`Gallery::start`] once, after the page is ready.
//! 2. [`Gallery::push_event`] for every routed DOM event.
//! 3. [`Gallery::advance_time`] / [`Gallery::set_time`] from the frame clock.
//! 4. [`Gallery::step`] to run due continuations and queued events.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use folio_core::{Gallery, GalleryConfig, GalleryEvent, MemoryHistory, MemorySurface, ProjectCatalog};
//!
//! let catalog = ProjectCatalog::from_json(r#"[{"name": "Shop X", "link": "shop-x"}]"#).unwrap();
//! let mut gallery = Gallery::new(
//!     catalog,
//!     GalleryConfig::default(),
//!     MemorySurface::gallery_page(),
//!     MemoryHistory::default(),
//! );
//! gallery.start().unwrap();
//!
//! gallery.push_event(GalleryEvent::card("Shop X"));
//! gallery.advance_time(Duration::from_millis(16));
//! gallery.step();
//! assert_eq!(gallery.expanded_key(), Some("Shop X"));
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use crate::config::GalleryConfig;
use crate::error::FolioError;
use crate::event::GalleryEvent;
use crate::expansion::{self, ExpansionMachine};
use crate::filter::{ALL_CATEGORIES, Category, FilterState, SortOrder, same_members};
use crate::lightbox::Lightbox;
use crate::project::ProjectCatalog;
use crate::renderer;
use crate::schedule::TimerQueue;
use crate::surface::Surface;
use crate::task::{MotionLedger, Stage, Task};
use crate::url_sync::{History, UrlSync};

/// Borrow the stage fields of a gallery without borrowing the rest.
macro_rules! stage {
    ($gallery:expr) => {
        Stage {
            surface: &mut $gallery.surface,
            timers: &mut $gallery.timers,
            motions: &mut $gallery.motions,
            config: &$gallery.config,
        }
    };
}

/// Result of a single [`Gallery::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepResult {
    /// Number of events processed during this step.
    pub events_processed: u32,
    /// Number of timer tasks run during this step.
    pub tasks_run: u32,
    /// Tasks still waiting on the clock.
    pub pending_tasks: usize,
    /// When the earliest pending task is due.
    pub next_due: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

/// A portfolio gallery bound to one page.
pub struct Gallery<S: Surface, H: History> {
    catalog: ProjectCatalog,
    config: GalleryConfig,
    surface: S,
    url: UrlSync<H>,
    timers: TimerQueue<Task<S::Node>>,
    motions: MotionLedger<S::Node>,
    events: VecDeque<GalleryEvent>,
    expansion: ExpansionMachine<S::Node>,
    lightbox: Lightbox<S::Node>,
    container: Option<S::Node>,
    filter: FilterState,
    clock: Duration,
    started: bool,
}

impl<S: Surface, H: History> Gallery<S, H> {
    /// Create a gallery. Nothing touches the page until [`start`](Self::start).
    #[must_use]
    pub fn new(catalog: ProjectCatalog, config: GalleryConfig, surface: S, history: H) -> Self {
        let filter = FilterState::new(Category::All, config.initial_sort);
        Self {
            catalog,
            config,
            surface,
            url: UrlSync::new(history),
            timers: TimerQueue::new(),
            motions: MotionLedger::new(),
            events: VecDeque::new(),
            expansion: ExpansionMachine::new(),
            lightbox: Lightbox::new(),
            container: None,
            filter,
            clock: Duration::ZERO,
            started: false,
        }
    }

    /// Bind to the page and render the first frame.
    ///
    /// Sets the sort control to the initial order, renders the filtered list
    /// with its entrance sequence and opens the project named by the current
    /// path, if any.
    ///
    /// # Errors
    ///
    /// [`FolioError::MissingElement`] when the card container is absent.
    pub fn start(&mut self) -> Result<(), FolioError> {
        if self.started {
            tracing::debug!("gallery already started");
            return Ok(());
        }
        let selector = &self.config.selectors.container;
        let container = self
            .surface
            .query(selector)
            .ok_or_else(|| FolioError::MissingElement(selector.clone()))?;
        self.container = Some(container);
        self.started = true;

        self.surface.set_control_value(
            &self.config.selectors.sort_select,
            self.config.initial_sort.control_value(),
        );
        self.apply_filters();
        tracing::info!(projects = self.catalog.len(), "gallery started");

        if let Some(slug) = self.url.current_slug() {
            self.open_link(&slug, Attempt::First);
        }
        Ok(())
    }

    /// Queue an event for the next [`step`](Self::step).
    pub fn push_event(&mut self, event: GalleryEvent) {
        self.events.push_back(event);
    }

    /// Move the clock forward by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.clock = self.clock.saturating_add(dt);
    }

    /// Set the clock to `now`. Earlier values are ignored.
    pub fn set_time(&mut self, now: Duration) {
        self.clock = self.clock.max(now);
    }

    /// Run due tasks, then queued events, then anything those made due.
    ///
    /// Before [`start`](Self::start) this does nothing and keeps the events
    /// queued.
    pub fn step(&mut self) -> StepResult {
        if !self.started {
            return StepResult {
                pending_tasks: self.timers.len(),
                next_due: self.timers.next_due(),
                ..StepResult::default()
            };
        }

        let mut tasks_run = self.run_due_tasks();
        let mut events_processed: u32 = 0;
        while let Some(event) = self.events.pop_front() {
            events_processed += 1;
            self.handle_event(event);
        }
        tasks_run += self.run_due_tasks();

        StepResult {
            events_processed,
            tasks_run,
            pending_tasks: self.timers.len(),
            next_due: self.timers.next_due(),
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Recompute the desired list from the controls and bring the page to it.
    ///
    /// Same members: reorder in place with a FLIP. Different members: full
    /// reconcile with an entrance sequence.
    pub fn apply_filters(&mut self) {
        let Some(container) = self.container.clone() else {
            return;
        };
        let selectors = &self.config.selectors;
        let category = self
            .surface
            .control_value(&selectors.filter_select)
            .map(|value| Category::from_control_value(&value))
            .unwrap_or_default();
        let sort = self
            .surface
            .control_value(&selectors.sort_select)
            .map_or(self.config.initial_sort, |value| {
                SortOrder::from_control_value(&value)
            });
        self.filter = FilterState::new(category, sort);

        let desired = self.filter.apply(self.catalog.as_slice());
        let mut stage = stage!(self);
        let live: Vec<String> = stage
            .live_cards(&container)
            .iter()
            .filter_map(|card| stage.surface.card_key(card))
            .collect();
        let names: Vec<&str> = desired.iter().map(|p| p.name.as_str()).collect();

        if same_members(&live, &names) {
            renderer::reflow(&mut stage, &container, &desired);
        } else {
            renderer::render(&mut stage, &container, &desired);
        }
        self.expansion.forget_anchor();
    }

    /// Open the card of the project named `key`, then record its slug.
    ///
    /// Returns `false` when the project is unknown, its card is not on the
    /// page or it is already open.
    pub fn open(&mut self, key: &str) -> bool {
        let Some(container) = self.container.clone() else {
            return false;
        };
        let Some(project) = self.catalog.by_name(key) else {
            tracing::debug!(key, "open: unknown project");
            return false;
        };
        let mut stage = stage!(self);
        let Some(card) = stage.find_card(&container, key) else {
            tracing::debug!(key, "open: card not rendered");
            return false;
        };
        if !self.expansion.open(&mut stage, &container, project, &card) {
            return false;
        }
        self.url.after_open(project.slug());
        true
    }

    /// Close the open card, then return the path to root.
    ///
    /// Returns `false` when nothing was open.
    pub fn close(&mut self) -> bool {
        let Some(container) = self.container.clone() else {
            return false;
        };
        let mut stage = stage!(self);
        if self.expansion.close(&mut stage, &container).is_none() {
            return false;
        }
        self.url.after_close();
        true
    }

    /// Open the project whose slug is `slug`.
    ///
    /// If its card is not rendered, the category filter is reset and the
    /// open is retried once after the retry delay, provided the location
    /// still names `slug` by then.
    pub fn open_slug(&mut self, slug: &str) {
        self.open_link(slug, Attempt::First);
    }

    /// Show the screenshot at `index` (wrapping) in the open card.
    pub fn show_slide(&mut self, index: isize) -> Option<usize> {
        let mut stage = stage!(self);
        self.expansion.show_slide(&mut stage, index)
    }

    fn open_link(&mut self, slug: &str, attempt: Attempt) {
        let Some(project) = self.catalog.by_slug(slug) else {
            tracing::debug!(slug, "unknown slug ignored");
            return;
        };
        let key = project.name.clone();
        let rendered = match &self.container {
            Some(container) => stage!(self).find_card(container, &key).is_some(),
            None => false,
        };
        if rendered {
            self.open(&key);
            return;
        }
        match attempt {
            Attempt::First => {
                if self.filter.category != Category::All {
                    self.surface
                        .set_control_value(&self.config.selectors.filter_select, ALL_CATEGORIES);
                }
                self.apply_filters();
                self.timers
                    .schedule(self.config.timings.retry(), Task::RetryOpen(slug.to_owned()));
            }
            Attempt::Retry => {
                tracing::warn!(slug, "deep link target never rendered");
            }
        }
    }

    fn pop_state(&mut self) {
        match self.url.current_slug() {
            Some(slug) => self.open_link(&slug, Attempt::First),
            None => {
                self.close();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn handle_event(&mut self, event: GalleryEvent) {
        tracing::trace!(?event, "event");
        match event {
            GalleryEvent::CardClicked { key } => {
                self.open(&key);
            }
            GalleryEvent::CloseRequested => {
                self.close();
            }
            GalleryEvent::FilterChanged | GalleryEvent::SortChanged => self.apply_filters(),
            GalleryEvent::SlidePrev => self.step_slide(-1),
            GalleryEvent::SlideNext => self.step_slide(1),
            GalleryEvent::ScreenshotClicked => {
                if let Some(src) = self.expansion.slider().map(|s| s.current().to_owned()) {
                    self.lightbox
                        .open(&mut self.surface, &self.config.selectors.body, &src);
                }
            }
            GalleryEvent::SolutionToggled { index } => {
                self.expansion.toggle_solution(&mut self.surface, index);
            }
            GalleryEvent::LightboxClicked => {
                self.lightbox.close(&mut self.surface);
            }
            GalleryEvent::CancelKey => {
                if !self.lightbox.close(&mut self.surface) {
                    self.close();
                }
            }
            GalleryEvent::PopState => self.pop_state(),
            GalleryEvent::ViewportChanged => {
                self.expansion.track_back_control(&mut self.surface);
            }
        }
    }

    fn step_slide(&mut self, offset: isize) {
        let mut stage = stage!(self);
        self.expansion.step_slide(&mut stage, offset);
    }

    fn run_due_tasks(&mut self) -> u32 {
        let mut ran = 0;
        while let Some(task) = self.timers.pop_due(self.clock) {
            ran += 1;
            self.run_task(task);
        }
        self.timers.settle_at(self.clock);
        ran
    }

    fn run_task(&mut self, task: Task<S::Node>) {
        let Some(container) = self.container.clone() else {
            return;
        };
        match task {
            Task::Sequence(sequence) => stage!(self).run_sequence(sequence),
            Task::RemoveCard(card) => {
                if self.expansion.expanded_card() == Some(&card) {
                    self.close();
                }
                self.surface.remove(&card);
                self.motions.forget(&card);
            }
            Task::SettleReflow { card, token } => {
                stage!(self).settle(&card, token);
            }
            Task::SettleExpand { card, token } => {
                let mut stage = stage!(self);
                self.expansion.settle_expand(&mut stage, &card, token);
            }
            Task::FadeSiblings(card) => {
                let mut stage = stage!(self);
                self.expansion.fade_siblings(&mut stage, &container, &card);
            }
            Task::FinishCollapse { card, collapse } => {
                let mut stage = stage!(self);
                self.expansion
                    .finish_collapse(&mut stage, &container, &card, collapse);
            }
            Task::SwapSlide { image, src } => {
                expansion::swap_slide(&mut self.surface, &image, &src);
            }
            Task::RetryOpen(slug) => {
                if self.url.current_slug().as_deref() == Some(slug.as_str()) {
                    self.open_link(&slug, Attempt::Retry);
                } else {
                    tracing::debug!(slug = %slug, "deep link retry dropped: location changed");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn catalog(&self) -> &ProjectCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &GalleryConfig {
        &self.config
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub const fn history(&self) -> &H {
        self.url.history()
    }

    pub fn history_mut(&mut self) -> &mut H {
        self.url.history_mut()
    }

    /// The card container, once started.
    #[must_use]
    pub const fn container(&self) -> Option<&S::Node> {
        self.container.as_ref()
    }

    /// Key of the open card.
    #[must_use]
    pub fn expanded_key(&self) -> Option<&str> {
        self.expansion.expanded_key()
    }

    #[must_use]
    pub const fn expansion(&self) -> &ExpansionMachine<S::Node> {
        &self.expansion
    }

    #[must_use]
    pub const fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    #[must_use]
    pub const fn is_lightbox_open(&self) -> bool {
        self.lightbox.is_open()
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.clock
    }

    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.timers.len()
    }
}
