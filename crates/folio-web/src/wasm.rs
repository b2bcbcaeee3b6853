#![forbid(unsafe_code)]

//! The JS-facing gallery.
//!
//! [`FolioGallery`] owns a [`Gallery`] bound to the page, the DOM listeners
//! feeding it and the `requestAnimationFrame` loop stepping it. The loop
//! only runs while there is work: queued events, pending timer tasks or
//! motions waiting for their play half. Posting an event wakes it.
//!
//! # Failure Modes
//!
//! - Bad project JSON or options: the constructor throws.
//! - No card container: `start` throws; nothing is rendered.
//! - Optional controls (filter/sort selects) missing: their listeners are
//!   skipped and the defaults apply.

mod console;
mod history;
mod surface;

pub use history::BrowserHistory;
pub use surface::WebSurface;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use folio_core::view::{INDEX_ATTRIBUTE, KEY_ATTRIBUTE};
use folio_core::{FolioError, Gallery, GalleryEvent, ProjectCatalog, Surface};
use gloo::events::EventListener;
use gloo::render::{AnimationFrame, request_animation_frame};
use wasm_bindgen::prelude::*;
use web_sys::{Element, KeyboardEvent, Window};

use crate::click::{self, PathNode};
use crate::mailbox::Mailbox;
use crate::options::WebOptions;

fn to_js(err: FolioError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Milliseconds on the same clock as animation frame timestamps.
fn performance_now(window: &Window) -> f64 {
    window.performance().map_or(0.0, |p| p.now())
}

/// The element path from `target` up to the document root.
fn click_path(target: &Element) -> Vec<PathNode> {
    let mut path = Vec::new();
    let mut node = Some(target.clone());
    while let Some(element) = node {
        path.push(PathNode {
            classes: element
                .get_attribute("class")
                .map(|classes| classes.split_whitespace().map(str::to_owned).collect())
                .unwrap_or_default(),
            key: element.get_attribute(KEY_ATTRIBUTE),
            index: element.get_attribute(INDEX_ATTRIBUTE),
        });
        node = element.parent_element();
    }
    path
}

struct Runtime {
    gallery: RefCell<Gallery<WebSurface, BrowserHistory>>,
    mailbox: Mailbox,
    window: Window,
    /// `performance.now()` at start; gallery time is measured from here.
    origin: Cell<f64>,
    running: Cell<bool>,
    frame: RefCell<Option<AnimationFrame>>,
    listeners: RefCell<Vec<EventListener>>,
}

impl Runtime {
    fn schedule_frame(self: &Rc<Self>) {
        if !self.running.get() || self.frame.borrow().is_some() {
            return;
        }
        let runtime = Rc::clone(self);
        let handle = request_animation_frame(move |timestamp| {
            runtime.frame.borrow_mut().take();
            runtime.tick(timestamp);
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn tick(self: &Rc<Self>, timestamp: f64) {
        if !self.running.get() {
            return;
        }
        let busy = {
            let mut gallery = self.gallery.borrow_mut();
            gallery.surface_mut().play_committed();
            for event in self.mailbox.drain() {
                gallery.push_event(event);
            }
            let elapsed = (timestamp - self.origin.get()).max(0.0);
            gallery.set_time(Duration::from_secs_f64(elapsed / 1000.0));
            let result = gallery.step();
            if result.events_processed > 0 || result.tasks_run > 0 {
                tracing::trace!(?result, "frame");
            }
            result.pending_tasks > 0 || gallery.surface().has_committed()
        };
        if busy || !self.mailbox.is_empty() {
            self.schedule_frame();
        }
    }

    fn listen(&self, target: &web_sys::EventTarget, event_type: &'static str, event: GalleryEvent) {
        let mailbox = self.mailbox.clone();
        self.listeners
            .borrow_mut()
            .push(EventListener::new(target, event_type, move |_| {
                mailbox.post(event.clone());
            }));
    }

    fn install_listeners(&self) {
        let document = self.gallery.borrow().surface().document().clone();
        let selectors = self.gallery.borrow().config().selectors.clone();

        let mailbox = self.mailbox.clone();
        let on_click = EventListener::new(&document, "click", move |event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            if let Some(event) = click::route_click(&click_path(&target)) {
                mailbox.post(event);
            }
        });

        let mailbox = self.mailbox.clone();
        let on_key = EventListener::new(&document, "keydown", move |event| {
            if let Some(event) = event
                .dyn_ref::<KeyboardEvent>()
                .and_then(|key| click::route_key(&key.key()))
            {
                mailbox.post(event);
            }
        });
        self.listeners.borrow_mut().extend([on_click, on_key]);

        self.listen(&self.window, "popstate", GalleryEvent::PopState);
        for (selector, event) in [
            (&selectors.filter_select, GalleryEvent::FilterChanged),
            (&selectors.sort_select, GalleryEvent::SortChanged),
        ] {
            match document.query_selector(selector).ok().flatten() {
                Some(control) => self.listen(&control, "change", event),
                None => tracing::debug!(selector = %selector, "control not found"),
            }
        }
    }

    fn stop(&self) {
        self.running.set(false);
        self.mailbox.set_waker(None);
        self.listeners.borrow_mut().clear();
        self.frame.borrow_mut().take();
        self.gallery
            .borrow_mut()
            .surface_mut()
            .set_viewport_watch(false);
    }
}

/// Portfolio gallery bound to the current page.
#[wasm_bindgen]
pub struct FolioGallery {
    runtime: Rc<Runtime>,
}

#[wasm_bindgen]
impl FolioGallery {
    /// Parse the project dataset and options. Nothing touches the page
    /// until [`start`](Self::start).
    #[wasm_bindgen(constructor)]
    pub fn new(projects_json: &str, options: Option<String>) -> Result<FolioGallery, JsValue> {
        console_error_panic_hook::set_once();
        let options = WebOptions::from_json(options.as_deref()).map_err(to_js)?;
        console::init(options.log_level.into());

        let catalog = ProjectCatalog::from_json(projects_json).map_err(to_js)?;
        let mailbox = Mailbox::new();
        let surface = WebSurface::new(mailbox.clone()).map_err(to_js)?;
        let history = BrowserHistory::new().map_err(to_js)?;
        let window = surface.window().clone();
        let gallery = Gallery::new(catalog, options.gallery, surface, history);

        Ok(Self {
            runtime: Rc::new(Runtime {
                gallery: RefCell::new(gallery),
                mailbox,
                window,
                origin: Cell::new(0.0),
                running: Cell::new(false),
                frame: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        })
    }

    /// Render the gallery, open the project named by the URL and start
    /// listening.
    pub fn start(&self) -> Result<(), JsValue> {
        let runtime = &self.runtime;
        if runtime.running.get() {
            return Ok(());
        }
        runtime.origin.set(performance_now(&runtime.window));
        runtime.gallery.borrow_mut().start().map_err(to_js)?;
        runtime.running.set(true);
        runtime.install_listeners();

        let weak: Weak<Runtime> = Rc::downgrade(runtime);
        runtime.mailbox.set_waker(Some(Box::new(move || {
            if let Some(runtime) = weak.upgrade() {
                runtime.schedule_frame();
            }
        })));
        runtime.schedule_frame();
        Ok(())
    }

    /// Open the card of the project named `key`.
    pub fn open(&self, key: &str) -> bool {
        let opened = self.runtime.gallery.borrow_mut().open(key);
        self.runtime.schedule_frame();
        opened
    }

    /// Close the open card.
    pub fn close(&self) -> bool {
        let closed = self.runtime.gallery.borrow_mut().close();
        self.runtime.schedule_frame();
        closed
    }

    /// Name of the open project, if any.
    #[wasm_bindgen(js_name = expandedKey)]
    pub fn expanded_key(&self) -> Option<String> {
        self.runtime
            .gallery
            .borrow()
            .expanded_key()
            .map(str::to_owned)
    }

    /// Detach every listener and stop the frame loop. The rendered cards
    /// stay on the page.
    pub fn destroy(&self) {
        self.runtime.stop();
        tracing::debug!("gallery destroyed");
    }
}
