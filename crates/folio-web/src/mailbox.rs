#![forbid(unsafe_code)]

//! Single-threaded event inbox shared by DOM listeners and the frame loop.
//!
//! Listeners [`post`](Mailbox::post) events as they arrive; the frame loop
//! [`drain`](Mailbox::drain)s them into the gallery once per frame. Posting
//! calls the installed waker so an idle loop schedules its next frame.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use folio_core::GalleryEvent;

type Waker = Box<dyn Fn()>;

#[derive(Default)]
struct Inner {
    events: RefCell<VecDeque<GalleryEvent>>,
    waker: RefCell<Option<Waker>>,
}

/// Cloneable handle to one inbox.
#[derive(Clone, Default)]
pub struct Mailbox {
    inner: Rc<Inner>,
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("pending", &self.len())
            .field("waker", &self.inner.waker.borrow().is_some())
            .finish()
    }
}

impl Mailbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` and wake the loop.
    pub fn post(&self, event: GalleryEvent) {
        self.inner.events.borrow_mut().push_back(event);
        if let Some(wake) = self.inner.waker.borrow().as_ref() {
            wake();
        }
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<GalleryEvent> {
        self.inner.events.borrow_mut().drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.events.borrow().is_empty()
    }

    /// Install (or with `None`, remove) the waker.
    pub fn set_waker(&self, waker: Option<Waker>) {
        *self.inner.waker.borrow_mut() = waker;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    #[test]
    fn drain_returns_events_in_post_order() {
        let mailbox = Mailbox::new();
        let listener = mailbox.clone();
        listener.post(GalleryEvent::SortChanged);
        listener.post(GalleryEvent::CancelKey);
        assert_eq!(mailbox.len(), 2);
        assert_eq!(
            mailbox.drain(),
            [GalleryEvent::SortChanged, GalleryEvent::CancelKey]
        );
        assert!(mailbox.is_empty());
    }

    #[test]
    fn posting_wakes_until_the_waker_is_removed() {
        let mailbox = Mailbox::new();
        let wakes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&wakes);
        mailbox.set_waker(Some(Box::new(move || counter.set(counter.get() + 1))));

        mailbox.post(GalleryEvent::PopState);
        mailbox.post(GalleryEvent::PopState);
        assert_eq!(wakes.get(), 2);

        mailbox.set_waker(None);
        mailbox.post(GalleryEvent::PopState);
        assert_eq!(wakes.get(), 2);
        assert_eq!(mailbox.len(), 3);
    }
}
