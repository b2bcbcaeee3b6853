#![forbid(unsafe_code)]

//! Keeps the address bar in step with the open card.
//!
//! Path `/` means no project is open; `/<slug>` means that project's detail
//! view is open. The gallery calls [`UrlSync::after_open`] and
//! [`UrlSync::after_close`] as the last step of opening and closing, and
//! resolves back/forward navigation through [`slug_from_path`].
//!
//! # Invariants
//!
//! 1. A push only happens when the target path differs from the current one,
//!    so replaying a navigation never stacks duplicate entries.
//! 2. After an open, the path is `/<slug>` if the project has a slug and `/`
//!    otherwise.

/// Root path: no project open.
pub const ROOT_PATH: &str = "/";

/// Session history as seen by the gallery.
pub trait History {
    /// Current location path.
    fn path(&self) -> String;

    /// Push a new entry without reloading.
    fn push(&mut self, path: &str);
}

/// The slug named by `path`, if any. Surrounding slashes are ignored.
#[must_use]
pub fn slug_from_path(path: &str) -> Option<&str> {
    let slug = path.trim_matches('/');
    (!slug.is_empty()).then_some(slug)
}

/// The path that shows `slug`.
#[must_use]
pub fn path_for_slug(slug: &str) -> String {
    format!("/{slug}")
}

/// History wrapper applying the push rules.
#[derive(Debug, Default)]
pub struct UrlSync<H> {
    history: H,
}

impl<H: History> UrlSync<H> {
    #[must_use]
    pub const fn new(history: H) -> Self {
        Self { history }
    }

    #[must_use]
    pub const fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// Slug of the current location.
    #[must_use]
    pub fn current_slug(&self) -> Option<String> {
        slug_from_path(&self.history.path()).map(str::to_owned)
    }

    /// Record that a project with `slug` was opened.
    pub fn after_open(&mut self, slug: Option<&str>) {
        let target = slug.map_or_else(|| ROOT_PATH.to_owned(), path_for_slug);
        self.push_if_changed(&target);
    }

    /// Record that the open project was closed.
    pub fn after_close(&mut self) {
        self.push_if_changed(ROOT_PATH);
    }

    fn push_if_changed(&mut self, target: &str) {
        if self.history.path() != target {
            tracing::debug!(path = target, "history push");
            self.history.push(target);
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory history
// ---------------------------------------------------------------------------

/// A history stack with a cursor, like a browser tab's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(ROOT_PATH)
    }
}

impl MemoryHistory {
    /// A history whose only entry is `initial`.
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![initial.to_owned()],
            cursor: 0,
        }
    }

    /// Every entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Step back one entry. Returns the new path, or `None` at the start.
    pub fn back(&mut self) -> Option<String> {
        self.cursor = self.cursor.checked_sub(1)?;
        Some(self.path())
    }

    /// Step forward one entry. Returns the new path, or `None` at the end.
    pub fn forward(&mut self) -> Option<String> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.path())
    }
}

impl History for MemoryHistory {
    fn path(&self) -> String {
        self.entries
            .get(self.cursor)
            .cloned()
            .unwrap_or_else(|| ROOT_PATH.to_owned())
    }

    fn push(&mut self, path: &str) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(path.to_owned());
        self.cursor = self.entries.len() - 1;
    }
}
