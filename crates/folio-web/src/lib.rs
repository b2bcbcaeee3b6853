#![forbid(unsafe_code)]

//! WASM frontend for the folio gallery.
//!
//! This crate is host-specific (web/WASM). It binds a [`folio_core::Gallery`]
//! to a live page:
//! - `WebSurface` implements [`folio_core::Surface`] over `web_sys` elements,
//! - `BrowserHistory` implements [`folio_core::History`] over
//!   `window.history`,
//! - DOM listeners translate clicks, keys, control changes and navigation
//!   into [`folio_core::GalleryEvent`]s ([`click`] holds the routing rules),
//! - a `requestAnimationFrame` loop advances the clock and steps the gallery.
//!
//! The routing rules, the event mailbox and the options parser are plain Rust
//! and build (and test) on every target.

pub mod click;
pub mod mailbox;
pub mod options;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{BrowserHistory, FolioGallery, WebSurface};

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct FolioGallery;

#[cfg(not(target_arch = "wasm32"))]
impl FolioGallery {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
