#![forbid(unsafe_code)]

//! `folio-core` is the headless engine behind the portfolio project gallery.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes [`GalleryEvent`]s
//!   and advances a monotonic clock; the core never owns a timer or a thread.
//! - **Platform-neutral DOM**: every mutation goes through the [`Surface`]
//!   trait. [`MemorySurface`] implements it in memory with a deterministic
//!   grid layout, which is what the tests drive.
//! - **Explicit state**: the single expanded card, the single lightbox and
//!   every pending continuation are owned by one [`Gallery`] value.
//!
//! The browser binding lives in `folio-web`.

pub mod config;
pub mod error;
pub mod event;
pub mod expansion;
pub mod filter;
pub mod flip;
pub mod gallery;
pub mod geometry;
pub mod labels;
pub mod lightbox;
pub mod markup;
pub mod project;
pub mod renderer;
pub mod schedule;
pub mod sequencer;
pub mod surface;
pub mod task;
pub mod url_sync;
pub mod view;

pub use config::GalleryConfig;
pub use error::FolioError;
pub use event::GalleryEvent;
pub use gallery::{Gallery, StepResult};
pub use project::{Project, ProjectCatalog};
pub use surface::Surface;
pub use surface::memory::MemorySurface;
pub use url_sync::{History, MemoryHistory};
