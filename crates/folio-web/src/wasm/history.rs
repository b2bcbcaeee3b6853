#![forbid(unsafe_code)]

//! [`History`] over `window.history` and `window.location`.

use folio_core::url_sync::ROOT_PATH;
use folio_core::{FolioError, History};
use wasm_bindgen::JsValue;
use web_sys::Window;

/// The tab's session history.
#[derive(Debug, Clone)]
pub struct BrowserHistory {
    window: Window,
}

impl BrowserHistory {
    pub fn new() -> Result<Self, FolioError> {
        let window = web_sys::window().ok_or(FolioError::Unavailable("window"))?;
        window
            .history()
            .map_err(|_| FolioError::Unavailable("history"))?;
        Ok(Self { window })
    }
}

impl History for BrowserHistory {
    fn path(&self) -> String {
        self.window
            .location()
            .pathname()
            .unwrap_or_else(|_| ROOT_PATH.to_owned())
    }

    fn push(&mut self, path: &str) {
        let pushed = self
            .window
            .history()
            .and_then(|history| history.push_state_with_url(&JsValue::NULL, "", Some(path)));
        if let Err(err) = pushed {
            tracing::warn!(path, ?err, "history push failed");
        }
    }
}
