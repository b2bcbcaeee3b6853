#![forbid(unsafe_code)]

//! Options accepted by the JS constructor.
//!
//! The payload is a JSON object: every [`GalleryConfig`] field at the top
//! level, plus a `log_level` for the console subscriber. Missing fields take
//! their defaults; an absent or blank payload is the same as `{}`.

use serde::Deserialize;

use folio_core::{FolioError, GalleryConfig};

/// Parsed constructor options.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct WebOptions {
    #[serde(flatten)]
    pub gallery: GalleryConfig,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: LogLevel,
}

/// Console verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

impl WebOptions {
    /// Parse the constructor payload.
    pub fn from_json(json: Option<&str>) -> Result<Self, FolioError> {
        match json.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(json) => {
                serde_json::from_str(json).map_err(|e| FolioError::InvalidConfig(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::filter::SortOrder;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn absent_and_blank_payloads_are_defaults() {
        assert_eq!(WebOptions::from_json(None).unwrap(), WebOptions::default());
        assert_eq!(WebOptions::from_json(Some("  ")).unwrap(), WebOptions::default());
    }

    #[test]
    fn gallery_fields_sit_at_the_top_level() {
        let options = WebOptions::from_json(Some(
            r#"{"initial_sort": "name", "timings": {"retry_ms": 900}, "log_level": "debug"}"#,
        ))
        .unwrap();
        assert_eq!(options.gallery.initial_sort, SortOrder::Name);
        assert_eq!(options.gallery.timings.retry(), Duration::from_millis(900));
        assert_eq!(options.gallery.timings.exit(), Duration::from_millis(800));
        assert_eq!(tracing::Level::from(options.log_level), tracing::Level::DEBUG);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let err = WebOptions::from_json(Some("{nope")).unwrap_err();
        assert!(matches!(err, FolioError::InvalidConfig(_)));
        let err = WebOptions::from_json(Some(r#"{"log_level": "loud"}"#)).unwrap_err();
        assert!(matches!(err, FolioError::InvalidConfig(_)));
    }
}
