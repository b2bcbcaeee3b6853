#![forbid(unsafe_code)]

//! Construction-time failures.
//!
//! Runtime UI operations never return errors: a missing element or an
//! unknown slug is skipped and logged. Only loading data, reading options
//! and binding to the page can fail.

/// Gallery error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolioError {
    /// The project dataset could not be parsed.
    InvalidProjects(String),
    /// Two projects share the same identity key.
    DuplicateProject(String),
    /// The options payload could not be parsed.
    InvalidConfig(String),
    /// A required page element was not found.
    MissingElement(String),
    /// A host API (window, document, history) is not available.
    Unavailable(&'static str),
}

impl core::fmt::Display for FolioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidProjects(msg) => write!(f, "invalid project data: {msg}"),
            Self::DuplicateProject(name) => write!(f, "duplicate project key: {name}"),
            Self::InvalidConfig(msg) => write!(f, "invalid gallery options: {msg}"),
            Self::MissingElement(selector) => write!(f, "required element not found: {selector}"),
            Self::Unavailable(what) => write!(f, "unavailable: {what}"),
        }
    }
}

impl std::error::Error for FolioError {}
