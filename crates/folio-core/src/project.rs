#![forbid(unsafe_code)]

//! Project records and the catalog that owns them.
//!
//! The dataset is supplied by the page as JSON before the first render and
//! is never mutated afterwards. Field names follow the page's dataset
//! (`type`, `typename`, `resolvedissue`, ...).
//!
//! # Invariants
//!
//! 1. Project names are unique within a [`ProjectCatalog`].
//! 2. Catalog order is the dataset order; sorting happens on borrowed views.

use serde::Deserialize;

use crate::error::FolioError;

/// A card logo: a single image or a list whose first entry is shown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Logo {
    Single(String),
    Gallery(Vec<String>),
}

impl Logo {
    /// The image shown on the card, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(src) => Some(src.as_str()),
            Self::Gallery(srcs) => srcs.first().map(String::as_str),
        }
    }
}

/// One entry of the "solutions" accordion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Solution {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// An immutable portfolio project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Identity key.
    pub name: String,
    #[serde(default)]
    pub logo: Option<Logo>,
    /// Category key matched by the filter control.
    #[serde(default, rename = "type")]
    pub category: Option<String>,
    /// Human-readable category tag shown on the card.
    #[serde(default, rename = "typename")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    /// Rating in 1..=5.
    #[serde(default)]
    pub difficulty: u8,
    #[serde(default, rename = "resolvedissue")]
    pub resolved_issues: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub solutions: Vec<Solution>,
    #[serde(default)]
    pub information: Vec<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    /// Deep-link slug.
    #[serde(default)]
    pub link: Option<String>,
    /// Insertion rank for the default sort.
    #[serde(default)]
    pub rank: i64,
}

impl Project {
    /// Minimal project, mostly useful in tests and fixtures.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logo: None,
            category: None,
            type_name: None,
            year: None,
            difficulty: 1,
            resolved_issues: 0,
            description: None,
            status: None,
            details: None,
            solutions: Vec::new(),
            information: Vec::new(),
            screenshots: Vec::new(),
            link: None,
            rank: 0,
        }
    }

    /// The deep-link slug, ignoring blank values.
    #[must_use]
    pub fn slug(&self) -> Option<&str> {
        self.link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

/// The ordered, validated project list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectCatalog {
    projects: Vec<Project>,
}

impl ProjectCatalog {
    /// Build a catalog, rejecting duplicate names.
    pub fn new(projects: Vec<Project>) -> Result<Self, FolioError> {
        for (i, project) in projects.iter().enumerate() {
            if projects[..i].iter().any(|p| p.name == project.name) {
                return Err(FolioError::DuplicateProject(project.name.clone()));
            }
        }
        Ok(Self { projects })
    }

    /// Parse a JSON array of projects.
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        let projects: Vec<Project> =
            serde_json::from_str(json).map_err(|e| FolioError::InvalidProjects(e.to_string()))?;
        Self::new(projects)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Project] {
        &self.projects
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn by_slug(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.slug() == Some(slug))
    }
}
