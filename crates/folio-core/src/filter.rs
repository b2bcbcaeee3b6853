#![forbid(unsafe_code)]

//! Filter/sort engine: turns the catalog plus control values into the
//! desired card order.
//!
//! # Invariants
//!
//! 1. Filtering happens before sorting; sorting is stable.
//! 2. `Category::All` passes every project through.
//! 3. Year order is descending; undated projects come last.
//! 4. Name order is case-insensitive, ties broken by the exact name.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::project::Project;

/// Value of the "all categories" filter option.
pub const ALL_CATEGORIES: &str = "all";

/// Category filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    All,
    Only(String),
}

impl Category {
    /// Parse a filter control value. Blank and `"all"` mean no filter.
    #[must_use]
    pub fn from_control_value(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Only(value.to_owned())
        }
    }

    /// The control value that selects this category.
    #[must_use]
    pub fn control_value(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Only(key) => key,
        }
    }

    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        match self {
            Self::All => true,
            Self::Only(key) => project.category.as_deref() == Some(key.as_str()),
        }
    }
}

/// Sort criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Insertion rank, ascending.
    Rank,
    /// Year, newest first.
    #[default]
    Year,
    /// Name, alphabetical.
    Name,
}

impl SortOrder {
    /// Parse a sort control value. Unknown values mean rank order.
    #[must_use]
    pub fn from_control_value(value: &str) -> Self {
        match value.trim() {
            "year" => Self::Year,
            "name" => Self::Name,
            _ => Self::Rank,
        }
    }

    /// The control value that selects this order.
    #[must_use]
    pub const fn control_value(self) -> &'static str {
        match self {
            Self::Rank => "rank",
            Self::Year => "year",
            Self::Name => "name",
        }
    }

    #[must_use]
    pub fn compare(self, a: &Project, b: &Project) -> Ordering {
        match self {
            Self::Rank => a.rank.cmp(&b.rank),
            Self::Year => match (a.year, b.year) {
                (Some(ay), Some(by)) => by.cmp(&ay),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
        }
    }
}

/// Current filter and sort selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub category: Category,
    pub sort: SortOrder,
}

impl FilterState {
    #[must_use]
    pub fn new(category: Category, sort: SortOrder) -> Self {
        Self { category, sort }
    }

    /// The desired ordered view of `projects`.
    #[must_use]
    pub fn apply<'a>(&self, projects: &'a [Project]) -> Vec<&'a Project> {
        let mut list: Vec<&Project> = projects
            .iter()
            .filter(|p| self.category.matches(p))
            .collect();
        list.sort_by(|a, b| self.sort.compare(a, b));
        list
    }
}

/// Whether two key lists hold the same members, ignoring order.
#[must_use]
pub fn same_members<A, B>(current: &[A], next: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    if current.len() != next.len() {
        return false;
    }
    let mut a: Vec<&str> = current.iter().map(AsRef::as_ref).collect();
    let mut b: Vec<&str> = next.iter().map(AsRef::as_ref).collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}
