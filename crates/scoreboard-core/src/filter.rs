#![forbid(unsafe_code)]

//! Filter and sort specification.
//!
//! [`FilterSetting`] is replaced wholesale on every parameter change; it is
//! never edited field by field while the board is live. Its [`Default`] is
//! the filter a freshly opened board without URL parameters shows.

use std::collections::BTreeSet;

use bitflags::bitflags;

use crate::challenge::MAX_DIFFICULTY;

// ─────────────────────────────────────────────────────────────────────────────
// Difficulty Sets
// ─────────────────────────────────────────────────────────────────────────────

bitflags! {
    /// Selected difficulty levels. Empty means "no restriction".
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct DifficultySet: u8 {
        const LEVEL_1 = 1 << 0;
        const LEVEL_2 = 1 << 1;
        const LEVEL_3 = 1 << 2;
        const LEVEL_4 = 1 << 3;
        const LEVEL_5 = 1 << 4;
        const LEVEL_6 = 1 << 5;
    }
}

impl DifficultySet {
    /// Flag for a single level, `None` outside `1..=6`.
    #[must_use]
    pub fn level(difficulty: u8) -> Option<Self> {
        if (1..=MAX_DIFFICULTY).contains(&difficulty) {
            Some(Self::from_bits_retain(1 << (difficulty - 1)))
        } else {
            None
        }
    }

    /// Every level in `low..=high`, clamped to the valid range.
    #[must_use]
    pub fn range(low: u8, high: u8) -> Self {
        (low.max(1)..=high.min(MAX_DIFFICULTY))
            .filter_map(Self::level)
            .fold(Self::empty(), |acc, lvl| acc | lvl)
    }

    /// Build from level numbers; out-of-range numbers are ignored.
    #[must_use]
    pub fn from_levels(levels: impl IntoIterator<Item = u8>) -> Self {
        levels
            .into_iter()
            .filter_map(Self::level)
            .fold(Self::empty(), |acc, lvl| acc | lvl)
    }

    /// Selected levels in ascending order.
    pub fn levels(self) -> impl Iterator<Item = u8> {
        (1..=MAX_DIFFICULTY).filter(move |&d| Self::level(d).is_some_and(|lvl| self.contains(lvl)))
    }

    /// Whether `difficulty` passes this selection.
    #[inline]
    #[must_use]
    pub fn allows(self, difficulty: u8) -> bool {
        self.is_empty() || Self::level(difficulty).is_some_and(|lvl| self.contains(lvl))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status / Sort
// ─────────────────────────────────────────────────────────────────────────────

/// Filter on the hacking `solved` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolvedStatus {
    Solved,
    Unsolved,
}

impl SolvedStatus {
    /// Parameter spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solved => "solved",
            Self::Unsolved => "unsolved",
        }
    }

    /// Parse the parameter spelling.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "solved" => Some(Self::Solved),
            "unsolved" => Some(Self::Unsolved),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn matches(self, solved: bool) -> bool {
        match self {
            Self::Solved => solved,
            Self::Unsolved => !solved,
        }
    }
}

/// Primary sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[default]
    Difficulty,
    Name,
    Category,
    /// Unsolved before solved when ascending.
    Status,
}

impl SortKey {
    pub const ALL: [Self; 4] = [Self::Difficulty, Self::Name, Self::Category, Self::Status];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Difficulty => "difficulty",
            Self::Name => "name",
            Self::Category => "category",
            Self::Status => "status",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == s)
    }
}

/// Sort direction for the primary key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// Requested order of the derived view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    #[must_use]
    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Filter Setting
// ─────────────────────────────────────────────────────────────────────────────

/// User-controlled filter and sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSetting {
    /// Applied to every challenge.
    pub hacking_difficulties: DifficultySet,
    /// Applied only to challenges with a coding part.
    pub coding_difficulties: DifficultySet,
    /// Case-insensitive match against name and tags; empty disables it.
    pub search_query: String,
    /// Exact category membership; empty accepts any category.
    pub categories: BTreeSet<String>,
    /// At least one of these tags; empty accepts any tags.
    pub tags: BTreeSet<String>,
    pub status: Option<SolvedStatus>,
    pub show_disabled_challenges: bool,
    pub sort: SortOrder,
}

impl Default for FilterSetting {
    fn default() -> Self {
        Self {
            hacking_difficulties: DifficultySet::empty(),
            coding_difficulties: DifficultySet::empty(),
            search_query: String::new(),
            categories: BTreeSet::new(),
            tags: BTreeSet::new(),
            status: None,
            show_disabled_challenges: true,
            sort: SortOrder::default(),
        }
    }
}

impl FilterSetting {
    #[must_use]
    pub fn with_hacking_difficulties(mut self, set: DifficultySet) -> Self {
        self.hacking_difficulties = set;
        self
    }

    #[must_use]
    pub fn with_coding_difficulties(mut self, set: DifficultySet) -> Self {
        self.coding_difficulties = set;
        self
    }

    #[must_use]
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: Option<SolvedStatus>) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_show_disabled(mut self, show: bool) -> Self {
        self.show_disabled_challenges = show;
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Whether this is the default filter.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
