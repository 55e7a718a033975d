#![forbid(unsafe_code)]

//! Filter-state codec.
//!
//! Maps a [`FilterSetting`] to and from a flat string map suitable for URL
//! query parameters. The navigable state is the source of truth for the
//! filter, so the mapping must be lossless: `decode(&encode(f)) == f` for
//! every filter value.
//!
//! # Wire format
//!
//! | Key | Value | Written when |
//! |-----|-------|--------------|
//! | `difficulties` | levels, comma separated | selection non-empty |
//! | `codingDifficulties` | levels, comma separated | selection non-empty |
//! | `searchQuery` | raw text | non-empty |
//! | `categories` | percent-escaped items, comma separated | set non-empty |
//! | `tags` | percent-escaped items, comma separated | set non-empty |
//! | `status` | `solved` / `unsolved` | set |
//! | `showDisabledChallenges` | `true` / `false` | always |
//! | `sortBy` | `difficulty` / `name` / `category` / `status` | always |
//! | `sortDirection` | `asc` / `desc` | always |
//!
//! Decoding never fails. Missing keys take the default, unknown keys are
//! ignored, and unparsable values fall back per field (invalid list items are
//! dropped one by one). A present but empty list key decodes to a set holding
//! the empty string, which is what encoding such a set produces.

use std::collections::{BTreeMap, BTreeSet};

use crate::filter::{DifficultySet, FilterSetting, SolvedStatus, SortDirection, SortKey};

/// Flat parameter representation of a filter.
pub type ParamMap = BTreeMap<String, String>;

pub const KEY_DIFFICULTIES: &str = "difficulties";
pub const KEY_CODING_DIFFICULTIES: &str = "codingDifficulties";
pub const KEY_SEARCH_QUERY: &str = "searchQuery";
pub const KEY_CATEGORIES: &str = "categories";
pub const KEY_TAGS: &str = "tags";
pub const KEY_STATUS: &str = "status";
pub const KEY_SHOW_DISABLED: &str = "showDisabledChallenges";
pub const KEY_SORT_BY: &str = "sortBy";
pub const KEY_SORT_DIRECTION: &str = "sortDirection";

const SEPARATOR: char = ',';

/// Encode a filter into flat parameters.
#[must_use]
pub fn encode(filter: &FilterSetting) -> ParamMap {
    let mut params = ParamMap::new();

    if !filter.hacking_difficulties.is_empty() {
        params.insert(KEY_DIFFICULTIES.into(), join_levels(filter.hacking_difficulties));
    }
    if !filter.coding_difficulties.is_empty() {
        params.insert(KEY_CODING_DIFFICULTIES.into(), join_levels(filter.coding_difficulties));
    }
    if !filter.search_query.is_empty() {
        params.insert(KEY_SEARCH_QUERY.into(), filter.search_query.clone());
    }
    if !filter.categories.is_empty() {
        params.insert(KEY_CATEGORIES.into(), join_items(&filter.categories));
    }
    if !filter.tags.is_empty() {
        params.insert(KEY_TAGS.into(), join_items(&filter.tags));
    }
    if let Some(status) = filter.status {
        params.insert(KEY_STATUS.into(), status.as_str().into());
    }
    params.insert(
        KEY_SHOW_DISABLED.into(),
        filter.show_disabled_challenges.to_string(),
    );
    params.insert(KEY_SORT_BY.into(), filter.sort.key.as_str().into());
    params.insert(KEY_SORT_DIRECTION.into(), filter.sort.direction.as_str().into());

    params
}

/// Decode flat parameters into a filter, defaulting per field.
#[must_use]
pub fn decode(params: &ParamMap) -> FilterSetting {
    let defaults = FilterSetting::default();
    let get = |key: &str| params.get(key).map(String::as_str);

    let mut filter = FilterSetting {
        hacking_difficulties: get(KEY_DIFFICULTIES).map_or(defaults.hacking_difficulties, split_levels),
        coding_difficulties: get(KEY_CODING_DIFFICULTIES).map_or(defaults.coding_difficulties, split_levels),
        search_query: get(KEY_SEARCH_QUERY).map_or(defaults.search_query, str::to_owned),
        categories: get(KEY_CATEGORIES).map_or_else(BTreeSet::new, split_items),
        tags: get(KEY_TAGS).map_or_else(BTreeSet::new, split_items),
        status: get(KEY_STATUS).and_then(SolvedStatus::parse),
        show_disabled_challenges: get(KEY_SHOW_DISABLED)
            .and_then(parse_bool)
            .unwrap_or(defaults.show_disabled_challenges),
        sort: defaults.sort,
    };
    if let Some(key) = get(KEY_SORT_BY).and_then(SortKey::parse) {
        filter.sort.key = key;
    }
    if let Some(direction) = get(KEY_SORT_DIRECTION).and_then(SortDirection::parse) {
        filter.sort.direction = direction;
    }

    let unknown = params.keys().filter(|k| !is_known_key(k)).count();
    if unknown > 0 {
        tracing::debug!(unknown, "ignoring unknown filter parameters");
    }
    filter
}

/// Render parameters as a URL query string (without the leading `?`).
pub fn to_query_string(params: &ParamMap) -> Result<String, serde_urlencoded::ser::Error> {
    serde_urlencoded::to_string(params)
}

/// Parse a URL query string; a leading `?` is accepted.
///
/// Malformed input yields an empty map, which decodes to the default filter.
/// Repeated keys keep their last value.
#[must_use]
pub fn from_query_string(query: &str) -> ParamMap {
    let query = query.strip_prefix('?').unwrap_or(query);
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(err) => {
            tracing::debug!(error = %err, "malformed query string, using defaults");
            ParamMap::new()
        }
    }
}

fn is_known_key(key: &str) -> bool {
    matches!(
        key,
        KEY_DIFFICULTIES
            | KEY_CODING_DIFFICULTIES
            | KEY_SEARCH_QUERY
            | KEY_CATEGORIES
            | KEY_TAGS
            | KEY_STATUS
            | KEY_SHOW_DISABLED
            | KEY_SORT_BY
            | KEY_SORT_DIRECTION
    )
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn join_levels(set: DifficultySet) -> String {
    set.levels()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn split_levels(value: &str) -> DifficultySet {
    DifficultySet::from_levels(
        value
            .split(SEPARATOR)
            .filter_map(|item| item.trim().parse::<u8>().ok()),
    )
}

fn join_items(items: &BTreeSet<String>) -> String {
    items
        .iter()
        .map(|item| urlencoding::encode(item).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

fn split_items(value: &str) -> BTreeSet<String> {
    value
        .split(SEPARATOR)
        .filter_map(|item| match urlencoding::decode(item) {
            Ok(decoded) => Some(decoded.into_owned()),
            Err(err) => {
                tracing::debug!(item, error = %err, "dropping undecodable filter item");
                None
            }
        })
        .collect()
}
