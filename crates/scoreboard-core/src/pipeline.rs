#![forbid(unsafe_code)]

//! Filter/sort pipeline.
//!
//! [`apply`] is the single function that turns the canonical collection into
//! the derived view. It is pure and deterministic:
//!
//! 1. Drop every challenge that fails any active criterion of the filter.
//! 2. Sort by the requested key and direction, breaking ties by name
//!    (ascending, case-insensitive, then bytewise) and finally by key.
//! 3. If tutorial-first is in effect, move unsolved tutorial challenges to the
//!    front, keeping the sorted order inside both groups.
//!
//! Because the ordering is total and step 3 is a stable partition, applying
//! the pipeline to its own output with the same inputs yields that output.

use std::cmp::Ordering;

use crate::challenge::EnrichedChallenge;
use crate::filter::{FilterSetting, SortDirection, SortKey, SortOrder};

/// Compute the derived view.
#[must_use]
pub fn apply(
    collection: &[EnrichedChallenge],
    filter: &FilterSetting,
    restrict_tutorial_first: bool,
) -> Vec<EnrichedChallenge> {
    let needle = filter.search_query.to_lowercase();

    let mut view: Vec<EnrichedChallenge> = collection
        .iter()
        .filter(|c| matches(c, filter, &needle))
        .cloned()
        .collect();
    view.sort_by(|a, b| compare(a, b, filter.sort));

    let pinned = if restrict_tutorial_first {
        let (mut front, rest): (Vec<_>, Vec<_>) =
            view.into_iter().partition(is_pinned_tutorial);
        let pinned = front.len();
        front.extend(rest);
        view = front;
        pinned
    } else {
        0
    };

    tracing::trace!(
        input = collection.len(),
        output = view.len(),
        pinned,
        sort_key = filter.sort.key.as_str(),
        sort_direction = filter.sort.direction.as_str(),
        "pipeline applied"
    );
    view
}

/// Whether `challenge` passes every active criterion of `filter`.
#[must_use]
pub fn passes(challenge: &EnrichedChallenge, filter: &FilterSetting) -> bool {
    matches(challenge, filter, &filter.search_query.to_lowercase())
}

fn matches(c: &EnrichedChallenge, filter: &FilterSetting, needle: &str) -> bool {
    if !filter.hacking_difficulties.allows(c.difficulty) {
        return false;
    }
    if c.is_coding_challenge() && !filter.coding_difficulties.allows(c.difficulty) {
        return false;
    }
    if !needle.is_empty() && !matches_search(c, needle) {
        return false;
    }
    if !filter.categories.is_empty() && !filter.categories.contains(&c.category) {
        return false;
    }
    if !filter.tags.is_empty() && !c.tag_list.iter().any(|t| filter.tags.contains(t)) {
        return false;
    }
    if filter.status.is_some_and(|status| !status.matches(c.solved)) {
        return false;
    }
    filter.show_disabled_challenges || !c.is_disabled()
}

/// `needle` must already be lowercase.
fn matches_search(c: &EnrichedChallenge, needle: &str) -> bool {
    c.name.to_lowercase().contains(needle)
        || c.tag_list.iter().any(|tag| tag.to_lowercase().contains(needle))
}

fn is_pinned_tutorial(c: &EnrichedChallenge) -> bool {
    c.is_tutorial() && !c.solved
}

/// Total order used by the pipeline.
#[must_use]
pub fn compare(a: &EnrichedChallenge, b: &EnrichedChallenge, order: SortOrder) -> Ordering {
    let primary = match order.key {
        SortKey::Difficulty => a.difficulty.cmp(&b.difficulty),
        SortKey::Name => Ordering::Equal,
        SortKey::Category => cmp_ignore_case(&a.category, &b.category),
        SortKey::Status => a.solved.cmp(&b.solved),
    };
    let primary = match order.direction {
        SortDirection::Ascending => primary,
        SortDirection::Descending => primary.reverse(),
    };
    // As a tie-breaker the name is always ascending.
    let name = cmp_ignore_case(&a.name, &b.name).then_with(|| a.name.cmp(&b.name));
    let name = match (order.key, order.direction) {
        (SortKey::Name, SortDirection::Descending) => name.reverse(),
        _ => name,
    };
    primary.then(name).then_with(|| a.key.cmp(&b.key))
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
