#![forbid(unsafe_code)]

//! Challenge enricher.
//!
//! Turns a [`RawChallenge`] into the [`EnrichedChallenge`] stored by the
//! canonical collection. Enrichment cannot fail: absent tags become an empty
//! list and an absent description becomes empty text.

use crate::challenge::{EnrichedChallenge, RawChallenge};
use crate::sanitize::Sanitizer;

/// Split a comma separated tag string into trimmed tags.
///
/// An absent or empty string yields no tags. Otherwise every comma produces
/// a tag, so `"a,,b"` keeps its empty middle entry.
#[must_use]
pub fn parse_tags(tags: Option<&str>) -> Vec<String> {
    match tags {
        None | Some("") => Vec::new(),
        Some(text) => text.split(',').map(|tag| tag.trim().to_owned()).collect(),
    }
}

/// Enrich a single challenge.
#[must_use]
pub fn enrich(raw: RawChallenge, sanitizer: &dyn Sanitizer) -> EnrichedChallenge {
    let tag_list = parse_tags(raw.tags.as_deref());
    let original_description = raw.description.unwrap_or_default();
    let description = sanitizer.trust_markup(&original_description);

    EnrichedChallenge {
        id: raw.id,
        key: raw.key,
        name: raw.name,
        category: raw.category,
        tags: raw.tags,
        difficulty: raw.difficulty,
        solved: raw.solved,
        coding_challenge_status: raw.coding_challenge_status,
        has_coding_challenge: raw.has_coding_challenge,
        tutorial_order: raw.tutorial_order,
        disabled_env: raw.disabled_env,
        hint: raw.hint,
        hint_url: raw.hint_url,
        mitigation_url: raw.mitigation_url,
        tag_list,
        original_description,
        description,
    }
}

/// Enrich a whole bulk load, preserving source order.
#[must_use]
pub fn enrich_all(
    raw: impl IntoIterator<Item = RawChallenge>,
    sanitizer: &dyn Sanitizer,
) -> Vec<EnrichedChallenge> {
    raw.into_iter().map(|c| enrich(c, sanitizer)).collect()
}
