#![forbid(unsafe_code)]

//! Folding push completion events into the canonical collection.
//!
//! Events are matched by challenge key. An event for a key the collection
//! does not hold is a no-op: pushes may arrive before the bulk load or name a
//! challenge this board never loaded.

use serde::{Deserialize, Serialize};

use crate::challenge::{CodingChallengeStatus, EnrichedChallenge};

/// Payload of the "challenge solved" push channel.
///
/// Only `key` is consumed by the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeSolved {
    pub key: String,
    pub name: String,
    pub challenge: String,
    pub flag: String,
    pub hidden: bool,
    pub is_restore: bool,
}

impl ChallengeSolved {
    #[must_use]
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

/// Payload of the "code challenge solved" push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChallengeSolved {
    pub key: String,
    pub coding_challenge_status: CodingChallengeStatus,
}

impl CodeChallengeSolved {
    #[must_use]
    pub fn new(key: impl Into<String>, status: CodingChallengeStatus) -> Self {
        Self {
            key: key.into(),
            coding_challenge_status: status,
        }
    }
}

/// Mark the matching challenge solved in place.
///
/// Returns `true` if a challenge with the event's key was found.
pub fn apply_challenge_solved(collection: &mut [EnrichedChallenge], event: &ChallengeSolved) -> bool {
    match collection.iter_mut().find(|c| c.key == event.key) {
        Some(challenge) => {
            challenge.solved = true;
            true
        }
        None => false,
    }
}

/// Set the coding status of the matching challenge in place.
///
/// Returns `true` if a challenge with the event's key was found.
pub fn apply_code_challenge_solved(
    collection: &mut [EnrichedChallenge],
    event: &CodeChallengeSolved,
) -> bool {
    match collection.iter_mut().find(|c| c.key == event.key) {
        Some(challenge) => {
            challenge.coding_challenge_status = event.coding_challenge_status;
            true
        }
        None => false,
    }
}

/// Collection with the matching challenge marked solved.
#[must_use]
pub fn merge_challenge_solved(
    mut collection: Vec<EnrichedChallenge>,
    event: &ChallengeSolved,
) -> Vec<EnrichedChallenge> {
    if !apply_challenge_solved(&mut collection, event) {
        tracing::debug!(key = %event.key, "challenge solved event for unknown key ignored");
    }
    collection
}

/// Collection with the matching challenge's coding status replaced.
#[must_use]
pub fn merge_code_challenge_solved(
    mut collection: Vec<EnrichedChallenge>,
    event: &CodeChallengeSolved,
) -> Vec<EnrichedChallenge> {
    if !apply_code_challenge_solved(&mut collection, event) {
        tracing::debug!(key = %event.key, "code challenge solved event for unknown key ignored");
    }
    collection
}
