#![forbid(unsafe_code)]

//! Challenge records.
//!
//! [`RawChallenge`] is the shape delivered by the challenge source and is
//! never modified after it arrives. [`EnrichedChallenge`] is what the canonical
//! collection holds: the same fields plus the values derived by
//! [`crate::enrich`]. Only `solved` and `coding_challenge_status` change after
//! enrichment, and only through [`crate::merge`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sanitize::SafeHtml;

/// Highest difficulty level a challenge can carry.
pub const MAX_DIFFICULTY: u8 = 6;

// ─────────────────────────────────────────────────────────────────────────────
// Coding Challenge Status
// ─────────────────────────────────────────────────────────────────────────────

/// Progress on the coding part of a challenge.
///
/// A closed enumeration carried on the wire as `0`, `1` or `2`. The board
/// stores, compares and counts these values; it attaches no further meaning
/// to them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CodingChallengeStatus {
    /// Wire value `0`.
    #[default]
    NotAttempted,
    /// Wire value `1`.
    InProgress,
    /// Wire value `2`.
    Solved,
}

impl CodingChallengeStatus {
    /// All values in wire order.
    pub const ALL: [Self; 3] = [Self::NotAttempted, Self::InProgress, Self::Solved];

    /// Wire code of this status.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::NotAttempted => 0,
            Self::InProgress => 1,
            Self::Solved => 2,
        }
    }
}

/// A status code outside `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidStatusCode(pub u8);

impl fmt::Display for InvalidStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid coding challenge status: {}", self.0)
    }
}

impl std::error::Error for InvalidStatusCode {}

impl TryFrom<u8> for CodingChallengeStatus {
    type Error = InvalidStatusCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::NotAttempted),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Solved),
            other => Err(InvalidStatusCode(other)),
        }
    }
}

impl From<CodingChallengeStatus> for u8 {
    fn from(status: CodingChallengeStatus) -> Self {
        status.code()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw Challenge
// ─────────────────────────────────────────────────────────────────────────────

/// A challenge as delivered by the challenge source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChallenge {
    #[serde(default)]
    pub id: u32,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Comma separated tag list.
    #[serde(default)]
    pub tags: Option<String>,
    /// Free text, may contain markup.
    #[serde(default)]
    pub description: Option<String>,
    pub difficulty: u8,
    #[serde(default)]
    pub solved: bool,
    #[serde(default)]
    pub coding_challenge_status: CodingChallengeStatus,
    #[serde(default)]
    pub has_coding_challenge: bool,
    /// Position in the tutorial; present only for tutorial challenges.
    #[serde(default)]
    pub tutorial_order: Option<u32>,
    /// Name of the environment the challenge is disabled in, if any.
    #[serde(default)]
    pub disabled_env: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub hint_url: Option<String>,
    #[serde(default)]
    pub mitigation_url: Option<String>,
}

impl RawChallenge {
    /// Minimal record, mainly for tests and fixtures.
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>, difficulty: u8) -> Self {
        Self {
            id: 0,
            key: key.into(),
            name: name.into(),
            category: String::new(),
            tags: None,
            description: None,
            difficulty,
            solved: false,
            coding_challenge_status: CodingChallengeStatus::NotAttempted,
            has_coding_challenge: false,
            tutorial_order: None,
            disabled_env: None,
            hint: None,
            hint_url: None,
            mitigation_url: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Enriched Challenge
// ─────────────────────────────────────────────────────────────────────────────

/// A challenge as held by the canonical collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedChallenge {
    pub id: u32,
    pub key: String,
    pub name: String,
    pub category: String,
    pub tags: Option<String>,
    pub difficulty: u8,
    pub solved: bool,
    pub coding_challenge_status: CodingChallengeStatus,
    pub has_coding_challenge: bool,
    pub tutorial_order: Option<u32>,
    pub disabled_env: Option<String>,
    pub hint: Option<String>,
    pub hint_url: Option<String>,
    pub mitigation_url: Option<String>,
    /// Trimmed tags in source order.
    pub tag_list: Vec<String>,
    /// Description text exactly as received.
    pub original_description: String,
    /// Sanitizer output for the same text.
    pub description: SafeHtml,
}

impl EnrichedChallenge {
    /// Whether the challenge belongs to the tutorial.
    #[inline]
    #[must_use]
    pub fn is_tutorial(&self) -> bool {
        self.tutorial_order.is_some()
    }

    /// Whether the challenge is unavailable in the running environment.
    #[inline]
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled_env.is_some()
    }

    /// Whether the challenge also has a coding part.
    #[inline]
    #[must_use]
    pub fn is_coding_challenge(&self) -> bool {
        self.has_coding_challenge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip_through_u8() {
        for status in CodingChallengeStatus::ALL {
            assert_eq!(CodingChallengeStatus::try_from(status.code()), Ok(status));
        }
        assert_eq!(
            CodingChallengeStatus::try_from(3),
            Err(InvalidStatusCode(3))
        );
    }

    #[test]
    fn raw_challenge_deserializes_with_defaults() {
        let raw: RawChallenge = serde_json::from_str(
            r#"{"key":"scoreBoardChallenge","name":"Score Board","difficulty":1}"#,
        )
        .unwrap();
        assert_eq!(raw.key, "scoreBoardChallenge");
        assert_eq!(raw.tags, None);
        assert!(!raw.solved);
        assert_eq!(raw.coding_challenge_status, CodingChallengeStatus::NotAttempted);
        assert_eq!(raw.tutorial_order, None);
    }

    #[test]
    fn raw_challenge_reads_camel_case_fields() {
        let raw: RawChallenge = serde_json::from_str(
            r#"{
                "id": 7,
                "key": "xss",
                "name": "DOM XSS",
                "category": "XSS",
                "tags": "Tutorial, Good for Demos",
                "description": "<em>hi</em>",
                "difficulty": 1,
                "solved": true,
                "codingChallengeStatus": 2,
                "hasCodingChallenge": true,
                "tutorialOrder": 2,
                "disabledEnv": "Docker"
            }"#,
        )
        .unwrap();
        assert_eq!(raw.id, 7);
        assert_eq!(raw.coding_challenge_status, CodingChallengeStatus::Solved);
        assert!(raw.has_coding_challenge);
        assert_eq!(raw.tutorial_order, Some(2));
        assert_eq!(raw.disabled_env.as_deref(), Some("Docker"));
    }

    #[test]
    fn unknown_status_code_is_rejected() {
        let result: Result<RawChallenge, _> = serde_json::from_str(
            r#"{"key":"k","name":"n","difficulty":1,"codingChallengeStatus":5}"#,
        );
        assert!(result.is_err());
    }
}
