#![forbid(unsafe_code)]

//! Score board core.
//!
//! Pure building blocks for the challenge score board. Nothing in this crate
//! owns threads or talks to the outside world; the runtime crate wires these
//! pieces to the asynchronous inputs.
//!
//! # Key Components
//!
//! - [`RawChallenge`] / [`EnrichedChallenge`] - server records and their renderable form
//! - [`enrich`] - the challenge enricher (tag parsing, sanitized description)
//! - [`FilterSetting`] - user-controlled filter and sort specification
//! - [`pipeline::apply`] - filter/sort pipeline producing the derived view
//! - [`codec`] - lossless mapping between [`FilterSetting`] and flat URL parameters
//! - [`merge`] - folding push completion events into the canonical collection
//! - [`Progress`] - score card summary of the canonical collection
//!
//! # Data flow
//!
//! ```text
//! RawChallenge ──enrich──▶ EnrichedChallenge ──┐
//!                                               ├─▶ pipeline::apply ─▶ derived view
//! ParamMap ──codec::decode──▶ FilterSetting ───┘
//! ChallengeSolved / CodeChallengeSolved ──merge──▶ canonical collection
//! ```

pub mod challenge;
pub mod codec;
pub mod config;
pub mod enrich;
pub mod filter;
pub mod merge;
pub mod pipeline;
pub mod progress;
pub mod sanitize;

pub use challenge::{CodingChallengeStatus, EnrichedChallenge, MAX_DIFFICULTY, RawChallenge};
pub use codec::{ParamMap, decode, encode, from_query_string, to_query_string};
pub use config::{
    ApplicationConfig, ChallengesConfig, Configuration, effective_restrict_tutorial_first,
};
pub use enrich::{enrich, enrich_all, parse_tags};
pub use filter::{DifficultySet, FilterSetting, SolvedStatus, SortDirection, SortKey, SortOrder};
pub use merge::{
    ChallengeSolved, CodeChallengeSolved, merge_challenge_solved, merge_code_challenge_solved,
};
pub use pipeline::apply;
pub use progress::{DifficultyProgress, Progress};
pub use sanitize::{EscapeMarkup, SafeHtml, Sanitizer, TrustedMarkup};
