#![forbid(unsafe_code)]

//! Score card summary of the canonical collection.
//!
//! Computed from the whole collection, not the derived view, so the cards do
//! not move when the user filters.

use serde::Serialize;

use crate::challenge::{EnrichedChallenge, MAX_DIFFICULTY};

/// Solved/total for one difficulty level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DifficultyProgress {
    pub difficulty: u8,
    pub solved: usize,
    pub total: usize,
}

/// Aggregate progress over the canonical collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub hacking_solved: usize,
    pub hacking_total: usize,
    /// Sum of coding status codes.
    pub coding_points: usize,
    /// Two points per coding challenge.
    pub coding_points_available: usize,
    /// Levels `1..=6` in order.
    pub by_difficulty: Vec<DifficultyProgress>,
    /// Challenges unavailable in the running environment.
    pub disabled: usize,
    /// Tutorial-first in effect with tutorial work left.
    pub tutorial_mode: bool,
}

impl Progress {
    /// Summarise `collection`.
    #[must_use]
    pub fn from_challenges(collection: &[EnrichedChallenge], restrict_tutorial_first: bool) -> Self {
        let mut by_difficulty: Vec<DifficultyProgress> = (1..=MAX_DIFFICULTY)
            .map(|difficulty| DifficultyProgress {
                difficulty,
                ..DifficultyProgress::default()
            })
            .collect();
        let mut progress = Self::default();

        for c in collection {
            progress.hacking_total += 1;
            if c.solved {
                progress.hacking_solved += 1;
            }
            if c.is_coding_challenge() {
                progress.coding_points += usize::from(c.coding_challenge_status.code());
                progress.coding_points_available += 2;
            }
            if c.is_disabled() {
                progress.disabled += 1;
            }
            if let Some(slot) = usize::from(c.difficulty)
                .checked_sub(1)
                .and_then(|i| by_difficulty.get_mut(i))
            {
                slot.total += 1;
                if c.solved {
                    slot.solved += 1;
                }
            }
        }

        progress.tutorial_mode =
            restrict_tutorial_first && collection.iter().any(|c| c.is_tutorial() && !c.solved);
        progress.by_difficulty = by_difficulty;
        progress
    }

    /// Hacking completion in percent, rounded down.
    #[must_use]
    pub fn hacking_percent(&self) -> usize {
        percent(self.hacking_solved, self.hacking_total)
    }

    /// Coding completion in percent, rounded down.
    #[must_use]
    pub fn coding_percent(&self) -> usize {
        percent(self.coding_points, self.coding_points_available)
    }
}

fn percent(part: usize, whole: usize) -> usize {
    if whole == 0 { 0 } else { part * 100 / whole }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{CodingChallengeStatus, RawChallenge};
    use crate::enrich::enrich;
    use crate::sanitize::TrustedMarkup;

    fn board() -> Vec<EnrichedChallenge> {
        let mut a = RawChallenge::new("a", "A", 1);
        a.solved = true;
        a.has_coding_challenge = true;
        a.coding_challenge_status = CodingChallengeStatus::Solved;
        let mut b = RawChallenge::new("b", "B", 1);
        b.tutorial_order = Some(1);
        let mut c = RawChallenge::new("c", "C", 3);
        c.has_coding_challenge = true;
        c.coding_challenge_status = CodingChallengeStatus::InProgress;
        c.disabled_env = Some("Heroku".into());
        [a, b, c].into_iter().map(|r| enrich(r, &TrustedMarkup)).collect()
    }

    #[test]
    fn counts_hacking_and_coding() {
        let p = Progress::from_challenges(&board(), true);
        assert_eq!((p.hacking_solved, p.hacking_total), (1, 3));
        assert_eq!((p.coding_points, p.coding_points_available), (3, 4));
        assert_eq!(p.hacking_percent(), 33);
        assert_eq!(p.coding_percent(), 75);
        assert_eq!(p.disabled, 1);
    }

    #[test]
    fn per_difficulty_buckets() {
        let p = Progress::from_challenges(&board(), false);
        assert_eq!(p.by_difficulty.len(), usize::from(MAX_DIFFICULTY));
        assert_eq!(p.by_difficulty[0], DifficultyProgress { difficulty: 1, solved: 1, total: 2 });
        assert_eq!(p.by_difficulty[2].total, 1);
        assert_eq!(p.by_difficulty[5].total, 0);
    }

    #[test]
    fn tutorial_mode_needs_flag_and_open_tutorial() {
        assert!(Progress::from_challenges(&board(), true).tutorial_mode);
        assert!(!Progress::from_challenges(&board(), false).tutorial_mode);

        let mut all = board();
        all[1].solved = true;
        assert!(!Progress::from_challenges(&all, true).tutorial_mode);
    }

    #[test]
    fn empty_collection_is_zero() {
        let p = Progress::from_challenges(&[], true);
        assert_eq!(p.hacking_percent(), 0);
        assert_eq!(p.coding_percent(), 0);
        assert!(!p.tutorial_mode);
    }
}
