#![forbid(unsafe_code)]

//! Snapshot of a board after a replayed session.

use std::fmt::Write as FmtWrite;

use serde::Serialize;

use scoreboard_core::{ParamMap, Progress, to_query_string};
use scoreboard_runtime::{Recorder, ScoreBoard};

/// One row of the derived view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRow {
    pub key: String,
    pub name: String,
    pub category: String,
    pub difficulty: u8,
    pub solved: bool,
    pub coding_challenge_status: u8,
    pub tutorial: bool,
    pub tags: Vec<String>,
    pub description: String,
}

/// Final state of a replayed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub revision: u64,
    /// Query string of the last navigation, empty if the board never navigated.
    pub query: String,
    pub rows: Vec<ViewRow>,
    pub progress: Progress,
    pub dialogs: Vec<String>,
    pub notifications: Vec<String>,
}

impl RunReport {
    pub fn capture(board: &ScoreBoard, navigated: &ParamMap, recorder: &Recorder) -> Self {
        let (revision, rows, progress) = match board.derived_view() {
            Some(view) => (
                view.revision,
                view.challenges
                    .iter()
                    .map(|c| ViewRow {
                        key: c.key.clone(),
                        name: c.name.clone(),
                        category: c.category.clone(),
                        difficulty: c.difficulty,
                        solved: c.solved,
                        coding_challenge_status: c.coding_challenge_status.code(),
                        tutorial: c.is_tutorial(),
                        tags: c.tag_list.clone(),
                        description: c.description.as_str().to_owned(),
                    })
                    .collect(),
                view.progress.clone(),
            ),
            None => (0, Vec::new(), Progress::default()),
        };
        let query = to_query_string(navigated).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "navigated parameters are not encodable");
            String::new()
        });
        Self {
            revision,
            query,
            rows,
            progress,
            dialogs: recorder.dialogs().into_iter().map(|d| d.key).collect(),
            notifications: recorder.notifications(),
        }
    }

    /// Keys of the visible rows, in view order.
    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }

    /// Plain-text table for terminals.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let p = &self.progress;
        let _ = writeln!(
            out,
            "revision {}  hacking {}/{} ({}%)  coding {}/{} ({}%)",
            self.revision,
            p.hacking_solved,
            p.hacking_total,
            p.hacking_percent(),
            p.coding_points,
            p.coding_points_available,
            p.coding_percent(),
        );
        if p.tutorial_mode {
            let _ = writeln!(out, "tutorial mode: unsolved tutorial challenges first");
        }
        if p.disabled > 0 {
            let _ = writeln!(out, "{} challenge(s) unavailable in this environment", p.disabled);
        }
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{} {:<6} {:<28} {:<16} {}",
                if row.solved { "[x]" } else { "[ ]" },
                "*".repeat(usize::from(row.difficulty)),
                row.name,
                row.category,
                row.tags.join(", "),
            );
        }
        if !self.query.is_empty() {
            let _ = writeln!(out, "query: ?{}", self.query);
        }
        out
    }
}
