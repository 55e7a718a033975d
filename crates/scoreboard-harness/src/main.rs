#![forbid(unsafe_code)]

//! Score board reference application.
//!
//! Replays a fixture through a live board and prints the final derived view.
//!
//! # Running
//!
//! ```sh
//! cargo run -p scoreboard-harness
//! SCOREBOARD_HARNESS_FIXTURE=path/to/board.json cargo run -p scoreboard-harness
//! ```
//!
//! # Environment
//!
//! - `SCOREBOARD_HARNESS_FIXTURE`: fixture path (default: bundled `fixtures/demo.json`)
//! - `SCOREBOARD_HARNESS_OUTPUT`: `text` (default) or `json`
//! - `SCOREBOARD_HARNESS_TIMEOUT_MS`, `SCOREBOARD_HARNESS_POLL_MS`,
//!   `SCOREBOARD_HARNESS_ESCAPE_MARKUP`: see [`RunOptions::from_env`]
//! - `SCOREBOARD_LOG_JSON=1`: JSON log lines on stderr; `RUST_LOG` filters them
//! - `RUST_LOG=scoreboard_runtime=trace`: subscription and recompute traces

use std::path::PathBuf;
use std::process::ExitCode;

use scoreboard_harness::{Fixture, FixtureError, RunOptions, init_logging, run};

const DEFAULT_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/demo.json");

fn main() -> ExitCode {
    init_logging();
    match replay() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "replay failed");
            eprintln!("scoreboard-harness: {err}");
            ExitCode::FAILURE
        }
    }
}

fn replay() -> Result<(), FixtureError> {
    let path = std::env::var("SCOREBOARD_HARNESS_FIXTURE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_FIXTURE));
    let fixture = Fixture::load(&path)?;
    let report = run(&fixture, &RunOptions::from_env())?;

    let json = std::env::var("SCOREBOARD_HARNESS_OUTPUT").is_ok_and(|v| v == "json");
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}
