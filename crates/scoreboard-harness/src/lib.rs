#![forbid(unsafe_code)]

//! Fixture replay for the score board.
//!
//! Loads a JSON [`Fixture`], runs it through a live board with in-memory
//! collaborators and captures the result as a [`RunReport`].
//!
//! # Quick Start
//!
//! ```ignore
//! use scoreboard_harness::{Fixture, RunOptions, run};
//!
//! let fixture = Fixture::load(Path::new("fixtures/demo.json"))?;
//! let report = run(&fixture, &RunOptions::default())?;
//! println!("{}", report.render_text());
//! ```

pub mod fixture;
pub mod report;
pub mod session;

pub use fixture::{
    Fixture, FixtureError, MemoryChallenges, MemoryConfiguration, MemoryRouter, ScriptedEvent,
};
pub use report::{RunReport, ViewRow};
pub use session::{RunOptions, run};

/// Install the global `tracing` subscriber.
///
/// Filtering comes from `RUST_LOG` (default `info`); `SCOREBOARD_LOG_JSON=1`
/// switches to JSON lines. Returns `false` if a subscriber was already set.
pub fn init_logging() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("SCOREBOARD_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
