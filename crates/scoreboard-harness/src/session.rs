#![forbid(unsafe_code)]

//! Replays a [`Fixture`] through a live [`Program`].
//!
//! The session wires the board exactly as a host application would: sources
//! run on subscription threads, push events and navigations travel through
//! push channels, and the program is pumped on the calling thread. After each
//! scripted event the session waits for the board to settle before moving
//! on, so the report reflects every event in script order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use scoreboard_core::{EscapeMarkup, Sanitizer, TrustedMarkup, from_query_string};
use scoreboard_runtime::{
    BoardInputs, BoardMsg, Effects, Program, ProgramConfig, Recorder, ScoreBoard, push_channel,
};

use crate::fixture::{Fixture, FixtureError, MemoryRouter, ScriptedEvent};
use crate::report::RunReport;

/// How a session is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Upper bound on every wait for the board to settle.
    pub timeout: Duration,
    pub poll: Duration,
    /// Escape description markup instead of trusting it.
    pub escape_markup: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll: Duration::from_millis(5),
            escape_markup: false,
        }
    }
}

impl RunOptions {
    /// Defaults overridden by `SCOREBOARD_HARNESS_TIMEOUT_MS`,
    /// `SCOREBOARD_HARNESS_POLL_MS` and `SCOREBOARD_HARNESS_ESCAPE_MARKUP`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let millis = |name: &str| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
        };
        Self {
            timeout: millis("SCOREBOARD_HARNESS_TIMEOUT_MS").unwrap_or(defaults.timeout),
            poll: millis("SCOREBOARD_HARNESS_POLL_MS").unwrap_or(defaults.poll),
            escape_markup: std::env::var("SCOREBOARD_HARNESS_ESCAPE_MARKUP")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.escape_markup),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_escape_markup(mut self, escape: bool) -> Self {
        self.escape_markup = escape;
        self
    }
}

/// Run `fixture` to completion and report the final board.
pub fn run(fixture: &Fixture, options: &RunOptions) -> Result<RunReport, FixtureError> {
    let (params_tx, params) = push_channel();
    let (solved_tx, solved) = push_channel();
    let (code_tx, code_solved) = push_channel();

    let sanitizer: Arc<dyn Sanitizer> = if options.escape_markup {
        Arc::new(EscapeMarkup)
    } else {
        Arc::new(TrustedMarkup)
    };
    let inputs = BoardInputs::new(
        Arc::new(fixture.challenge_source()),
        Arc::new(fixture.configuration_source()),
        params,
        solved,
        code_solved,
    )
    .with_sanitizer(sanitizer)
    .with_poll(options.poll);

    let router = Arc::new(MemoryRouter::new(params_tx.clone()));
    let recorder = Arc::new(Recorder::default());
    let effects = Effects::new(router.clone(), recorder.clone(), recorder.clone());
    let config = ProgramConfig::default().with_poll_interval(options.poll);
    let mut program = Program::with_config(ScoreBoard::new(inputs), effects, config);

    // The navigable state exists before the board does.
    params_tx.send(from_query_string(&fixture.query));

    program.activate()?;
    // Settled once both the load and the initial parameters are handled.
    wait_for(&mut program, options, "the initial load", |p| {
        p.model().is_ready() && p.handled() >= 2
    })?;
    tracing::info!(
        challenges = program.model().challenges().len(),
        events = fixture.events.len(),
        "board ready, replaying events"
    );

    for (index, event) in fixture.events.iter().enumerate() {
        let before = program.model().revision();
        match event.clone() {
            ScriptedEvent::ChallengeSolved(e) => {
                solved_tx.send(e);
            }
            ScriptedEvent::CodeChallengeSolved(e) => {
                code_tx.send(e);
            }
            ScriptedEvent::Navigate { query } => {
                params_tx.send(from_query_string(&query));
            }
            ScriptedEvent::ResetFilter => program.dispatch(BoardMsg::ResetFilter)?,
            ScriptedEvent::OpenCodingDialog { key } => {
                program.dispatch(BoardMsg::OpenCodingDialog(key))?;
            }
            ScriptedEvent::RepeatNotification { key } => {
                program.dispatch(BoardMsg::RepeatNotification(key))?;
            }
        }
        if event.recomputes() {
            wait_for(&mut program, options, &format!("event #{index}"), |p| {
                p.model().revision() > before
            })?;
        }
        tracing::debug!(index, revision = program.model().revision(), "event replayed");
    }

    let report = RunReport::capture(program.model(), &router.current(), &recorder);
    program.deactivate();
    Ok(report)
}

fn wait_for(
    program: &mut Program<ScoreBoard>,
    options: &RunOptions,
    what: &str,
    done: impl Fn(&Program<ScoreBoard>) -> bool,
) -> Result<(), FixtureError> {
    let deadline = Instant::now() + options.timeout;
    while !done(program) {
        if Instant::now() >= deadline {
            program.deactivate();
            return Err(FixtureError::Timeout(what.to_owned()));
        }
        program.pump_until(options.poll, |_| false)?;
    }
    Ok(())
}
