#![forbid(unsafe_code)]

//! JSON fixtures and the in-memory collaborators that serve them.
//!
//! A fixture describes one board session: what the two one-shot sources
//! return, the query string the board is opened with, and a script of inputs
//! delivered once the board is ready.
//!
//! ```json
//! {
//!   "configuration": { "challenges": { "restrictToTutorialsFirst": true } },
//!   "query": "?sortBy=name",
//!   "challenges": [ { "key": "scoreBoardChallenge", "name": "Score Board", "difficulty": 1 } ],
//!   "events": [ { "type": "challengeSolved", "key": "scoreBoardChallenge" } ]
//! }
//! ```

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use scoreboard_core::{ChallengeSolved, CodeChallengeSolved, Configuration, ParamMap, RawChallenge};
use scoreboard_runtime::{
    ChallengeSource, ConfigurationSource, Navigator, PushSender, ServiceError, ServiceResult,
};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while loading or replaying a fixture.
#[derive(Debug)]
pub enum FixtureError {
    /// Reading the fixture failed.
    Io(io::Error),
    /// The fixture is not valid JSON for a [`Fixture`].
    Parse(serde_json::Error),
    /// A collaborator call failed during replay.
    Service(ServiceError),
    /// The board did not reach the expected state in time.
    Timeout(String),
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureError::Io(e) => write!(f, "I/O error: {e}"),
            FixtureError::Parse(e) => write!(f, "fixture parse error: {e}"),
            FixtureError::Service(e) => write!(f, "service error: {e}"),
            FixtureError::Timeout(what) => write!(f, "timed out waiting for {what}"),
        }
    }
}

impl std::error::Error for FixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FixtureError::Io(e) => Some(e),
            FixtureError::Parse(e) => Some(e),
            FixtureError::Service(e) => Some(e),
            FixtureError::Timeout(_) => None,
        }
    }
}

impl From<io::Error> for FixtureError {
    fn from(e: io::Error) -> Self {
        FixtureError::Io(e)
    }
}

impl From<serde_json::Error> for FixtureError {
    fn from(e: serde_json::Error) -> Self {
        FixtureError::Parse(e)
    }
}

impl From<ServiceError> for FixtureError {
    fn from(e: ServiceError) -> Self {
        FixtureError::Service(e)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixture
// ─────────────────────────────────────────────────────────────────────────────

/// One scripted board session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub challenges: Vec<RawChallenge>,
    #[serde(default)]
    pub configuration: Configuration,
    /// Query string the board is opened with, leading `?` optional.
    #[serde(default)]
    pub query: String,
    /// Simulated latency of the challenge source.
    #[serde(default)]
    pub load_delay_ms: u64,
    /// Make the challenge source fail with this message.
    #[serde(default)]
    pub load_error: Option<String>,
    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
}

/// An input delivered after the board is ready.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScriptedEvent {
    /// Push on the "challenge solved" channel.
    ChallengeSolved(ChallengeSolved),
    /// Push on the "code challenge solved" channel.
    CodeChallengeSolved(CodeChallengeSolved),
    /// External navigation to a new query string.
    Navigate { query: String },
    /// The user resets the filter.
    ResetFilter,
    /// The user opens the coding dialog.
    OpenCodingDialog { key: String },
    /// The user asks to replay a solved notification.
    RepeatNotification { key: String },
}

impl ScriptedEvent {
    /// Whether delivering this event produces a new derived view.
    pub fn recomputes(&self) -> bool {
        !matches!(
            self,
            ScriptedEvent::OpenCodingDialog { .. } | ScriptedEvent::RepeatNotification { .. }
        )
    }
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let json = std::fs::read_to_string(path)?;
        let fixture = Self::from_json(&json)?;
        tracing::debug!(
            path = %path.display(),
            challenges = fixture.challenges.len(),
            events = fixture.events.len(),
            "fixture loaded"
        );
        Ok(fixture)
    }

    pub fn challenge_source(&self) -> MemoryChallenges {
        MemoryChallenges {
            challenges: self.challenges.clone(),
            delay: Duration::from_millis(self.load_delay_ms),
            error: self.load_error.clone(),
        }
    }

    pub fn configuration_source(&self) -> MemoryConfiguration {
        MemoryConfiguration(self.configuration.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory collaborators
// ─────────────────────────────────────────────────────────────────────────────

/// Challenge source backed by the fixture.
#[derive(Debug, Clone)]
pub struct MemoryChallenges {
    challenges: Vec<RawChallenge>,
    delay: Duration,
    error: Option<String>,
}

impl ChallengeSource for MemoryChallenges {
    fn find(&self, sort: &str) -> ServiceResult<Vec<RawChallenge>> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if let Some(message) = &self.error {
            return Err(ServiceError::Transport(message.clone()));
        }
        let mut challenges = self.challenges.clone();
        if sort == "name" {
            challenges.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(challenges)
    }
}

/// Configuration source backed by the fixture.
#[derive(Debug, Clone)]
pub struct MemoryConfiguration(Configuration);

impl ConfigurationSource for MemoryConfiguration {
    fn application_configuration(&self) -> ServiceResult<Configuration> {
        Ok(self.0.clone())
    }
}

/// Navigation store that feeds every write back into the parameter stream.
pub struct MemoryRouter {
    current: Mutex<ParamMap>,
    stream: PushSender<ParamMap>,
}

impl MemoryRouter {
    pub fn new(stream: PushSender<ParamMap>) -> Self {
        Self {
            current: Mutex::new(ParamMap::new()),
            stream,
        }
    }

    /// The parameters last navigated to.
    pub fn current(&self) -> ParamMap {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for MemoryRouter {
    fn navigate(&self, params: ParamMap) -> ServiceResult<()> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = params.clone();
        if self.stream.send(params) {
            Ok(())
        } else {
            Err(ServiceError::Transport("parameter stream closed".into()))
        }
    }
}
