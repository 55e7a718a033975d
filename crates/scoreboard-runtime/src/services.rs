#![forbid(unsafe_code)]

//! External collaborators of the board.
//!
//! Inputs (challenge and configuration sources) are called from subscription
//! threads; outputs (navigation, dialog, notification) are called by the
//! [`Program`](crate::Program) while it executes commands on the controller's
//! thread. All of them are `Send + Sync` so they can be shared via [`Arc`].
//!
//! # Failure Modes
//!
//! | Failure | Raised by | Behavior |
//! |---------|-----------|----------|
//! | `ServiceError::Transport` | any collaborator | load: board stays loading; command: returned to caller |
//! | `ServiceError::Decode` | sources | same as transport |
//! | `ServiceError::Rejected` | outputs | returned to caller |
//!
//! No retries happen here; collaborators own their retry policy.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use scoreboard_core::{CodingChallengeStatus, Configuration, ParamMap, RawChallenge};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors reported by collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The transport failed (connection, timeout, ...).
    Transport(String),
    /// A response could not be decoded.
    Decode(String),
    /// The collaborator refused the request.
    Rejected(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Transport(msg) => write!(f, "transport error: {msg}"),
            ServiceError::Decode(msg) => write!(f, "decode error: {msg}"),
            ServiceError::Rejected(msg) => write!(f, "request rejected: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::Transport(e.to_string())
    }
}

/// Result type for collaborator calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

/// One-shot source of challenge records.
pub trait ChallengeSource: Send + Sync {
    /// Fetch all challenges, server-sorted by `sort`.
    fn find(&self, sort: &str) -> ServiceResult<Vec<RawChallenge>>;
}

/// One-shot source of the application configuration.
pub trait ConfigurationSource: Send + Sync {
    fn application_configuration(&self) -> ServiceResult<Configuration>;
}

impl<F> ChallengeSource for F
where
    F: Fn(&str) -> ServiceResult<Vec<RawChallenge>> + Send + Sync,
{
    fn find(&self, sort: &str) -> ServiceResult<Vec<RawChallenge>> {
        self(sort)
    }
}

impl<F> ConfigurationSource for F
where
    F: Fn() -> ServiceResult<Configuration> + Send + Sync,
{
    fn application_configuration(&self) -> ServiceResult<Configuration> {
        self()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outputs
// ─────────────────────────────────────────────────────────────────────────────

/// Writes new navigable state.
///
/// The board never applies a filter change directly; it navigates and waits
/// for the parameter stream to deliver the result.
pub trait Navigator: Send + Sync {
    fn navigate(&self, params: ParamMap) -> ServiceResult<()>;
}

/// What the coding challenge dialog is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogRequest {
    pub key: String,
    pub name: String,
    pub coding_challenge_status: CodingChallengeStatus,
}

/// Presentation surface for the coding challenge dialog.
pub trait CodingDialog: Send + Sync {
    fn open(&self, request: DialogRequest);
}

/// Server call that replays a challenge's solved notification.
pub trait NotificationService: Send + Sync {
    /// `encoded_name` is already URL-escaped.
    fn repeat_notification(&self, encoded_name: &str) -> ServiceResult<()>;
}

/// Output collaborators used while executing commands.
#[derive(Clone)]
pub struct Effects {
    pub navigator: Arc<dyn Navigator>,
    pub dialog: Arc<dyn CodingDialog>,
    pub notifications: Arc<dyn NotificationService>,
}

impl Effects {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        dialog: Arc<dyn CodingDialog>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            navigator,
            dialog,
            notifications,
        }
    }

    /// Outputs that record every call, for tests and headless runs.
    pub fn recording() -> (Self, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let effects = Self {
            navigator: recorder.clone(),
            dialog: recorder.clone(),
            notifications: recorder.clone(),
        };
        (effects, recorder)
    }
}

impl fmt::Debug for Effects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effects").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recorder
// ─────────────────────────────────────────────────────────────────────────────

/// Records calls made to the output collaborators.
#[derive(Debug, Default)]
pub struct Recorder {
    navigations: Mutex<Vec<ParamMap>>,
    dialogs: Mutex<Vec<DialogRequest>>,
    notifications: Mutex<Vec<String>>,
    fail_notifications: Mutex<Option<ServiceError>>,
}

impl Recorder {
    pub fn navigations(&self) -> Vec<ParamMap> {
        lock(&self.navigations).clone()
    }

    pub fn dialogs(&self) -> Vec<DialogRequest> {
        lock(&self.dialogs).clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        lock(&self.notifications).clone()
    }

    /// Make subsequent notification calls fail with `error`.
    pub fn fail_notifications_with(&self, error: ServiceError) {
        *lock(&self.fail_notifications) = Some(error);
    }
}

impl Navigator for Recorder {
    fn navigate(&self, params: ParamMap) -> ServiceResult<()> {
        lock(&self.navigations).push(params);
        Ok(())
    }
}

impl CodingDialog for Recorder {
    fn open(&self, request: DialogRequest) {
        lock(&self.dialogs).push(request);
    }
}

impl NotificationService for Recorder {
    fn repeat_notification(&self, encoded_name: &str) -> ServiceResult<()> {
        if let Some(err) = lock(&self.fail_notifications).clone() {
            return Err(err);
        }
        lock(&self.notifications).push(encoded_name.to_owned());
        Ok(())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_display() {
        assert_eq!(
            ServiceError::Transport("refused".into()).to_string(),
            "transport error: refused"
        );
        assert_eq!(ServiceError::Decode("bad json".into()).to_string(), "decode error: bad json");
        assert_eq!(ServiceError::Rejected("403".into()).to_string(), "request rejected: 403");
    }

    #[test]
    fn io_errors_become_transport_errors() {
        let err: ServiceError = std::io::Error::other("pipe closed").into();
        assert!(matches!(err, ServiceError::Transport(m) if m.contains("pipe closed")));
    }

    #[test]
    fn recorder_captures_calls() {
        let (effects, recorder) = Effects::recording();
        effects.navigator.navigate(ParamMap::new()).unwrap();
        effects.dialog.open(DialogRequest {
            key: "k".into(),
            name: "n".into(),
            coding_challenge_status: CodingChallengeStatus::NotAttempted,
        });
        effects.notifications.repeat_notification("Score%20Board").unwrap();

        assert_eq!(recorder.navigations().len(), 1);
        assert_eq!(recorder.dialogs()[0].key, "k");
        assert_eq!(recorder.notifications(), vec!["Score%20Board"]);
    }

    #[test]
    fn closures_are_sources() {
        let challenges = |sort: &str| -> ServiceResult<Vec<RawChallenge>> {
            Ok(vec![RawChallenge::new("k", sort, 1)])
        };
        let configuration = || -> ServiceResult<Configuration> { Ok(Configuration::default()) };
        assert_eq!(challenges.find("name").unwrap()[0].name, "name");
        assert!(configuration.application_configuration().is_ok());
    }

    #[test]
    fn recorder_can_fail_notifications() {
        let recorder = Recorder::default();
        recorder.fail_notifications_with(ServiceError::Rejected("nope".into()));
        assert_eq!(
            recorder.repeat_notification("x"),
            Err(ServiceError::Rejected("nope".into()))
        );
        assert!(recorder.notifications().is_empty());
    }
}
