#![forbid(unsafe_code)]

//! The score board reconciliation controller.
//!
//! [`ScoreBoard`] owns the canonical collection, the current filter and the
//! configuration. It reacts to four inputs, each delivered by one
//! subscription:
//!
//! | Input | Subscription | Effect |
//! |-------|--------------|--------|
//! | challenges + configuration | [`LOAD_SUB`] (join) | enrich, store, become ready |
//! | navigable parameters | [`PARAMS_SUB`] | decode and replace the filter |
//! | challenge solved | [`SOLVED_SUB`] | mark the challenge solved |
//! | coding challenge solved | [`CODE_SUB`] | replace the coding status |
//!
//! Every input that changes state while ready recomputes the
//! [`DerivedView`] in the same update. User filter edits never touch the
//! filter directly; they navigate, and the new parameters come back through
//! [`PARAMS_SUB`].
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──init──▶ Loading ──Loaded──▶ Ready
//!                           │ ▲
//!                           └─┘ LoadFailed
//! ```

use std::sync::Arc;
use std::time::Duration;

use scoreboard_core::{
    ChallengeSolved, CodeChallengeSolved, Configuration, EnrichedChallenge, FilterSetting,
    ParamMap, Progress, RawChallenge, Sanitizer, TrustedMarkup, decode,
    effective_restrict_tutorial_first, encode, enrich_all, merge_challenge_solved,
    merge_code_challenge_solved, pipeline,
};

use crate::program::{Cmd, Model};
use crate::services::{ChallengeSource, ConfigurationSource, DialogRequest, ServiceError};
use crate::subscription::{Forward, Join, PushStream, SubId, Subscription};

/// Bulk load of challenges joined with the configuration.
pub const LOAD_SUB: SubId = 0x4C4F_4144; // "LOAD"
/// Navigable parameter stream.
pub const PARAMS_SUB: SubId = 0x5052_4D53; // "PRMS"
/// "challenge solved" push channel.
pub const SOLVED_SUB: SubId = 0x534C_5644; // "SLVD"
/// "code challenge solved" push channel.
pub const CODE_SUB: SubId = 0x434F_4445; // "CODE"

/// Sort requested from the challenge source.
pub const DEFAULT_SOURCE_SORT: &str = "name";

/// Where the controller is in its single load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

/// Messages handled by [`ScoreBoard`].
#[derive(Debug, Clone)]
pub enum BoardMsg {
    /// Both one-shot sources delivered.
    Loaded {
        challenges: Vec<RawChallenge>,
        configuration: Configuration,
    },
    /// One of the one-shot sources failed.
    LoadFailed(ServiceError),
    /// The navigable parameters changed.
    ParamsChanged(ParamMap),
    ChallengeSolved(ChallengeSolved),
    CodeChallengeSolved(CodeChallengeSolved),
    /// The user edited the filter.
    FilterEdited(FilterSetting),
    /// The user asked for the default filter.
    ResetFilter,
    /// Open the coding dialog for the challenge with this key.
    OpenCodingDialog(String),
    /// Replay the solved notification of the challenge with this key.
    RepeatNotification(String),
}

/// The filtered, sorted view plus the score card, as of one recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedView {
    /// Increases by one on every recomputation.
    pub revision: u64,
    pub challenges: Vec<EnrichedChallenge>,
    pub progress: Progress,
}

impl DerivedView {
    /// Keys of the visible challenges, in view order.
    pub fn keys(&self) -> Vec<&str> {
        self.challenges.iter().map(|c| c.key.as_str()).collect()
    }
}

/// The asynchronous inputs a [`ScoreBoard`] subscribes to.
#[derive(Clone)]
pub struct BoardInputs {
    pub challenges: Arc<dyn ChallengeSource>,
    pub configuration: Arc<dyn ConfigurationSource>,
    pub sanitizer: Arc<dyn Sanitizer>,
    pub params: PushStream<ParamMap>,
    pub solved: PushStream<ChallengeSolved>,
    pub code_solved: PushStream<CodeChallengeSolved>,
    /// Sort spec passed to [`ChallengeSource::find`].
    pub source_sort: String,
    /// How often push forwarders check for shutdown.
    pub poll: Duration,
}

impl BoardInputs {
    pub fn new(
        challenges: Arc<dyn ChallengeSource>,
        configuration: Arc<dyn ConfigurationSource>,
        params: PushStream<ParamMap>,
        solved: PushStream<ChallengeSolved>,
        code_solved: PushStream<CodeChallengeSolved>,
    ) -> Self {
        Self {
            challenges,
            configuration,
            sanitizer: Arc::new(TrustedMarkup),
            params,
            solved,
            code_solved,
            source_sort: DEFAULT_SOURCE_SORT.to_owned(),
            poll: Duration::from_millis(10),
        }
    }

    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    #[must_use]
    pub fn with_source_sort(mut self, sort: impl Into<String>) -> Self {
        self.source_sort = sort.into();
        self
    }

    #[must_use]
    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }
}

/// Reconciles the board's inputs into one derived view.
pub struct ScoreBoard {
    inputs: BoardInputs,
    phase: Phase,
    challenges: Vec<EnrichedChallenge>,
    filter: FilterSetting,
    configuration: Option<Configuration>,
    view: Option<DerivedView>,
    revision: u64,
}

impl ScoreBoard {
    pub fn new(inputs: BoardInputs) -> Self {
        Self {
            inputs,
            phase: Phase::Uninitialized,
            challenges: Vec::new(),
            filter: FilterSetting::default(),
            configuration: None,
            view: None,
            revision: 0,
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// The current derived view; `None` until the bulk load has arrived.
    pub fn derived_view(&self) -> Option<&DerivedView> {
        match self.phase {
            Phase::Ready => self.view.as_ref(),
            Phase::Uninitialized | Phase::Loading => None,
        }
    }

    /// Revision of the latest derived view, 0 before the first one.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The canonical collection.
    pub fn challenges(&self) -> &[EnrichedChallenge] {
        &self.challenges
    }

    pub fn filter(&self) -> &FilterSetting {
        &self.filter
    }

    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    fn recompute(&mut self) {
        let restrict = effective_restrict_tutorial_first(self.configuration.as_ref());
        let challenges = pipeline::apply(&self.challenges, &self.filter, restrict);
        let progress = Progress::from_challenges(&self.challenges, restrict);
        self.revision += 1;
        tracing::trace!(
            revision = self.revision,
            canonical = self.challenges.len(),
            visible = challenges.len(),
            "derived view recomputed"
        );
        self.view = Some(DerivedView {
            revision: self.revision,
            challenges,
            progress,
        });
    }

    fn recompute_if_ready(&mut self) {
        if self.is_ready() {
            self.recompute();
        }
    }

    fn find(&self, key: &str) -> Option<&EnrichedChallenge> {
        self.challenges.iter().find(|c| c.key == key)
    }

    fn load_subscription(&self) -> Join<Vec<RawChallenge>, Configuration, BoardMsg> {
        let source = Arc::clone(&self.inputs.challenges);
        let sort = self.inputs.source_sort.clone();
        let configuration = Arc::clone(&self.inputs.configuration);
        Join::new(
            LOAD_SUB,
            move || source.find(&sort),
            move || configuration.application_configuration(),
            |challenges, configuration| BoardMsg::Loaded {
                challenges,
                configuration,
            },
            BoardMsg::LoadFailed,
        )
    }
}

impl Model for ScoreBoard {
    type Message = BoardMsg;

    fn init(&mut self) -> Cmd {
        if self.phase == Phase::Uninitialized {
            self.phase = Phase::Loading;
            tracing::debug!("score board loading");
        }
        Cmd::none()
    }

    fn update(&mut self, msg: BoardMsg) -> Cmd {
        match msg {
            BoardMsg::Loaded {
                challenges,
                configuration,
            } => {
                if self.phase == Phase::Ready {
                    tracing::warn!(
                        count = challenges.len(),
                        "challenges delivered again after load; ignored"
                    );
                    return Cmd::none();
                }
                self.challenges = enrich_all(challenges, self.inputs.sanitizer.as_ref());
                self.configuration = Some(configuration);
                self.phase = Phase::Ready;
                tracing::debug!(count = self.challenges.len(), "score board ready");
                self.recompute();
            }
            BoardMsg::LoadFailed(err) => {
                tracing::warn!(error = %err, "loading challenges failed");
            }
            BoardMsg::ParamsChanged(params) => {
                self.filter = decode(&params);
                tracing::debug!(params = params.len(), "filter replaced from parameters");
                self.recompute_if_ready();
            }
            BoardMsg::ChallengeSolved(event) => {
                tracing::debug!(key = %event.key, "challenge solved");
                self.challenges =
                    merge_challenge_solved(std::mem::take(&mut self.challenges), &event);
                self.recompute_if_ready();
            }
            BoardMsg::CodeChallengeSolved(event) => {
                tracing::debug!(
                    key = %event.key,
                    status = event.coding_challenge_status.code(),
                    "coding challenge status changed"
                );
                self.challenges =
                    merge_code_challenge_solved(std::mem::take(&mut self.challenges), &event);
                self.recompute_if_ready();
            }
            BoardMsg::FilterEdited(filter) => return Cmd::navigate(encode(&filter)),
            BoardMsg::ResetFilter => return Cmd::navigate(encode(&FilterSetting::default())),
            BoardMsg::OpenCodingDialog(key) => {
                let Some(challenge) = self.find(&key) else {
                    tracing::error!(%key, "coding dialog requested for unknown challenge");
                    return Cmd::none();
                };
                return Cmd::OpenCodingDialog(DialogRequest {
                    key: challenge.key.clone(),
                    name: challenge.name.clone(),
                    coding_challenge_status: challenge.coding_challenge_status,
                });
            }
            BoardMsg::RepeatNotification(key) => {
                let Some(challenge) = self.find(&key) else {
                    tracing::error!(%key, "notification repeat requested for unknown challenge");
                    return Cmd::none();
                };
                return Cmd::RepeatNotification {
                    key,
                    encoded_name: urlencoding::encode(&challenge.name).into_owned(),
                };
            }
        }
        Cmd::none()
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<BoardMsg>>> {
        if self.phase == Phase::Uninitialized {
            return vec![];
        }
        let poll = self.inputs.poll;
        let mut subs: Vec<Box<dyn Subscription<BoardMsg>>> = Vec::with_capacity(4);
        if self.phase == Phase::Loading {
            subs.push(Box::new(self.load_subscription()));
        }
        subs.push(Box::new(Forward::new(
            PARAMS_SUB,
            self.inputs.params.clone(),
            poll,
            BoardMsg::ParamsChanged,
        )));
        subs.push(Box::new(Forward::new(
            SOLVED_SUB,
            self.inputs.solved.clone(),
            poll,
            BoardMsg::ChallengeSolved,
        )));
        subs.push(Box::new(Forward::new(
            CODE_SUB,
            self.inputs.code_solved.clone(),
            poll,
            BoardMsg::CodeChallengeSolved,
        )));
        subs
    }
}
