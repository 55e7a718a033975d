#![forbid(unsafe_code)]

//! Elm-style program runtime for the board.
//!
//! A [`Model`] owns all state and changes only inside [`Model::update`]. The
//! [`Program`] feeds it messages from its subscriptions, one at a time, and
//! executes the [`Cmd`]s it returns against the output collaborators. Each
//! update runs to completion before the next message is taken, so a handler's
//! state change and recomputation are never observed half done.
//!
//! # Lifecycle
//!
//! ```text
//! Program::new ──activate──▶ active ──deactivate──▶ deactivated
//!                              │  ▲
//!                              ▼  │ pump / pump_until / dispatch
//! ```
//!
//! After [`Program::deactivate`] every entry point is a no-op: subscriptions
//! are stopped and their undelivered messages discarded.

use std::time::{Duration, Instant};

use scoreboard_core::ParamMap;

use crate::services::{DialogRequest, Effects, ServiceResult};
use crate::subscription::{SubId, Subscription, SubscriptionManager};

/// The board's application state and behavior.
pub trait Model: Sized {
    /// Messages that drive [`update`](Self::update).
    type Message: Send + 'static;

    /// Called once on activation.
    fn init(&mut self) -> Cmd {
        Cmd::none()
    }

    /// The state transition function.
    fn update(&mut self, msg: Self::Message) -> Cmd;

    /// Declare active subscriptions.
    ///
    /// Called after `init` and after each `update`. The runtime compares the
    /// returned set (by [`SubId`]) against running subscriptions and starts or
    /// stops as needed.
    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        vec![]
    }
}

/// Side effects requested by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cmd {
    /// No operation.
    #[default]
    None,
    /// Replace the navigable state with these parameters.
    Navigate(ParamMap),
    /// Show the coding challenge dialog.
    OpenCodingDialog(DialogRequest),
    /// Ask the server to replay a solved notification.
    RepeatNotification { key: String, encoded_name: String },
}

impl Cmd {
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    pub fn navigate(params: ParamMap) -> Self {
        Self::Navigate(params)
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Short name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Navigate(_) => "Navigate",
            Self::OpenCodingDialog(_) => "OpenCodingDialog",
            Self::RepeatNotification { .. } => "RepeatNotification",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime knobs for a [`Program`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramConfig {
    /// How long `pump_until` blocks per wait on the subscription channel.
    pub poll_interval: Duration,
    /// Upper bound on messages handled by a single `pump` call.
    pub max_messages_per_pump: usize,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            max_messages_per_pump: 1024,
        }
    }
}

impl ProgramConfig {
    #[must_use]
    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll_interval = poll;
        self
    }

    #[must_use]
    pub fn with_max_messages_per_pump(mut self, max: usize) -> Self {
        self.max_messages_per_pump = max.max(1);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Program
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Active,
    Deactivated,
}

/// Drives a [`Model`] from its subscriptions.
pub struct Program<M: Model> {
    model: M,
    effects: Effects,
    config: ProgramConfig,
    subscriptions: Option<SubscriptionManager<M::Message>>,
    lifecycle: Lifecycle,
    handled: u64,
}

impl<M: Model> Program<M> {
    pub fn new(model: M, effects: Effects) -> Self {
        Self::with_config(model, effects, ProgramConfig::default())
    }

    pub fn with_config(model: M, effects: Effects, config: ProgramConfig) -> Self {
        Self {
            model,
            effects,
            config,
            subscriptions: None,
            lifecycle: Lifecycle::Idle,
            handled: 0,
        }
    }

    /// Initialize the model and start its subscriptions.
    ///
    /// Calling this more than once, or after deactivation, does nothing.
    pub fn activate(&mut self) -> ServiceResult<()> {
        if self.lifecycle != Lifecycle::Idle {
            return Ok(());
        }
        self.lifecycle = Lifecycle::Active;
        self.subscriptions = Some(SubscriptionManager::new());
        tracing::debug!("program activated");

        let cmd = self.model.init();
        let result = self.execute_cmd(cmd);
        self.reconcile_subscriptions();
        result
    }

    /// Handle every message that has already arrived. Returns how many.
    pub fn pump(&mut self) -> ServiceResult<usize> {
        if self.subscriptions.is_none() {
            return Ok(0);
        }
        let mut count = 0;
        while count < self.config.max_messages_per_pump {
            let Some(msg) = self.subscriptions.as_ref().and_then(SubscriptionManager::try_recv)
            else {
                break;
            };
            self.handle(msg)?;
            count += 1;
        }
        if count > 0 {
            tracing::trace!(count, handled = self.handled, "pump drained subscription messages");
        }
        Ok(count)
    }

    /// Handle messages as they arrive until `done` holds or `timeout` passes.
    ///
    /// Returns whether `done` was satisfied.
    pub fn pump_until(
        &mut self,
        timeout: Duration,
        mut done: impl FnMut(&M) -> bool,
    ) -> ServiceResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump()?;
            if done(&self.model) {
                return Ok(true);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            let Some(mgr) = self.subscriptions.as_ref() else {
                return Ok(false);
            };
            if let Some(msg) = mgr.recv_timeout(remaining.min(self.config.poll_interval)) {
                self.handle(msg)?;
            }
        }
    }

    /// Deliver a message that originates on the controller's own thread,
    /// such as a user action.
    pub fn dispatch(&mut self, msg: M::Message) -> ServiceResult<()> {
        if self.lifecycle != Lifecycle::Active {
            return Ok(());
        }
        self.handle(msg)
    }

    /// Stop every subscription and discard undelivered messages.
    pub fn deactivate(&mut self) {
        if self.lifecycle == Lifecycle::Deactivated {
            return;
        }
        self.lifecycle = Lifecycle::Deactivated;
        let discarded = self.subscriptions.take().map_or(0, SubscriptionManager::shutdown);
        tracing::debug!(discarded, handled = self.handled, "program deactivated");
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    /// IDs of the subscriptions currently running.
    pub fn active_subscriptions(&self) -> Vec<SubId> {
        self.subscriptions
            .as_ref()
            .map(SubscriptionManager::active_ids)
            .unwrap_or_default()
    }

    /// Total messages handled through `update`.
    #[inline]
    pub fn handled(&self) -> u64 {
        self.handled
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// Run one update and its command.
    ///
    /// Subscriptions are reconciled even when the command fails, so the
    /// running set always matches the state the update left behind.
    fn handle(&mut self, msg: M::Message) -> ServiceResult<()> {
        self.handled += 1;
        let cmd = self.model.update(msg);
        let result = self.execute_cmd(cmd);
        self.reconcile_subscriptions();
        result
    }

    fn reconcile_subscriptions(&mut self) {
        if let Some(mgr) = self.subscriptions.as_mut() {
            mgr.reconcile(self.model.subscriptions());
        }
    }

    fn execute_cmd(&mut self, cmd: Cmd) -> ServiceResult<()> {
        match cmd {
            Cmd::None => {}
            Cmd::Navigate(params) => {
                tracing::debug!(params = params.len(), "navigating");
                self.effects.navigator.navigate(params)?;
            }
            Cmd::OpenCodingDialog(request) => {
                tracing::debug!(key = %request.key, "opening coding challenge dialog");
                self.effects.dialog.open(request);
            }
            Cmd::RepeatNotification { key, encoded_name } => {
                tracing::debug!(%key, "repeating challenge notification");
                self.effects.notifications.repeat_notification(&encoded_name)?;
            }
        }
        Ok(())
    }
}

impl<M: Model> Drop for Program<M> {
    fn drop(&mut self) {
        self.deactivate();
    }
}
