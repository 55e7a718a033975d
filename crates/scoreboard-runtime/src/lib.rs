#![forbid(unsafe_code)]

//! Score board runtime.
//!
//! Wires the pure pieces of `scoreboard-core` to the board's asynchronous
//! inputs and output collaborators.
//!
//! # Key Components
//!
//! - [`ScoreBoard`] - the reconciliation controller, an Elm-style [`Model`]
//! - [`Program`] - drives a model from its subscriptions and executes its [`Cmd`]s
//! - [`Subscription`] - trait for background input sources
//! - [`Join`] / [`Forward`] - built-in subscriptions for the bulk load and push channels
//! - [`ProgramSimulator`] - synchronous driver for tests
//!
//! # How it fits together
//!
//! External transports feed [`PushSender`]s. The matching [`PushStream`]s are
//! handed to the board through [`BoardInputs`]; the board declares one
//! subscription per input and the [`Program`] keeps exactly that set running
//! until it is deactivated.

pub mod controller;
pub mod program;
pub mod services;
pub mod simulator;
pub mod subscription;

pub use controller::{
    BoardInputs, BoardMsg, CODE_SUB, DEFAULT_SOURCE_SORT, DerivedView, LOAD_SUB, PARAMS_SUB, Phase,
    SOLVED_SUB, ScoreBoard,
};
pub use program::{Cmd, Model, Program, ProgramConfig};
pub use services::{
    ChallengeSource, CodingDialog, ConfigurationSource, DialogRequest, Effects, Navigator,
    NotificationService, Recorder, ServiceError, ServiceResult,
};
pub use simulator::{CmdRecord, ProgramSimulator};
pub use subscription::{
    Forward, Join, MockSubscription, PushSender, PushStream, StopSignal, SubId, Subscription,
    push_channel,
};
