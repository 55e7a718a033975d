#![forbid(unsafe_code)]

//! Deterministic program simulator for testing.
//!
//! `ProgramSimulator` runs a [`Model`] without threads or collaborators.
//! Messages are delivered synchronously, commands are recorded instead of
//! executed, and an optional router can loop `Navigate` commands back into
//! the model the way a real navigation store would.
//!
//! # Example
//!
//! ```ignore
//! use scoreboard_runtime::simulator::ProgramSimulator;
//!
//! let mut sim = ProgramSimulator::new(board).with_router(BoardMsg::ParamsChanged);
//! sim.init();
//! sim.send(BoardMsg::ResetFilter);
//! assert_eq!(sim.navigations().len(), 1);
//! ```

use scoreboard_core::ParamMap;

use crate::program::{Cmd, Model};
use crate::services::DialogRequest;
use crate::subscription::SubId;

/// Record of a command that was executed during simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdRecord {
    /// No-op command.
    None,
    Navigate(ParamMap),
    OpenCodingDialog(DialogRequest),
    RepeatNotification { key: String, encoded_name: String },
}

type Router<Msg> = Box<dyn FnMut(ParamMap) -> Msg>;

/// Deterministic simulator for [`Model`] testing.
pub struct ProgramSimulator<M: Model> {
    model: M,
    command_log: Vec<CmdRecord>,
    router: Option<Router<M::Message>>,
}

impl<M: Model> ProgramSimulator<M> {
    /// Create a new simulator with the given model.
    ///
    /// The model is not initialized until [`init`](Self::init) is called.
    pub fn new(model: M) -> Self {
        Self {
            model,
            command_log: Vec::new(),
            router: None,
        }
    }

    /// Deliver every `Navigate` command back to the model as the message
    /// built by `route`.
    #[must_use]
    pub fn with_router(mut self, route: impl FnMut(ParamMap) -> M::Message + 'static) -> Self {
        self.router = Some(Box::new(route));
        self
    }

    /// Initialize the model by calling `Model::init()` and executing returned commands.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
    }

    /// Send a specific message to the model.
    pub fn send(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
    }

    /// Send several messages in order.
    pub fn send_all(&mut self, msgs: impl IntoIterator<Item = M::Message>) {
        for msg in msgs {
            self.send(msg);
        }
    }

    /// IDs of the subscriptions the model currently declares.
    pub fn declared_subscriptions(&self) -> Vec<SubId> {
        self.model.subscriptions().iter().map(|s| s.id()).collect()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Get the command execution log.
    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    /// Every parameter map the model navigated to, oldest first.
    pub fn navigations(&self) -> Vec<&ParamMap> {
        self.command_log
            .iter()
            .filter_map(|r| match r {
                CmdRecord::Navigate(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    pub fn clear_command_log(&mut self) {
        self.command_log.clear();
    }

    fn execute_cmd(&mut self, cmd: Cmd) {
        match cmd {
            Cmd::None => self.command_log.push(CmdRecord::None),
            Cmd::Navigate(params) => {
                self.command_log.push(CmdRecord::Navigate(params.clone()));
                if let Some(route) = self.router.as_mut() {
                    let msg = route(params);
                    let cmd = self.model.update(msg);
                    self.execute_cmd(cmd);
                }
            }
            Cmd::OpenCodingDialog(request) => {
                self.command_log.push(CmdRecord::OpenCodingDialog(request));
            }
            Cmd::RepeatNotification { key, encoded_name } => {
                self.command_log
                    .push(CmdRecord::RepeatNotification { key, encoded_name });
            }
        }
    }
}
