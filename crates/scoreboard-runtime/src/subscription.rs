#![forbid(unsafe_code)]

//! Subscription system for the board's asynchronous inputs.
//!
//! Subscriptions are the only way data reaches the controller: the bulk-load
//! join, the parameter stream and the two push channels each run as one
//! subscription on a background thread and deliver messages through a shared
//! channel. The controller itself only ever runs on the thread that drains
//! that channel.
//!
//! # How it works
//!
//! 1. `Model::subscriptions()` returns the set of active subscriptions
//! 2. After each `update()`, the runtime compares declared vs running IDs
//! 3. New subscriptions are started, removed ones are stopped
//! 4. Subscription messages are routed through `Model::update()`
//!
//! Shutting the manager down stops every running subscription once and drops
//! the receiving end of the channel, so anything still buffered is discarded
//! instead of being handled after deactivation.

use std::collections::HashSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::services::ServiceError;

/// A unique identifier for a subscription.
///
/// Subscriptions with equal IDs are the same subscription; the manager never
/// runs two of them at once and never restarts one that is still declared.
pub type SubId = u64;

/// A subscription produces messages from an external event source.
pub trait Subscription<M: Send + 'static>: Send {
    /// Unique identifier for deduplication.
    fn id(&self) -> SubId;

    /// Deliver messages until the source is exhausted, the channel closes,
    /// or `stop` is triggered. Runs on a background thread.
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal);
}

// ─────────────────────────────────────────────────────────────────────────────
// Stop Signal
// ─────────────────────────────────────────────────────────────────────────────

/// Signal for stopping a subscription.
#[derive(Clone)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create a new stop signal pair (signal, trigger).
    pub(crate) fn new() -> (Self, StopTrigger) {
        let stopped = Arc::new(AtomicBool::new(false));
        let signal = Self {
            stopped: Arc::clone(&stopped),
        };
        (signal, StopTrigger { stopped })
    }

    /// Check if the stop signal has been triggered.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Trigger to stop a subscription from the runtime side.
pub(crate) struct StopTrigger {
    stopped: Arc<AtomicBool>,
}

impl StopTrigger {
    pub(crate) fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}

/// A running subscription handle.
pub(crate) struct RunningSubscription {
    pub(crate) id: SubId,
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningSubscription {
    /// Stop the subscription and join its thread.
    pub(crate) fn stop(mut self) {
        self.trigger.stop();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RunningSubscription {
    fn drop(&mut self) {
        self.trigger.stop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Manager
// ─────────────────────────────────────────────────────────────────────────────

/// Manages the lifecycle of subscriptions for a program.
pub(crate) struct SubscriptionManager<M: Send + 'static> {
    active: Vec<RunningSubscription>,
    sender: mpsc::Sender<M>,
    receiver: mpsc::Receiver<M>,
}

impl<M: Send + 'static> SubscriptionManager<M> {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            active: Vec::new(),
            sender,
            receiver,
        }
    }

    /// Update the set of active subscriptions.
    ///
    /// - Starts subscriptions that are new (ID not in active set)
    /// - Stops subscriptions that are no longer declared
    /// - Leaves unchanged subscriptions running
    pub(crate) fn reconcile(&mut self, subscriptions: Vec<Box<dyn Subscription<M>>>) {
        let new_ids: HashSet<SubId> = subscriptions.iter().map(|s| s.id()).collect();
        let active_before = self.active.len();

        let mut remaining = Vec::with_capacity(self.active.len());
        for running in self.active.drain(..) {
            if new_ids.contains(&running.id) {
                remaining.push(running);
            } else {
                tracing::debug!(sub_id = running.id, "stopping subscription");
                running.stop();
            }
        }
        self.active = remaining;

        let mut active_ids: HashSet<SubId> = self.active.iter().map(|r| r.id).collect();
        for sub in subscriptions {
            let id = sub.id();
            if !active_ids.insert(id) {
                continue;
            }

            tracing::debug!(sub_id = id, "starting subscription");
            let (signal, trigger) = StopSignal::new();
            let sender = self.sender.clone();
            let thread = thread::spawn(move || {
                sub.run(sender, signal);
            });

            self.active.push(RunningSubscription {
                id,
                trigger,
                thread: Some(thread),
            });
        }

        let active_after = self.active.len();
        if active_after != active_before {
            tracing::trace!(active_before, active_after, "subscription reconcile complete");
        }
    }

    /// Drain pending messages without blocking.
    #[cfg(test)]
    pub(crate) fn drain_messages(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }

    /// Take the next message if one is waiting.
    pub(crate) fn try_recv(&self) -> Option<M> {
        self.receiver.try_recv().ok()
    }

    /// Block up to `timeout` for the next message.
    pub(crate) fn recv_timeout(&self, timeout: Duration) -> Option<M> {
        self.receiver.recv_timeout(timeout).ok()
    }

    #[cfg(test)]
    pub(crate) fn active_count(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn active_ids(&self) -> Vec<SubId> {
        self.active.iter().map(|r| r.id).collect()
    }

    /// Stop all running subscriptions.
    pub(crate) fn stop_all(&mut self) {
        for running in self.active.drain(..) {
            tracing::debug!(sub_id = running.id, "stopping subscription");
            running.stop();
        }
    }

    /// Stop everything and discard undelivered messages.
    ///
    /// Returns how many buffered messages were dropped.
    pub(crate) fn shutdown(mut self) -> usize {
        self.stop_all();
        self.receiver.try_iter().count()
    }
}

impl<M: Send + 'static> Drop for SubscriptionManager<M> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Push Channels
// ─────────────────────────────────────────────────────────────────────────────

/// Create the pair an external transport uses to feed a [`Forward`]
/// subscription.
pub fn push_channel<T>() -> (PushSender<T>, PushStream<T>) {
    let (tx, rx) = mpsc::channel();
    (
        PushSender { inner: tx },
        PushStream {
            inner: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer half held by the transport (socket, router, test).
pub struct PushSender<T> {
    inner: mpsc::Sender<T>,
}

impl<T> PushSender<T> {
    /// Deliver a value. Returns `false` once the stream is gone.
    pub fn send(&self, value: T) -> bool {
        self.inner.send(value).is_ok()
    }
}

impl<T> Clone for PushSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Consumer half; cloning shares the same queue.
pub struct PushStream<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for PushStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in Subscriptions
// ─────────────────────────────────────────────────────────────────────────────

/// Relays every value of a [`PushStream`] into the model.
///
/// Values still queued in the stream when the subscription stops stay there,
/// except for at most one value already taken off the stream while the stop
/// was being triggered, which is dropped. Nothing is forwarded after the stop
/// signal is observed.
pub struct Forward<T, M> {
    id: SubId,
    stream: PushStream<T>,
    poll: Duration,
    make_msg: Arc<dyn Fn(T) -> M + Send + Sync>,
}

impl<T, M> Forward<T, M> {
    pub fn new(
        id: SubId,
        stream: PushStream<T>,
        poll: Duration,
        make_msg: impl Fn(T) -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            stream,
            poll,
            make_msg: Arc::new(make_msg),
        }
    }
}

impl<T: Send + 'static, M: Send + 'static> Subscription<M> for Forward<T, M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        let receiver = self.stream.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut forwarded: u64 = 0;
        loop {
            if stop.is_stopped() {
                break;
            }
            match receiver.recv_timeout(self.poll) {
                Ok(value) => {
                    if stop.is_stopped() {
                        break;
                    }
                    if sender.send((self.make_msg)(value)).is_err() {
                        break;
                    }
                    forwarded += 1;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::trace!(sub_id = self.id, forwarded, "forward subscription finished");
    }
}

type Loader<T> = Arc<dyn Fn() -> Result<T, ServiceError> + Send + Sync>;

/// Runs two one-shot loaders concurrently and delivers one message once both
/// have produced a value.
///
/// If either loader fails, a single failure message is delivered instead and
/// the other result is discarded. A loader that terminates without a result
/// (a panic) counts as a transport failure.
pub struct Join<A, B, M> {
    id: SubId,
    poll: Duration,
    left: Loader<A>,
    right: Loader<B>,
    on_ready: Arc<dyn Fn(A, B) -> M + Send + Sync>,
    on_error: Arc<dyn Fn(ServiceError) -> M + Send + Sync>,
}

impl<A, B, M> Join<A, B, M> {
    pub fn new(
        id: SubId,
        left: impl Fn() -> Result<A, ServiceError> + Send + Sync + 'static,
        right: impl Fn() -> Result<B, ServiceError> + Send + Sync + 'static,
        on_ready: impl Fn(A, B) -> M + Send + Sync + 'static,
        on_error: impl Fn(ServiceError) -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            poll: Duration::from_millis(20),
            left: Arc::new(left),
            right: Arc::new(right),
            on_ready: Arc::new(on_ready),
            on_error: Arc::new(on_error),
        }
    }

    /// How often the waiting thread checks the stop signal.
    #[must_use]
    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }
}

enum Half<A, B> {
    Left(Result<A, ServiceError>),
    Right(Result<B, ServiceError>),
}

impl<A, B, M> Subscription<M> for Join<A, B, M>
where
    A: Send + 'static,
    B: Send + 'static,
    M: Send + 'static,
{
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        let (tx, rx) = mpsc::channel::<Half<A, B>>();

        // Loader threads are detached; a result arriving after stop is dropped
        // with the channel.
        let left = Arc::clone(&self.left);
        let left_tx = tx.clone();
        thread::spawn(move || {
            let _ = left_tx.send(Half::Left(left()));
        });
        let right = Arc::clone(&self.right);
        thread::spawn(move || {
            let _ = tx.send(Half::Right(right()));
        });

        let mut left_value = None;
        let mut right_value = None;
        while left_value.is_none() || right_value.is_none() {
            if stop.is_stopped() {
                tracing::trace!(sub_id = self.id, "join subscription stopped before completion");
                return;
            }
            let half = match rx.recv_timeout(self.poll) {
                Ok(half) => half,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!(sub_id = self.id, "loader terminated without a result");
                    if !stop.is_stopped() {
                        let _ = sender.send((self.on_error)(ServiceError::Transport(
                            "loader terminated without a result".into(),
                        )));
                    }
                    return;
                }
            };
            let failure = match half {
                Half::Left(Ok(a)) => {
                    left_value = Some(a);
                    None
                }
                Half::Right(Ok(b)) => {
                    right_value = Some(b);
                    None
                }
                Half::Left(Err(err)) | Half::Right(Err(err)) => Some(err),
            };
            if let Some(err) = failure {
                if !stop.is_stopped() {
                    let _ = sender.send((self.on_error)(err));
                }
                return;
            }
        }

        if stop.is_stopped() {
            return;
        }
        if let (Some(a), Some(b)) = (left_value, right_value) {
            let _ = sender.send((self.on_ready)(a, b));
        }
    }
}

/// A mock subscription for testing.
///
/// Immediately sends all queued messages and then stops.
pub struct MockSubscription<M: Send + 'static> {
    id: SubId,
    messages: Vec<M>,
}

impl<M: Send + Clone + 'static> MockSubscription<M> {
    pub fn new(id: SubId, messages: Vec<M>) -> Self {
        Self { id, messages }
    }
}

impl<M: Send + Clone + 'static> Subscription<M> for MockSubscription<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, _stop: StopSignal) {
        for msg in &self.messages {
            if sender.send(msg.clone()).is_err() {
                break;
            }
        }
    }
}
