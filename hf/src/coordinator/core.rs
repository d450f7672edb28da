//! Main Coordinator implementation

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use eyre::Context;
use settingsstore::{FileSettings, SettingsStore};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::event::{Envelope, Event};
use crate::gate::ReadinessGate;
use crate::queue::PendingQueue;
use crate::worker::{LaunchRequest, WorkerLauncher};

use super::config::CoordinatorConfig;
use super::handle::WorkerInbox;
use super::messages::{CoordinatorStatus, LifecycleState, ReadyOutcome, StartOutcome, SubmitOutcome};

/// Lifecycle bookkeeping protected by mutex
///
/// The Ready state itself lives in the gate; this only tracks what happened
/// before it opened.
#[derive(Debug, Default)]
struct Lifecycle {
    start_requested: bool,
    ready_signalled: bool,
    ready_deferred: bool,
    starting_since: Option<(Instant, DateTime<Utc>)>,
    ready_since: Option<DateTime<Utc>>,
    callback_selector: Option<i64>,
    last_error: Option<String>,
    duplicate_starts: u64,
}

/// State shared by every clone of a [`Coordinator`] and by the worker inbox
pub(super) struct Shared {
    config: CoordinatorConfig,
    gate: ReadinessGate,
    queue: PendingQueue,
    dispatcher: Dispatcher,
    lifecycle: Mutex<Lifecycle>,
    next_seq: AtomicU64,
    /// Thread running the final drain batch, while it runs
    drain_thread: Mutex<Option<ThreadId>>,
    /// Events that thread submitted from inside a dispatch
    reentrant: Mutex<VecDeque<Envelope>>,
    launcher: Arc<dyn WorkerLauncher>,
    settings: Arc<dyn SettingsStore>,
}

/// Routes events to a background worker that may not be ready yet
///
/// Events submitted before the worker is ready are queued and handed over in
/// arrival order once it is; afterwards they go straight through. Cheap to
/// clone; every clone drives the same worker.
#[derive(Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state())
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl Coordinator {
    /// Create a coordinator that launches workers with `launcher` and reads
    /// the callback selector from `settings`
    pub fn new(
        config: CoordinatorConfig,
        launcher: Arc<dyn WorkerLauncher>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        debug!(?config, "Coordinator::new: called");
        let dispatcher = Dispatcher::new(config.dispatch_method.clone());
        Self {
            shared: Arc::new(Shared {
                config,
                gate: ReadinessGate::new(),
                queue: PendingQueue::new(),
                dispatcher,
                lifecycle: Mutex::new(Lifecycle::default()),
                next_seq: AtomicU64::new(0),
                drain_thread: Mutex::new(None),
                reentrant: Mutex::new(VecDeque::new()),
                launcher,
                settings,
            }),
        }
    }

    /// Create a coordinator from loaded configuration, backed by the
    /// configured settings file
    pub fn from_config(config: &Config, launcher: Arc<dyn WorkerLauncher>) -> eyre::Result<Self> {
        let settings = FileSettings::open(&config.settings.path).context("Failed to open settings store")?;
        Ok(Self::new(config.coordinator.clone(), launcher, Arc::new(settings)))
    }

    pub(super) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub(super) fn downgrade(&self) -> std::sync::Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    // Lifecycle holds plain flags, so a poisoned lock is still consistent.
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.shared.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.shared.config
    }

    pub fn state(&self) -> LifecycleState {
        if self.shared.gate.is_ready() {
            return LifecycleState::Ready;
        }
        if self.lifecycle().start_requested {
            LifecycleState::Starting
        } else {
            LifecycleState::Uninitialized
        }
    }

    /// Whether the worker has started and accepts dispatches
    pub fn is_running(&self) -> bool {
        self.shared.gate.is_ready()
    }

    pub fn pending_len(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.shared.dispatcher
    }

    /// Persist the callback selector used by later start requests
    pub fn set_callback_dispatcher(&self, selector: i64) -> Result<(), Error> {
        debug!(selector, "Coordinator::set_callback_dispatcher: called");
        self.shared.settings.set_i64(&self.shared.config.callback_key, selector)?;
        Ok(())
    }

    /// Request the worker, using the persisted selector when none is given
    ///
    /// Only the first request does anything; later ones are reported as
    /// duplicates. A launch failure leaves the coordinator starting, so
    /// submitted events stay queued and [`status`](Self::status) reports the
    /// stall.
    pub fn request_start(&self, selector: Option<i64>) -> StartOutcome {
        debug!(?selector, "Coordinator::request_start: called");
        self.start(selector, false)
    }

    fn start(&self, selector: Option<i64>, implicit: bool) -> StartOutcome {
        {
            let mut lifecycle = self.lifecycle();
            if lifecycle.start_requested {
                if implicit {
                    debug!("Coordinator::start: already requested");
                } else {
                    lifecycle.duplicate_starts += 1;
                    warn!(error = %Error::DuplicateStart, "Attempted to start a duplicate worker. Ignoring");
                }
                return StartOutcome::Duplicate;
            }
            lifecycle.start_requested = true;
            lifecycle.starting_since = Some((Instant::now(), Utc::now()));
        }

        let selector = match selector {
            Some(selector) => selector,
            None => self.persisted_selector(),
        };
        self.lifecycle().callback_selector = Some(selector);

        info!(selector, channel = %self.shared.config.channel_name, "Starting worker...");
        let request = LaunchRequest {
            callback_selector: selector,
            channel_name: self.shared.config.channel_name.clone(),
        };
        let inbox = WorkerInbox::new(self.downgrade(), self.shared.config.initialized_method.clone());

        let channel = match self.shared.launcher.launch(request, inbox) {
            Ok(channel) => channel,
            Err(e) => {
                if e.stalls_worker() {
                    error!(selector, error = %e, "Failed to launch worker; events will stay queued");
                } else {
                    error!(selector, error = %e, "Failed to launch worker");
                }
                self.lifecycle().last_error = Some(e.to_string());
                return StartOutcome::LaunchFailed { reason: e.to_string() };
            }
        };

        let deferred = {
            let mut lifecycle = self.lifecycle();
            if let Err(e) = self.shared.dispatcher.attach(channel) {
                error!(error = %e, "Failed to attach worker channel");
                lifecycle.last_error = Some(e.to_string());
                return StartOutcome::LaunchFailed { reason: e.to_string() };
            }
            std::mem::take(&mut lifecycle.ready_deferred)
        };

        if deferred {
            debug!("Coordinator::start: completing readiness signalled during launch");
            self.on_ready();
        }
        StartOutcome::Started
    }

    fn persisted_selector(&self) -> i64 {
        let key = &self.shared.config.callback_key;
        match self.shared.settings.get_i64(key) {
            Ok(Some(selector)) => selector,
            Ok(None) => {
                warn!(%key, "No callback selector persisted; using 0");
                0
            }
            Err(e) => {
                warn!(%key, error = %e, "Failed to read callback selector; using 0");
                0
            }
        }
    }

    fn next_envelope(&self, event: Event) -> Envelope {
        let seq = self.shared.next_seq.fetch_add(1, Ordering::SeqCst);
        Envelope::new(seq, event)
    }

    /// Route an event to the queue or to the worker
    ///
    /// If no worker was requested yet, requests one first. Never waits on
    /// the worker.
    pub fn submit(&self, event: Event) -> SubmitOutcome {
        debug!(id = %event.id, "Coordinator::submit: called");
        match self.accept(event) {
            Ok(outcome) => outcome,
            Err(envelope) => {
                self.shared.dispatcher.dispatch_async(&envelope);
                SubmitOutcome::Dispatched { seq: envelope.seq }
            }
        }
    }

    /// Like [`submit`](Self::submit), but once the worker is ready waits for
    /// it to finish the event
    ///
    /// `timeout` falls back to the configured blocking timeout. Events that
    /// arrive before readiness are queued and this returns at once.
    pub async fn submit_and_wait(&self, event: Event, timeout: Option<Duration>) -> SubmitOutcome {
        self.submit_and_wait_until(event, timeout, std::future::pending::<()>())
            .await
    }

    /// Like [`submit_and_wait`](Self::submit_and_wait), but also stops
    /// waiting when `cancel` completes
    pub async fn submit_and_wait_until<C>(&self, event: Event, timeout: Option<Duration>, cancel: C) -> SubmitOutcome
    where
        C: Future<Output = ()>,
    {
        debug!(id = %event.id, ?timeout, "Coordinator::submit_and_wait: called");
        match self.accept(event) {
            Ok(outcome) => outcome,
            Err(envelope) => {
                let timeout = timeout.or_else(|| self.shared.config.blocking_timeout());
                let outcome = self
                    .shared
                    .dispatcher
                    .dispatch_blocking_until(&envelope, timeout, cancel)
                    .await;
                SubmitOutcome::Completed {
                    seq: envelope.seq,
                    outcome,
                }
            }
        }
    }

    /// Queue the event if the gate is closed; hand it back if it is open
    fn accept(&self, event: Event) -> Result<SubmitOutcome, Envelope> {
        if self.shared.gate.is_ready() {
            return Err(self.next_envelope(event));
        }

        if !self.lifecycle().start_requested {
            self.start(None, true);
        }

        if self.is_drain_thread() {
            return Ok(self.defer_reentrant(event));
        }

        let mut seq = 0;
        let accepted = self.shared.queue.enqueue_while_closed(&self.shared.gate, || {
            let envelope = self.next_envelope(event);
            seq = envelope.seq;
            envelope
        });

        match accepted {
            Ok(depth) => {
                info!(seq, depth, "Worker has not started yet, queuing event");
                Ok(SubmitOutcome::Queued { seq, depth })
            }
            Err(envelope) => Err(envelope),
        }
    }

    /// Open the gate and hand every queued event to the worker, oldest first
    ///
    /// Legal once, after a start request. Queued events are dispatched without
    /// waiting, in two batches: what was queued when readiness arrived, then
    /// whatever producers added meanwhile. The second batch is dispatched under
    /// the queue lock and the gate opens before the lock is released, so
    /// producers wait for at most that batch and every queued event reaches
    /// the worker before any direct dispatch.
    pub fn on_ready(&self) -> ReadyOutcome {
        debug!("Coordinator::on_ready: called");
        {
            let mut lifecycle = self.lifecycle();
            if !lifecycle.start_requested {
                warn!("Readiness signalled before a worker was requested. Ignoring");
                return ReadyOutcome::NotStarted;
            }
            if lifecycle.ready_signalled {
                debug!("Coordinator::on_ready: already signalled");
                return ReadyOutcome::AlreadyReady;
            }
            if !self.shared.dispatcher.has_channel() {
                info!("Worker signalled ready before its channel was attached; deferring");
                lifecycle.ready_deferred = true;
                return ReadyOutcome::Deferred;
            }
            lifecycle.ready_signalled = true;
        }

        let dispatcher = &self.shared.dispatcher;
        let first = self.shared.queue.drain_into(|envelope| dispatcher.dispatch_async(&envelope));
        let rest = self
            .shared
            .queue
            .take_rest_and_open(&self.shared.gate, |rest| self.dispatch_final_batch(rest));
        let count = first + rest;

        self.lifecycle().ready_since = Some(Utc::now());
        info!(drained = count, "Worker started!");
        ReadyOutcome::Drained { count }
    }

    // Runs with the queue locked. A worker that submits from inside a
    // dispatch on this thread would deadlock on the queue, so those events
    // are collected aside and dispatched before the gate opens.
    fn dispatch_final_batch(&self, rest: Vec<Envelope>) -> usize {
        *self.drain_thread() = Some(thread::current().id());

        let mut count = 0;
        for envelope in rest {
            self.shared.dispatcher.dispatch_async(&envelope);
            count += 1;
        }
        loop {
            let next = self.reentrant().pop_front();
            let Some(envelope) = next else { break };
            self.shared.dispatcher.dispatch_async(&envelope);
            count += 1;
        }

        *self.drain_thread() = None;
        count
    }

    fn drain_thread(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.shared.drain_thread.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reentrant(&self) -> MutexGuard<'_, VecDeque<Envelope>> {
        self.shared.reentrant.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_drain_thread(&self) -> bool {
        *self.drain_thread() == Some(thread::current().id())
    }

    fn defer_reentrant(&self, event: Event) -> SubmitOutcome {
        let envelope = self.next_envelope(event);
        let seq = envelope.seq;
        let mut reentrant = self.reentrant();
        reentrant.push_back(envelope);
        debug!(seq, depth = reentrant.len(), "Coordinator::submit: queued behind final drain batch");
        SubmitOutcome::Queued {
            seq,
            depth: reentrant.len(),
        }
    }

    /// Wait until the worker is ready or `timeout` elapses
    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        self.shared.gate.wait_ready_timeout(timeout).await
    }

    pub fn status(&self) -> CoordinatorStatus {
        let state = self.state();
        let lifecycle = self.lifecycle();

        let starting_for = match (state, lifecycle.starting_since) {
            (LifecycleState::Starting, Some((since, _))) => Some(since.elapsed()),
            _ => None,
        };
        let stalled = starting_for
            .map(|elapsed| elapsed > self.shared.config.stall_threshold())
            .unwrap_or(false);

        CoordinatorStatus {
            state,
            running: state == LifecycleState::Ready,
            pending: self.shared.queue.len(),
            peak_pending: self.shared.queue.peak_depth(),
            next_seq: self.shared.next_seq.load(Ordering::SeqCst),
            callback_selector: lifecycle.callback_selector,
            starting_since: lifecycle.starting_since.map(|(_, wall)| wall),
            ready_since: lifecycle.ready_since,
            starting_for_ms: starting_for.map(|elapsed| elapsed.as_millis() as u64),
            stalled,
            last_error: lifecycle.last_error.clone(),
            duplicate_starts: lifecycle.duplicate_starts,
            dispatch: self.shared.dispatcher.metrics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ack::Acknowledgment;
    use crate::worker::WorkerChannel;
    use serde_json::{Value, json};
    use settingsstore::MemorySettings;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct RecordingChannel {
        calls: Mutex<Vec<Vec<Value>>>,
    }

    impl WorkerChannel for RecordingChannel {
        fn invoke_method(&self, _method: &str, args: Vec<Value>, ack: Acknowledgment) {
            self.calls.lock().unwrap().push(args);
            ack.success(Value::Null);
        }
    }

    impl RecordingChannel {
        fn tags(&self) -> Vec<Value> {
            self.calls.lock().unwrap().iter().map(|args| args[1].clone()).collect()
        }
    }

    /// Launcher that hands out one shared channel
    struct TestLauncher {
        channel: Arc<RecordingChannel>,
        launches: AtomicUsize,
        selectors: Mutex<Vec<i64>>,
        inbox: Mutex<Option<WorkerInbox>>,
        ready_during_launch: bool,
        unresolved: bool,
    }

    impl TestLauncher {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                channel: Arc::new(RecordingChannel::default()),
                launches: AtomicUsize::new(0),
                selectors: Mutex::new(Vec::new()),
                inbox: Mutex::new(None),
                ready_during_launch: false,
                unresolved: false,
            })
        }

        fn with(ready_during_launch: bool, unresolved: bool) -> Arc<Self> {
            Arc::new(Self {
                ready_during_launch,
                unresolved,
                ..Arc::into_inner(Self::new()).unwrap()
            })
        }
    }

    impl WorkerLauncher for TestLauncher {
        fn launch(&self, request: LaunchRequest, inbox: WorkerInbox) -> Result<Arc<dyn WorkerChannel>, Error> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            self.selectors.lock().unwrap().push(request.callback_selector);
            if self.unresolved {
                return Err(Error::UnresolvedCallback {
                    selector: request.callback_selector,
                });
            }
            if self.ready_during_launch {
                assert_eq!(inbox.initialized(), ReadyOutcome::Deferred);
            }
            *self.inbox.lock().unwrap() = Some(inbox);
            Ok(self.channel.clone())
        }
    }

    fn coordinator(launcher: Arc<TestLauncher>) -> Coordinator {
        Coordinator::new(
            CoordinatorConfig::default(),
            launcher,
            Arc::new(MemorySettings::with_value("callback_handle", 555)),
        )
    }

    fn event(tag: u64) -> Event {
        Event::new(1, vec![json!(tag)])
    }

    #[test]
    fn test_starts_uninitialized() {
        let coord = coordinator(TestLauncher::new());
        assert_eq!(coord.state(), LifecycleState::Uninitialized);
        assert!(!coord.is_running());
        assert_eq!(coord.on_ready(), ReadyOutcome::NotStarted);
    }

    #[test]
    fn test_first_submit_requests_start_and_queues() {
        let launcher = TestLauncher::new();
        let coord = coordinator(launcher.clone());

        let outcome = coord.submit(event(1));

        assert_eq!(outcome, SubmitOutcome::Queued { seq: 0, depth: 1 });
        assert_eq!(coord.state(), LifecycleState::Starting);
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
        assert_eq!(*launcher.selectors.lock().unwrap(), vec![555]);
    }

    #[test]
    fn test_ready_drains_in_order_then_dispatches_directly() {
        let launcher = TestLauncher::new();
        let coord = coordinator(launcher.clone());

        for tag in 1..=3 {
            assert!(coord.submit(event(tag)).is_queued());
        }
        assert_eq!(coord.pending_len(), 3);

        assert_eq!(coord.on_ready(), ReadyOutcome::Drained { count: 3 });
        assert_eq!(launcher.channel.tags(), vec![json!(1), json!(2), json!(3)]);
        assert_eq!(coord.pending_len(), 0);
        assert!(coord.is_running());

        assert_eq!(coord.submit(event(4)), SubmitOutcome::Dispatched { seq: 3 });
        assert_eq!(launcher.channel.tags().len(), 4);
        assert_eq!(coord.pending_len(), 0);
    }

    #[test]
    fn test_second_ready_has_no_effect() {
        let launcher = TestLauncher::new();
        let coord = coordinator(launcher.clone());
        coord.submit(event(1));

        assert_eq!(coord.on_ready(), ReadyOutcome::Drained { count: 1 });
        assert_eq!(coord.on_ready(), ReadyOutcome::AlreadyReady);
        assert_eq!(launcher.channel.tags().len(), 1);
        assert_eq!(coord.pending_len(), 0);
    }

    #[test]
    fn test_duplicate_start_is_reported() {
        let launcher = TestLauncher::new();
        let coord = coordinator(launcher.clone());

        assert_eq!(coord.request_start(Some(9)), StartOutcome::Started);
        assert_eq!(coord.request_start(Some(9)), StartOutcome::Duplicate);
        coord.on_ready();
        assert_eq!(coord.request_start(None), StartOutcome::Duplicate);

        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
        let status = coord.status();
        assert_eq!(status.callback_selector, Some(9));
        assert_eq!(status.duplicate_starts, 2);
    }

    #[test]
    fn test_implicit_start_is_not_a_duplicate() {
        let coord = coordinator(TestLauncher::new());
        coord.submit(event(1));
        coord.submit(event(2));

        assert_eq!(coord.status().duplicate_starts, 0);
    }

    #[test]
    fn test_ready_signalled_during_launch_is_deferred() {
        let launcher = TestLauncher::with(true, false);
        let coord = coordinator(launcher.clone());

        assert_eq!(coord.request_start(None), StartOutcome::Started);
        assert!(coord.is_running());
        assert_eq!(coord.on_ready(), ReadyOutcome::AlreadyReady);
    }

    #[test]
    fn test_unresolved_callback_stalls_with_events_queued() {
        let launcher = TestLauncher::with(false, true);
        let coord = Coordinator::new(
            CoordinatorConfig {
                stall_threshold_secs: 0,
                ..Default::default()
            },
            launcher.clone(),
            Arc::new(MemorySettings::new()),
        );

        coord.submit(event(1));
        coord.submit(event(2));
        std::thread::sleep(Duration::from_millis(5));

        let status = coord.status();
        assert_eq!(status.state, LifecycleState::Starting);
        assert_eq!(status.pending, 2);
        assert!(status.stalled);
        assert!(status.last_error.unwrap().contains("does not resolve"));
        assert_eq!(status.callback_selector, Some(0));

        // Readiness without a channel can never drain
        assert_eq!(coord.on_ready(), ReadyOutcome::Deferred);
        assert_eq!(coord.pending_len(), 2);
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_callback_dispatcher_persists_selector() {
        let launcher = TestLauncher::new();
        let coord = Coordinator::new(CoordinatorConfig::default(), launcher.clone(), Arc::new(MemorySettings::new()));

        coord.set_callback_dispatcher(4242).unwrap();
        coord.request_start(None);

        assert_eq!(*launcher.selectors.lock().unwrap(), vec![4242]);
    }

    #[test]
    fn test_inbox_routes_initialized_method() {
        let launcher = TestLauncher::new();
        let coord = coordinator(launcher.clone());
        coord.submit(event(1));

        let inbox = launcher.inbox.lock().unwrap().clone().unwrap();

        let (ack, mut rx) = Acknowledgment::pair(0, None);
        inbox.call("somethingElse", vec![], ack);
        assert_eq!(rx.try_recv().unwrap(), crate::ack::AckOutcome::NotImplemented);
        assert!(!coord.is_running());

        let (ack, mut rx) = Acknowledgment::pair(0, None);
        inbox.call("Dispatcher.initialized", vec![], ack);
        assert_eq!(rx.try_recv().unwrap(), crate::ack::AckOutcome::Success(json!(true)));
        assert!(coord.is_running());
        assert_eq!(launcher.channel.tags(), vec![json!(1)]);
    }

    #[test]
    fn test_inbox_after_coordinator_dropped() {
        let launcher = TestLauncher::new();
        let coord = coordinator(launcher.clone());
        coord.request_start(None);
        drop(coord);

        let inbox = launcher.inbox.lock().unwrap().clone().unwrap();
        assert_eq!(inbox.initialized(), ReadyOutcome::NotStarted);
    }

    #[tokio::test]
    async fn test_submit_and_wait_before_ready_returns_queued() {
        let coord = coordinator(TestLauncher::new());

        let outcome = coord.submit_and_wait(event(1), Some(Duration::from_millis(10))).await;
        assert!(outcome.is_queued());
    }

    #[tokio::test]
    async fn test_submit_and_wait_after_ready_completes() {
        let coord = coordinator(TestLauncher::new());
        coord.request_start(None);
        coord.on_ready();

        let outcome = coord.submit_and_wait(event(1), None).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Completed {
                seq: 0,
                outcome: crate::dispatcher::DispatchOutcome::Acked(crate::ack::AckOutcome::Success(Value::Null)),
            }
        );
    }

    #[tokio::test]
    async fn test_wait_ready() {
        let coord = coordinator(TestLauncher::new());
        coord.request_start(None);
        assert!(!coord.wait_ready(Duration::from_millis(10)).await);

        let background = coord.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            background.on_ready();
        });
        assert!(coord.wait_ready(Duration::from_secs(5)).await);
    }
}
