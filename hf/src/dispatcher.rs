//! Dispatcher - hands one event to the worker

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::ack::{AckOutcome, Acknowledgment};
use crate::error::Error;
use crate::event::Envelope;
use crate::metrics::{DispatchCounters, DispatchMetrics};
use crate::worker::WorkerChannel;

/// Result of a blocking dispatch
///
/// Only `Acked` means the worker finished. The other variants end the wait
/// but leave the dispatch in flight; the worker may still complete it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchOutcome {
    Acked(AckOutcome),
    TimedOut,
    Cancelled,
    /// The worker dropped the acknowledgment without firing it
    Abandoned,
}

impl DispatchOutcome {
    /// The worker is known to be done with the event
    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Acked(_))
    }
}

/// Sends envelopes over the worker's invocation channel
///
/// The channel is attached once and owned exclusively for the life of the
/// dispatcher.
pub struct Dispatcher {
    method: String,
    channel: OnceLock<Arc<dyn WorkerChannel>>,
    counters: Arc<DispatchCounters>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("method", &self.method)
            .field("has_channel", &self.has_channel())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher that invokes `method` on the worker
    pub fn new(method: impl Into<String>) -> Self {
        let method = method.into();
        debug!(%method, "Dispatcher::new: called");
        Self {
            method,
            channel: OnceLock::new(),
            counters: Arc::new(DispatchCounters::default()),
        }
    }

    /// Install the worker's invocation channel
    pub fn attach(&self, channel: Arc<dyn WorkerChannel>) -> Result<(), Error> {
        if self.channel.set(channel).is_err() {
            warn!("Dispatcher::attach: channel already attached, rejecting");
            return Err(Error::ChannelAlreadyAttached);
        }
        info!(method = %self.method, "Worker channel attached");
        Ok(())
    }

    pub fn has_channel(&self) -> bool {
        self.channel.get().is_some()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn metrics(&self) -> DispatchMetrics {
        self.counters.snapshot()
    }

    fn channel(&self, seq: u64) -> &Arc<dyn WorkerChannel> {
        match self.channel.get() {
            Some(channel) => channel,
            None => {
                error!(seq, "Fatal: dispatch attempted before the worker channel exists");
                panic!("dispatch of event {seq} attempted before the worker channel exists");
            }
        }
    }

    /// Hand `envelope` to the worker without waiting
    ///
    /// # Panics
    ///
    /// Panics if no channel has been attached.
    pub fn dispatch_async(&self, envelope: &Envelope) {
        debug!(seq = envelope.seq, id = %envelope.event.id, "Dispatcher::dispatch_async: called");
        let channel = self.channel(envelope.seq);
        let ack = Acknowledgment::detached(envelope.seq, Some(self.counters.clone()));

        self.counters.record_dispatch(false);
        channel.invoke_method(&self.method, envelope.event.invocation_args(), ack);
    }

    /// Hand `envelope` to the worker and wait for its acknowledgment
    ///
    /// With `timeout` set, gives up after that long and returns
    /// [`DispatchOutcome::TimedOut`].
    ///
    /// # Panics
    ///
    /// Panics if no channel has been attached.
    pub async fn dispatch_blocking(&self, envelope: &Envelope, timeout: Option<Duration>) -> DispatchOutcome {
        self.dispatch_blocking_until(envelope, timeout, std::future::pending::<()>())
            .await
    }

    /// Like [`dispatch_blocking`](Self::dispatch_blocking), but also stops
    /// waiting when `cancel` completes
    ///
    /// # Panics
    ///
    /// Panics if no channel has been attached.
    pub async fn dispatch_blocking_until<C>(
        &self,
        envelope: &Envelope,
        timeout: Option<Duration>,
        cancel: C,
    ) -> DispatchOutcome
    where
        C: Future<Output = ()>,
    {
        debug!(seq = envelope.seq, id = %envelope.event.id, ?timeout, "Dispatcher::dispatch_blocking: called");
        let channel = self.channel(envelope.seq);
        let (ack, rx) = Acknowledgment::pair(envelope.seq, Some(self.counters.clone()));

        self.counters.record_dispatch(true);
        channel.invoke_method(&self.method, envelope.event.invocation_args(), ack);

        let wait = async {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, rx).await.ok(),
                None => Some(rx.await),
            }
        };

        let outcome = tokio::select! {
            biased;
            result = wait => match result {
                Some(Ok(outcome)) => DispatchOutcome::Acked(outcome),
                Some(Err(_)) => {
                    self.counters.record_abandoned();
                    DispatchOutcome::Abandoned
                }
                None => {
                    self.counters.record_timeout();
                    DispatchOutcome::TimedOut
                }
            },
            _ = cancel => {
                self.counters.record_cancel();
                DispatchOutcome::Cancelled
            }
        };

        match &outcome {
            DispatchOutcome::Acked(ack) => {
                debug!(seq = envelope.seq, kind = ack.kind(), "Dispatcher::dispatch_blocking: acknowledged")
            }
            other => warn!(seq = envelope.seq, outcome = ?other, "Stopped waiting on dispatch; left in flight"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::time::Instant;

    /// Worker that records calls and acknowledges according to `mode`
    struct StubChannel {
        calls: Mutex<Vec<(String, Vec<Value>)>>,
        held: Mutex<Vec<Acknowledgment>>,
        mode: Mode,
    }

    #[derive(Clone, Copy)]
    enum Mode {
        AckNow,
        AckAfter(Duration),
        Hold,
        Drop,
    }

    impl StubChannel {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                held: Mutex::new(Vec::new()),
                mode,
            })
        }
    }

    impl WorkerChannel for StubChannel {
        fn invoke_method(&self, method: &str, args: Vec<Value>, ack: Acknowledgment) {
            self.calls.lock().unwrap().push((method.to_string(), args));
            match self.mode {
                Mode::AckNow => {
                    ack.success(json!("ok"));
                }
                Mode::AckAfter(delay) => {
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        ack.success(Value::Null);
                    });
                }
                Mode::Hold => self.held.lock().unwrap().push(ack),
                Mode::Drop => drop(ack),
            }
        }
    }

    fn envelope(seq: u64) -> Envelope {
        Envelope::new(seq, Event::new(10, vec![json!(seq)]))
    }

    #[test]
    fn test_attach_once() {
        let dispatcher = Dispatcher::new("invokeCallback");
        assert!(!dispatcher.has_channel());

        dispatcher.attach(StubChannel::new(Mode::AckNow)).unwrap();
        assert!(dispatcher.has_channel());

        let err = dispatcher.attach(StubChannel::new(Mode::AckNow)).unwrap_err();
        assert!(matches!(err, Error::ChannelAlreadyAttached));
    }

    #[test]
    fn test_dispatch_async_sends_invocation_args() {
        let dispatcher = Dispatcher::new("invokeCallback");
        let channel = StubChannel::new(Mode::AckNow);
        dispatcher.attach(channel.clone()).unwrap();

        dispatcher.dispatch_async(&envelope(3));

        let calls = channel.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "invokeCallback");
        assert_eq!(calls[0].1, vec![json!(10), json!(3)]);

        let metrics = dispatcher.metrics();
        assert_eq!(metrics.dispatched, 1);
        assert_eq!(metrics.acked_success, 1);
    }

    #[test]
    #[should_panic(expected = "before the worker channel exists")]
    fn test_dispatch_without_channel_panics() {
        let dispatcher = Dispatcher::new("invokeCallback");
        dispatcher.dispatch_async(&envelope(1));
    }

    #[tokio::test]
    async fn test_blocking_waits_for_delayed_ack() {
        let dispatcher = Dispatcher::new("invokeCallback");
        dispatcher.attach(StubChannel::new(Mode::AckAfter(Duration::from_millis(100)))).unwrap();

        let started = Instant::now();
        let outcome = dispatcher.dispatch_blocking(&envelope(1), None).await;

        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(outcome, DispatchOutcome::Acked(AckOutcome::Success(Value::Null)));
    }

    #[tokio::test]
    async fn test_blocking_times_out_without_retracting() {
        let dispatcher = Dispatcher::new("invokeCallback");
        let channel = StubChannel::new(Mode::Hold);
        dispatcher.attach(channel.clone()).unwrap();

        let started = Instant::now();
        let outcome = dispatcher
            .dispatch_blocking(&envelope(1), Some(Duration::from_millis(80)))
            .await;

        assert_eq!(outcome, DispatchOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(80));

        // The worker still holds the dispatch and may finish it later
        let held = channel.held.lock().unwrap().pop().unwrap();
        assert!(held.success(Value::Null));
        assert_eq!(dispatcher.metrics().timed_out, 1);
    }

    #[tokio::test]
    async fn test_blocking_cancelled() {
        let dispatcher = Dispatcher::new("invokeCallback");
        dispatcher.attach(StubChannel::new(Mode::Hold)).unwrap();

        let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = cancel_tx.send(());
        });

        let outcome = dispatcher
            .dispatch_blocking_until(&envelope(1), None, async {
                let _ = cancel_rx.await;
            })
            .await;

        assert_eq!(outcome, DispatchOutcome::Cancelled);
        assert_eq!(dispatcher.metrics().cancelled, 1);
    }

    #[tokio::test]
    async fn test_ack_already_fired_beats_cancel() {
        let dispatcher = Dispatcher::new("invokeCallback");
        dispatcher.attach(StubChannel::new(Mode::AckNow)).unwrap();

        let outcome = dispatcher.dispatch_blocking_until(&envelope(1), None, async {}).await;
        assert!(outcome.is_completed());
    }

    #[tokio::test]
    async fn test_dropped_ack_is_abandoned() {
        let dispatcher = Dispatcher::new("invokeCallback");
        dispatcher.attach(StubChannel::new(Mode::Drop)).unwrap();

        let outcome = dispatcher.dispatch_blocking(&envelope(1), None).await;
        assert_eq!(outcome, DispatchOutcome::Abandoned);
        assert!(!outcome.is_completed());
    }

    #[tokio::test]
    async fn test_error_and_not_implemented_also_unblock() {
        struct ErrChannel;
        impl WorkerChannel for ErrChannel {
            fn invoke_method(&self, _method: &str, _args: Vec<Value>, ack: Acknowledgment) {
                ack.error("E1", Some("failed".to_string()), Value::Null);
            }
        }

        let dispatcher = Dispatcher::new("invokeCallback");
        dispatcher.attach(Arc::new(ErrChannel)).unwrap();

        let outcome = dispatcher.dispatch_blocking(&envelope(1), None).await;
        assert!(outcome.is_completed());
        assert_eq!(dispatcher.metrics().acked_error, 1);
    }
}
