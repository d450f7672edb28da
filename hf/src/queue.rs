//! PendingQueue - FIFO of events accepted before the worker is ready

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::event::Envelope;
use crate::gate::ReadinessGate;

/// Internal state protected by mutex
#[derive(Debug, Default)]
struct QueueInner {
    entries: VecDeque<Envelope>,
    peak_depth: usize,
    total_enqueued: u64,
}

/// Thread-safe FIFO of envelopes waiting for the worker
///
/// Entries leave strictly in insertion order and at most once. A drain moves
/// the current contents out under the lock and dispatches them after
/// releasing it; anything enqueued meanwhile waits for the next drain.
#[derive(Debug, Default)]
pub struct PendingQueue {
    inner: Mutex<QueueInner>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are plain data, so a panic while holding the lock cannot leave
    // them half-updated.
    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append to the tail; returns the new depth
    pub fn enqueue(&self, envelope: Envelope) -> usize {
        let mut inner = self.lock();
        push(&mut inner, envelope)
    }

    /// Append only while `gate` is still closed
    ///
    /// The gate is checked and `make` is called under the queue lock, so
    /// sequence numbers handed out by `make` follow queue order. If the gate is
    /// already open the envelope is handed back for direct dispatch.
    pub fn enqueue_while_closed<F>(&self, gate: &ReadinessGate, make: F) -> Result<usize, Envelope>
    where
        F: FnOnce() -> Envelope,
    {
        let mut inner = self.lock();
        let envelope = make();
        if gate.is_ready() {
            debug!(seq = envelope.seq, "PendingQueue::enqueue_while_closed: gate open, handing back");
            return Err(envelope);
        }
        Ok(push(&mut inner, envelope))
    }

    /// Move every queued envelope out, oldest first
    pub fn take_all(&self) -> Vec<Envelope> {
        let mut inner = self.lock();
        let taken: Vec<Envelope> = inner.entries.drain(..).collect();
        debug!(count = taken.len(), "PendingQueue::take_all: called");
        taken
    }

    /// Hand the remaining envelopes to `finish`, then open `gate`, all under
    /// the queue lock
    ///
    /// Producers blocked in [`enqueue_while_closed`](Self::enqueue_while_closed)
    /// resume only after `finish` returns and the gate is open, so they see it
    /// open and dispatch directly, after everything `finish` dispatched.
    /// `finish` must not enqueue on this queue. Returns what `finish` returns.
    pub fn take_rest_and_open<F>(&self, gate: &ReadinessGate, finish: F) -> usize
    where
        F: FnOnce(Vec<Envelope>) -> usize,
    {
        let mut inner = self.lock();
        let rest: Vec<Envelope> = inner.entries.drain(..).collect();
        debug!(count = rest.len(), "PendingQueue::take_rest_and_open: final batch");
        let count = finish(rest);
        gate.mark_ready();
        count
    }

    /// Take the current contents and pass each to `dispatch` in FIFO order
    ///
    /// Returns the number of envelopes drained.
    pub fn drain_into<F>(&self, mut dispatch: F) -> usize
    where
        F: FnMut(Envelope),
    {
        let batch = self.take_all();
        let count = batch.len();
        for envelope in batch {
            dispatch(envelope);
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Largest depth ever observed
    pub fn peak_depth(&self) -> usize {
        self.lock().peak_depth
    }

    pub fn total_enqueued(&self) -> u64 {
        self.lock().total_enqueued
    }
}

fn push(inner: &mut QueueInner, envelope: Envelope) -> usize {
    debug!(seq = envelope.seq, "PendingQueue::enqueue: appending");
    inner.entries.push_back(envelope);
    inner.total_enqueued += 1;
    inner.peak_depth = inner.peak_depth.max(inner.entries.len());
    inner.entries.len()
}
