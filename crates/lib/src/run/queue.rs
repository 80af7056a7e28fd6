//! FIFO queue of test runs waiting for the engine.
//!
//! The run at the head of the queue is the active one; it is only popped once
//! it has finished, so a non-empty queue always means "something is running or
//! about to run".

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::sync::watch;
use tracing::trace;

use super::TestRun;
use crate::events::{AdapterEvent, EventSink};

/// Identifier of a queued test run, unique per orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(pub(crate) u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// A test run together with its cancellation flag.
pub(crate) struct QueuedRun {
    pub(crate) id: RunId,
    pub(crate) run: TestRun,
    cancel: watch::Sender<bool>,
}

impl QueuedRun {
    pub(crate) fn new(id: RunId, run: TestRun) -> Self {
        let (cancel, _) = watch::channel(false);
        Self { id, run, cancel }
    }

    pub(crate) fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Completes once the run has been cancelled.
    pub(crate) async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Emit an event for this run unless it has been cancelled.
    pub(crate) fn emit(&self, event: AdapterEvent) {
        if self.is_cancelled() {
            trace!(run = %self.id, ?event, "Suppressing event of cancelled run");
            return;
        }
        self.events().emit(event);
    }

    fn events(&self) -> &EventSink {
        &self.run.events
    }
}

/// Thread-safe FIFO of queued runs.
#[derive(Default)]
pub(crate) struct RunQueue {
    runs: Mutex<VecDeque<Arc<QueuedRun>>>,
}

impl RunQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn runs(&self) -> MutexGuard<'_, VecDeque<Arc<QueuedRun>>> {
        self.runs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a run. Returns true if the queue was empty before, i.e. the
    /// caller is responsible for draining it.
    pub(crate) fn push(&self, run: Arc<QueuedRun>) -> bool {
        let mut runs = self.runs();
        let was_empty = runs.is_empty();
        runs.push_back(run);
        was_empty
    }

    /// The run at the head of the queue.
    pub(crate) fn front(&self) -> Option<Arc<QueuedRun>> {
        self.runs().front().cloned()
    }

    /// Pop the head if it is the run `id`. Returns false if the queue was
    /// cleared (or re-filled) in the meantime.
    pub(crate) fn pop_if(&self, id: RunId) -> bool {
        let mut runs = self.runs();
        match runs.front() {
            Some(head) if head.id == id => {
                runs.pop_front();
                true
            }
            _ => false,
        }
    }

    /// Take every queued run, leaving the queue empty.
    pub(crate) fn clear(&self) -> Vec<Arc<QueuedRun>> {
        self.runs().drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.runs().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.runs().is_empty()
    }
}
