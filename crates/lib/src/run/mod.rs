//! Run orchestration.
//!
//! The engine can only execute one batch of test cases at a time, but run and
//! debug requests may arrive at any moment and from several project roots. The
//! [`Orchestrator`] serializes them through a FIFO queue:
//!
//! 1. A request is appended to the queue.
//! 2. If something was already queued, the call returns right away; the run is
//!    served in turn by whoever is draining the queue.
//! 3. Otherwise the caller drains the queue, executing the head, popping it
//!    once done, until the queue is empty. Runs queued meanwhile are served
//!    before the drain ends.
//!
//! Cancellation is global: [`Orchestrator::cancel_all`] drops every queued run
//! and the active one, and tells the engine to abort exactly once.

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{sync::Mutex, task::JoinSet};
use tracing::{Instrument, debug, error, info, info_span, trace, warn};

use crate::{
    Result,
    constants::TIMED_OUT_MESSAGE,
    engine::{Engine, TestCaseResult},
    events::{AdapterEvent, EventSink, TestState},
    tree::TestCase,
};

mod queue;


pub use queue::RunId;
use queue::{QueuedRun, RunQueue};

/// A request to run (or debug) tests of one project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// The project root the request targets.
    pub root: PathBuf,
    /// Requested suite or test ids, in request order.
    pub ids: Vec<String>,
    /// Run under the debugger.
    pub debug: bool,
}

impl RunRequest {
    pub fn new(root: impl Into<PathBuf>, ids: Vec<String>, debug: bool) -> Self {
        Self {
            root: root.into(),
            ids,
            debug,
        }
    }
}

/// A request expanded to its leaf tests, ready to be queued.
pub struct TestRun {
    pub request: RunRequest,
    /// Leaf tests in the order their `Running` state is reported.
    pub tests: Vec<TestCase>,
    pub engine: Arc<dyn Engine>,
    pub events: EventSink,
}

/// Final result of one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed(Option<String>),
    TimedOut(String),
    Cancelled,
}

impl TestOutcome {
    /// Map an engine result to an outcome.
    ///
    /// Unknown result codes and engine errors fail the test case with a
    /// message; they never abort the run.
    pub fn from_result(result: Result<TestCaseResult>) -> Self {
        match result {
            Ok(TestCaseResult::Ok) => TestOutcome::Passed,
            Ok(TestCaseResult::Failed) => TestOutcome::Failed(None),
            Ok(TestCaseResult::Timeout) => TestOutcome::TimedOut(TIMED_OUT_MESSAGE.to_string()),
            Ok(TestCaseResult::Cancelled) => TestOutcome::Cancelled,
            Ok(TestCaseResult::Unknown(code)) => {
                TestOutcome::Failed(Some(format!("Unexpected test case result code {code}")))
            }
            Err(e) => TestOutcome::Failed(Some(e.to_string())),
        }
    }

    /// The UI state for this outcome. Timeouts are shown as failures.
    pub fn state(&self) -> TestState {
        match self {
            TestOutcome::Passed => TestState::Passed,
            TestOutcome::Failed(_) | TestOutcome::TimedOut(_) => TestState::Failed,
            TestOutcome::Cancelled => TestState::Errored,
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            TestOutcome::Failed(message) => message.clone(),
            TestOutcome::TimedOut(message) => Some(message.clone()),
            TestOutcome::Passed | TestOutcome::Cancelled => None,
        }
    }

    fn into_event(self, test: &str) -> AdapterEvent {
        AdapterEvent::test_state(test, self.state(), self.message())
    }
}

/// Serializes test runs against the engine.
///
/// One orchestrator is shared by every adapter of a process; its queue is the
/// only place runs wait for the engine.
pub struct Orchestrator {
    queue: RunQueue,
    /// Held while a run talks to the engine, so a cancelled run has wound down
    /// before the next one starts.
    engine_lock: Mutex<()>,
    next_id: AtomicU64,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            queue: RunQueue::new(),
            engine_lock: Mutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of runs queued, including the active one.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Check if no run is active or waiting.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue a run and, if nothing else was queued, drain the queue.
    ///
    /// Returns immediately when another call is already draining; otherwise
    /// returns once the queue is empty. The drain runs on its own task, so
    /// dropping the returned future does not stall the queue.
    pub async fn run_or_enqueue(self: &Arc<Self>, run: TestRun) -> RunId {
        let id = RunId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let queued = Arc::new(QueuedRun::new(id, run));

        if !self.queue.push(queued) {
            debug!(run = %id, queued = self.queue.len(), "Engine busy, run queued");
            return id;
        }

        let this = Arc::clone(self);
        if let Err(e) = tokio::spawn(async move { this.drain().await }).await {
            error!(run = %id, "Test run queue drain failed: {e}");
        }
        id
    }

    async fn drain(&self) {
        while let Some(run) = self.queue.front() {
            let span = info_span!("test_run", run = %run.id, root = %run.run.request.root.display(), debug = run.run.request.debug);
            self.execute(&run).instrument(span).await;

            if !self.queue.pop_if(run.id) {
                // Cancelled: the queue was cleared, and a later request owns it now
                trace!(run = %run.id, "Queue was cleared, ending drain");
                break;
            }
        }
    }

    async fn execute(&self, queued: &QueuedRun) {
        let _engine = self.engine_lock.lock().await;
        if queued.is_cancelled() {
            debug!("Run was cancelled before it started");
            return;
        }

        let TestRun {
            request,
            tests,
            engine,
            ..
        } = &queued.run;
        info!(tests = tests.len(), "Starting test run");
        queued.emit(AdapterEvent::RunStarted {
            tests: tests.iter().map(|t| t.id.clone()).collect(),
        });

        if tests.is_empty() {
            queued.emit(AdapterEvent::RunFinished);
            return;
        }

        if let Err(e) = engine.init_run(&request.root).await {
            warn!("Failed to reset engine run state: {e}");
        }

        let mut pending = JoinSet::new();
        let mut outstanding = Vec::with_capacity(tests.len());
        for test in tests {
            if queued.is_cancelled() {
                return;
            }
            queued.emit(AdapterEvent::test_state(&test.id, TestState::Running, None));
            match engine.execute_test_case(&test.id).await {
                Ok(test_case) => {
                    let id = test.id.clone();
                    pending.spawn(async move { (id, test_case.result().await) });
                    outstanding.push(test.id.as_str());
                }
                Err(e) => {
                    error!(test = %test.id, "Engine did not accept test case: {e}");
                    queued.emit(TestOutcome::from_result(Err(e)).into_event(&test.id));
                }
            }
        }

        if pending.is_empty() {
            queued.emit(AdapterEvent::RunFinished);
            return;
        }
        if queued.is_cancelled() {
            return;
        }

        // Results may arrive while the batch command is still in flight
        let batch = engine.run_batch(&request.root, request.debug);
        let cancelled = queued.cancelled();
        tokio::pin!(batch, cancelled);
        let mut batch_done = false;
        loop {
            if batch_done && pending.is_empty() {
                break;
            }
            tokio::select! {
                biased;
                _ = &mut cancelled => {
                    debug!(outstanding = pending.len(), "Run cancelled, abandoning test cases");
                    pending.abort_all();
                    return;
                }
                result = &mut batch, if !batch_done => {
                    batch_done = true;
                    if let Err(e) = result {
                        error!(outstanding = outstanding.len(), "Engine failed to run the batch: {e}");
                        pending.abort_all();
                        let message = e.to_string();
                        for test in outstanding {
                            queued.emit(AdapterEvent::test_state(
                                test,
                                TestState::Errored,
                                Some(message.clone()),
                            ));
                        }
                        queued.emit(AdapterEvent::RunFinished);
                        return;
                    }
                    trace!("Batch command completed");
                }
                joined = pending.join_next(), if !pending.is_empty() => match joined {
                    Some(Ok((test, result))) => {
                        outstanding.retain(|t| *t != test.as_str());
                        let outcome = TestOutcome::from_result(result);
                        debug!(test = %test, state = %outcome.state(), "Test case finished");
                        queued.emit(outcome.into_event(&test));
                    }
                    Some(Err(e)) => warn!("Test case task failed: {e}"),
                    None => {}
                },
            }
        }

        info!("Test run finished");
        queued.emit(AdapterEvent::RunFinished);
    }

    /// Cancel the active run and every queued run.
    ///
    /// Issues a single cancel command to the active run's engine. Does nothing
    /// (and returns `Ok(false)`) when the queue is already empty, so repeated
    /// calls only reach the engine once.
    pub async fn cancel_all(&self) -> Result<bool> {
        let cancelled = self.queue.clear();
        let Some(active) = cancelled.first() else {
            trace!("Nothing to cancel");
            return Ok(false);
        };

        info!(runs = cancelled.len(), "Cancelling test runs");
        for run in &cancelled {
            run.cancel();
        }
        active.run.engine.cancel_all().await?;
        Ok(true)
    }
}
