//! In-memory engine with scripted behavior, for tests.
//!
//! `ScriptedEngine` records every command it receives and answers from a
//! script: the labels to enumerate and the result of each test case. By
//! default results are reported, in issue order, as soon as the batch is
//! triggered; [`ScriptedEngine::manual`] keeps them pending until the test
//! calls [`ScriptedEngine::resolve`].

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::watch;

use super::{Engine, EngineError, PendingTestCase, TestCaseResolver, TestCaseResult};
use crate::{Result, tree::LabelEntry};

/// A command received by a [`ScriptedEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Activate,
    EnumerateTests(PathBuf),
    InitRun(PathBuf),
    ExecuteTestCase(String),
    RunBatch { root: PathBuf, debug: bool },
    CancelAll,
}

#[derive(Default)]
struct Script {
    labels: Vec<LabelEntry>,
    results: HashMap<String, TestCaseResult>,
    manual: bool,
    activation_failure: Option<String>,
    enumeration_failure: Option<String>,
    batch_failure: Option<String>,
    rejected: HashSet<String>,
}

#[derive(Default)]
struct State {
    calls: Vec<EngineCall>,
    pending: Vec<(String, TestCaseResolver)>,
}

/// Scripted in-memory [`Engine`].
pub struct ScriptedEngine {
    active: AtomicBool,
    script: Script,
    state: Mutex<State>,
    batches: watch::Sender<usize>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEngine {
    /// Create an active engine with no tests whose test cases all pass.
    pub fn new() -> Self {
        let (batches, _) = watch::channel(0);
        Self {
            active: AtomicBool::new(true),
            script: Script::default(),
            state: Mutex::new(State::default()),
            batches,
        }
    }

    /// Labels to report from `enumerate_tests`, without source locations.
    pub fn with_tests(mut self, labels: &[&str]) -> Self {
        self.script.labels = labels.iter().map(|l| LabelEntry::new(*l)).collect();
        self
    }

    /// Label entries to report from `enumerate_tests`.
    pub fn with_entries(mut self, entries: Vec<LabelEntry>) -> Self {
        self.script.labels = entries;
        self
    }

    /// Result to report for a test case (default: [`TestCaseResult::Ok`]).
    pub fn with_result(mut self, label: &str, result: TestCaseResult) -> Self {
        self.script.results.insert(label.to_string(), result);
        self
    }

    /// Keep results pending until [`ScriptedEngine::resolve`] is called.
    pub fn manual(mut self) -> Self {
        self.script.manual = true;
        self
    }

    /// Start inactive; `activate` succeeds.
    pub fn inactive(self) -> Self {
        self.active.store(false, Ordering::SeqCst);
        self
    }

    /// Start inactive; `activate` fails with `reason`.
    pub fn failing_activation(mut self, reason: &str) -> Self {
        self.active.store(false, Ordering::SeqCst);
        self.script.activation_failure = Some(reason.to_string());
        self
    }

    /// `enumerate_tests` fails with `reason`.
    pub fn failing_enumeration(mut self, reason: &str) -> Self {
        self.script.enumeration_failure = Some(reason.to_string());
        self
    }

    /// `run_batch` fails with `reason`.
    pub fn failing_batch(mut self, reason: &str) -> Self {
        self.script.batch_failure = Some(reason.to_string());
        self
    }

    /// `execute_test_case` rejects `label`.
    pub fn rejecting(mut self, label: &str) -> Self {
        self.script.rejected.insert(label.to_string());
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: EngineCall) {
        self.state().calls.push(call);
    }

    /// All commands received so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state().calls.clone()
    }

    /// Number of `cancel_all` commands received.
    pub fn cancel_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| **c == EngineCall::CancelAll)
            .count()
    }

    /// Labels of test cases still waiting for a result.
    pub fn pending_labels(&self) -> Vec<String> {
        self.state().pending.iter().map(|(l, _)| l.clone()).collect()
    }

    /// Report a result for a pending test case. Returns false if the label is not pending.
    pub fn resolve(&self, label: &str, result: TestCaseResult) -> bool {
        let resolver = {
            let mut state = self.state();
            let Some(index) = state.pending.iter().position(|(l, _)| l == label) else {
                return false;
            };
            state.pending.remove(index).1
        };
        resolver.resolve(result);
        true
    }

    /// Wait until at least `count` batches have been triggered.
    pub async fn wait_for_batches(&self, count: usize) {
        let mut rx = self.batches.subscribe();
        let _ = rx.wait_for(|n| *n >= count).await;
    }

    fn result_for(&self, label: &str) -> TestCaseResult {
        self.script
            .results
            .get(label)
            .copied()
            .unwrap_or(TestCaseResult::Ok)
    }

    fn resolve_all_pending(&self) {
        let pending = std::mem::take(&mut self.state().pending);
        for (label, resolver) in pending {
            resolver.resolve(self.result_for(&label));
        }
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    fn engine_type(&self) -> &'static str {
        "scripted"
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn activate(&self) -> Result<()> {
        self.record(EngineCall::Activate);
        if let Some(reason) = &self.script.activation_failure {
            return Err(EngineError::CommandFailed {
                command: "activate",
                reason: reason.clone(),
            }
            .into());
        }
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn enumerate_tests(&self, root: &Path) -> Result<Vec<LabelEntry>> {
        self.record(EngineCall::EnumerateTests(root.to_path_buf()));
        if let Some(reason) = &self.script.enumeration_failure {
            return Err(EngineError::CommandFailed {
                command: "getAllUnitTests",
                reason: reason.clone(),
            }
            .into());
        }
        Ok(self.script.labels.clone())
    }

    async fn init_run(&self, root: &Path) -> Result<()> {
        self.record(EngineCall::InitRun(root.to_path_buf()));
        Ok(())
    }

    async fn execute_test_case(&self, label: &str) -> Result<PendingTestCase> {
        self.record(EngineCall::ExecuteTestCase(label.to_string()));
        if self.script.rejected.contains(label) {
            return Err(EngineError::CommandFailed {
                command: "execUnitTestCase",
                reason: format!("unknown label '{label}'"),
            }
            .into());
        }
        let (resolver, pending) = PendingTestCase::channel(label);
        self.state().pending.push((label.to_string(), resolver));
        Ok(pending)
    }

    async fn run_batch(&self, root: &Path, debug: bool) -> Result<()> {
        self.record(EngineCall::RunBatch {
            root: root.to_path_buf(),
            debug,
        });
        if let Some(reason) = &self.script.batch_failure {
            return Err(EngineError::CommandFailed {
                command: "runPartialUnitTests",
                reason: reason.clone(),
            }
            .into());
        }
        if !self.script.manual {
            self.resolve_all_pending();
        }
        self.batches.send_modify(|n| *n += 1);
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        self.record(EngineCall::CancelAll);
        let pending = std::mem::take(&mut self.state().pending);
        for (_, resolver) in pending {
            resolver.resolve(TestCaseResult::Cancelled);
        }
        Ok(())
    }
}
