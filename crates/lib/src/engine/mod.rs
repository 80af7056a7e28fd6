//! Test engine abstractions.
//!
//! The engine is the external debugger/emulator that actually executes Z80
//! unit tests. It is only reachable through asynchronous commands, which this
//! module models as the [`Engine`] trait so the rest of the crate does not care
//! whether the engine lives in-process, behind HTTP, or in a test double.
//!
//! Executing a test case is split in two steps. [`Engine::execute_test_case`]
//! returns as soon as the engine has accepted the test case, handing back a
//! [`PendingTestCase`] that resolves once the engine reports a result. The
//! results only start flowing after [`Engine::run_batch`] triggers the actual
//! execution on the target.

use std::{fmt, path::Path};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::{Result, tree::LabelEntry};

pub mod errors;
#[cfg(feature = "http")]
pub mod http;
pub mod protocol;
pub mod registry;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

pub use errors::EngineError;
pub use registry::EngineRegistry;

/// Result code the engine reports for one test case.
///
/// Engines report raw integer codes; codes outside the known set are kept as
/// [`TestCaseResult::Unknown`] instead of being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum TestCaseResult {
    Ok,
    Failed,
    Timeout,
    /// Test cases have been cancelled, e.g. manually or because the connection was lost.
    Cancelled,
    Unknown(u32),
}

impl From<u32> for TestCaseResult {
    fn from(code: u32) -> Self {
        match code {
            0 => TestCaseResult::Ok,
            1 => TestCaseResult::Failed,
            2 => TestCaseResult::Timeout,
            3 => TestCaseResult::Cancelled,
            other => TestCaseResult::Unknown(other),
        }
    }
}

impl From<TestCaseResult> for u32 {
    fn from(result: TestCaseResult) -> Self {
        match result {
            TestCaseResult::Ok => 0,
            TestCaseResult::Failed => 1,
            TestCaseResult::Timeout => 2,
            TestCaseResult::Cancelled => 3,
            TestCaseResult::Unknown(code) => code,
        }
    }
}

impl fmt::Display for TestCaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestCaseResult::Ok => write!(f, "OK"),
            TestCaseResult::Failed => write!(f, "FAILED"),
            TestCaseResult::Timeout => write!(f, "TIMEOUT"),
            TestCaseResult::Cancelled => write!(f, "CANCELLED"),
            TestCaseResult::Unknown(code) => write!(f, "UNKNOWN({code})"),
        }
    }
}

/// A test case the engine has accepted but not yet reported on.
#[derive(Debug)]
pub struct PendingTestCase {
    label: String,
    receiver: oneshot::Receiver<Result<TestCaseResult>>,
}

/// Engine-side half of a [`PendingTestCase`].
#[derive(Debug)]
pub struct TestCaseResolver {
    sender: oneshot::Sender<Result<TestCaseResult>>,
}

impl PendingTestCase {
    /// Create a pending test case and the resolver the engine completes it with.
    pub fn channel(label: impl Into<String>) -> (TestCaseResolver, Self) {
        let (sender, receiver) = oneshot::channel();
        (
            TestCaseResolver { sender },
            Self {
                label: label.into(),
                receiver,
            },
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wait for the engine's result.
    ///
    /// If the engine drops the resolver, this returns [`EngineError::Disconnected`].
    pub async fn result(self) -> Result<TestCaseResult> {
        match self.receiver.await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Disconnected { label: self.label }.into()),
        }
    }
}

impl TestCaseResolver {
    /// Report the result. Returns false if nobody is waiting anymore.
    pub fn resolve(self, result: TestCaseResult) -> bool {
        self.sender.send(Ok(result)).is_ok()
    }

    /// Report a failure to produce a result.
    pub fn fail(self, error: crate::Error) -> bool {
        self.sender.send(Err(error)).is_ok()
    }

    /// Check if the pending test case was dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Wait until the pending test case is dropped.
    pub async fn closed(&mut self) {
        self.sender.closed().await
    }
}

/// Command interface of a unit test engine.
///
/// Implementations must be cheap to share (`Arc<dyn Engine>`) and safe to call
/// concurrently; the orchestrator issues `execute_test_case` for every test of a
/// run before awaiting any result.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Get the engine type identifier (e.g. "http", "scripted").
    fn engine_type(&self) -> &'static str;

    /// Whether the engine is ready to accept commands.
    fn is_active(&self) -> bool;

    /// Bring up an inactive engine.
    async fn activate(&self) -> Result<()>;

    /// Enumerate the unit test labels of a project, in engine order.
    async fn enumerate_tests(&self, root: &Path) -> Result<Vec<LabelEntry>>;

    /// Reset the engine's run bookkeeping for a project.
    async fn init_run(&self, root: &Path) -> Result<()>;

    /// Register a test case for the next batch.
    ///
    /// Returns once the engine has accepted the test case; the result arrives
    /// through the returned [`PendingTestCase`].
    async fn execute_test_case(&self, label: &str) -> Result<PendingTestCase>;

    /// Trigger execution of all registered test cases, optionally under the debugger.
    async fn run_batch(&self, root: &Path, debug: bool) -> Result<()>;

    /// Abort any in-flight batch.
    async fn cancel_all(&self) -> Result<()>;
}
