//! Events reported to the test-explorer UI.
//!
//! Each adapter reports through its own [`EventSink`]. The sink never blocks
//! and never fails: if the UI side has gone away, events are dropped.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use crate::tree::TreeNode;

/// State of a single test as shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    Running,
    Passed,
    Failed,
    Errored,
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestState::Running => "running",
            TestState::Passed => "passed",
            TestState::Failed => "failed",
            TestState::Errored => "errored",
        };
        write!(f, "{name}")
    }
}

/// How a load ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Tests were found.
    Loaded(Arc<TreeNode>),
    /// The engine reported no tests. Not an error.
    Empty,
    /// The load failed; the message is meant for the user.
    Failed(String),
}

/// Lifecycle and state events of an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    LoadStarted,
    LoadFinished(LoadOutcome),
    RunStarted {
        tests: Vec<String>,
    },
    TestState {
        test: String,
        state: TestState,
        message: Option<String>,
    },
    RunFinished,
}

impl AdapterEvent {
    pub fn test_state(test: impl Into<String>, state: TestState, message: Option<String>) -> Self {
        AdapterEvent::TestState {
            test: test.into(),
            state,
            message,
        }
    }

    /// Check if this is a per-run event (as opposed to a load event).
    pub fn is_run_event(&self) -> bool {
        matches!(
            self,
            AdapterEvent::RunStarted { .. }
                | AdapterEvent::TestState { .. }
                | AdapterEvent::RunFinished
        )
    }
}

/// Sending half of an adapter's event stream.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<AdapterEvent>,
}

impl EventSink {
    /// Create a sink and the receiver the UI reads events from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AdapterEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an event. Dropped silently if the receiver is gone.
    pub fn emit(&self, event: AdapterEvent) {
        trace!(?event, "Emitting adapter event");
        let _ = self.tx.send(event);
    }

    /// Check if the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
