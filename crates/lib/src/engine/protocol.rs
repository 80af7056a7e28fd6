//! Message types for talking to a remote engine.
//!
//! These are transport-agnostic; the HTTP engine client sends them as JSON to
//! a single endpoint. Command names follow the debugger's own command ids.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::TestCaseResult;
use crate::tree::LabelEntry;

/// Commands sent to a remote engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum EngineRequest {
    /// Bring the engine up.
    Activate,
    /// Enumerate the unit test labels of a project.
    GetAllUnitTests { root: PathBuf },
    /// Reset run bookkeeping.
    InitUnitTests { root: PathBuf },
    /// Register a test case for the next batch; answered with a ticket.
    ExecUnitTestCase { label: String },
    /// Long-poll the result of a registered test case.
    AwaitUnitTestCase { ticket: u64 },
    /// Run all registered test cases.
    RunPartialUnitTests { root: PathBuf },
    /// Run all registered test cases under the debugger.
    DebugPartialUnitTests { root: PathBuf },
    /// Abort the running batch.
    CancelUnitTests,
}

impl EngineRequest {
    /// Short command name, used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            EngineRequest::Activate => "activate",
            EngineRequest::GetAllUnitTests { .. } => "getAllUnitTests",
            EngineRequest::InitUnitTests { .. } => "initUnitTests",
            EngineRequest::ExecUnitTestCase { .. } => "execUnitTestCase",
            EngineRequest::AwaitUnitTestCase { .. } => "awaitUnitTestCase",
            EngineRequest::RunPartialUnitTests { .. } => "runPartialUnitTests",
            EngineRequest::DebugPartialUnitTests { .. } => "debugPartialUnitTests",
            EngineRequest::CancelUnitTests => "cancelUnitTests",
        }
    }
}

/// Responses returned from a remote engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum EngineResponse {
    /// Command accepted.
    Ack,
    /// Unit test labels, in engine order.
    UnitTests(Vec<LabelEntry>),
    /// Ticket of an accepted test case.
    Ticket(u64),
    /// Result code of a test case.
    Result(TestCaseResult),
    /// The engine rejected the command.
    Error(String),
}
