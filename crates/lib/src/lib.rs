//!
//! z80unit: a bridge between a test-explorer UI and a Z80 debugger/unit-test engine.
//! This library provides the components that discover, organize, and run unit tests
//! through an external engine.
//!
//! ## Core Concepts
//!
//! * **Tree (`tree::TreeNode`)**: A suite/test hierarchy built from the flat, dot-qualified
//!   labels the engine reports (`ut_string.UTT_byte_to_string`).
//! * **Lookup (`tree::lookup`)**: Finds nodes by id and expands suites into their leaf tests.
//! * **Engine (`engine::Engine`)**: The external debugger/emulator, reachable only through
//!   asynchronous commands. Engines are registered by id in an `engine::EngineRegistry`.
//! * **Orchestrator (`run::Orchestrator`)**: Serializes run and debug requests through a
//!   FIFO queue, because the engine only supports one run at a time.
//! * **Adapter (`adapter::TestAdapter`)**: One per project root. Loads the tree, forwards
//!   run requests to the shared orchestrator, and reports everything as `events::AdapterEvent`s.

pub mod adapter;
pub mod config;
pub mod constants;
pub mod engine;
pub mod events;
pub mod run;
pub mod tree;

pub use adapter::{SubmittedRun, TestAdapter};
pub use config::AdapterConfig;
pub use engine::{Engine, EngineRegistry, TestCaseResult};
pub use events::{AdapterEvent, EventSink, TestState};
pub use run::{Orchestrator, RunId, RunRequest, TestOutcome};
pub use tree::{LabelEntry, SourceLocation, TestCase, TestSuite, TreeNode};

#[cfg(any(test, feature = "testing"))]
pub use engine::scripted::ScriptedEngine;

/// Result type used throughout the z80unit library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the z80unit library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured engine errors from the engine module
    #[error(transparent)]
    Engine(engine::EngineError),

    /// Structured configuration errors from the config module
    #[error(transparent)]
    Config(config::ConfigError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Engine(_) => "engine",
            Error::Config(_) => "config",
        }
    }

    /// Check if this error means the engine could not be reached at all.
    pub fn is_engine_unavailable(&self) -> bool {
        match self {
            Error::Engine(engine_err) => engine_err.is_unavailable(),
            _ => false,
        }
    }

    /// Check if this error came from engine activation.
    pub fn is_activation_error(&self) -> bool {
        match self {
            Error::Engine(engine_err) => engine_err.is_activation_error(),
            _ => false,
        }
    }

    /// Check if this error is a transport failure talking to the engine.
    pub fn is_network_error(&self) -> bool {
        match self {
            Error::Engine(engine_err) => engine_err.is_network_error(),
            _ => false,
        }
    }

    /// Check if this error is engine-related.
    pub fn is_engine_error(&self) -> bool {
        matches!(self, Error::Engine(_))
    }

    /// Check if this error is configuration-related.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this error is I/O related, e.g. an unreadable config file.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Config(config_err) => config_err.is_io_error(),
            _ => false,
        }
    }
}
