//! Error types for the engine module.

use thiserror::Error;

/// Errors that can occur while talking to a test engine.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EngineError {
    /// No engine is registered under the configured id.
    #[error("'{engine_id}' extension not found. Please install!")]
    Unavailable { engine_id: String },

    /// The engine exists but could not be brought up.
    #[error("'{engine_id}' activation failed: {reason}")]
    ActivationFailed { engine_id: String, reason: String },

    /// An engine command was rejected or failed.
    #[error("Engine command '{command}' failed: {reason}")]
    CommandFailed {
        command: &'static str,
        reason: String,
    },

    /// The engine could not be reached.
    #[error("Failed to connect to engine at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    /// Unexpected response type received from the engine.
    #[error("Unexpected engine response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: String,
    },

    /// The engine dropped a pending test case without reporting a result.
    #[error("Engine dropped test case '{label}' without a result")]
    Disconnected { label: String },
}

impl EngineError {
    /// Check if the engine is missing entirely.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::Unavailable { .. })
    }

    /// Check if this is an activation failure.
    pub fn is_activation_error(&self) -> bool {
        matches!(self, EngineError::ActivationFailed { .. })
    }

    /// Check if this is a network/connection error.
    pub fn is_network_error(&self) -> bool {
        matches!(self, EngineError::ConnectionFailed { .. })
    }

    /// Check if this is a protocol error (unexpected response).
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, EngineError::UnexpectedResponse { .. })
    }

    /// Check if this error prevents loading tests (as opposed to a single command failing).
    pub fn is_load_failure(&self) -> bool {
        self.is_unavailable() || self.is_activation_error()
    }
}

impl From<EngineError> for crate::Error {
    fn from(err: EngineError) -> Self {
        crate::Error::Engine(err)
    }
}
