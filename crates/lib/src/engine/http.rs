//! HTTP engine client.
//!
//! Talks to a remote engine through a single JSON endpoint (`/api/v0`) using
//! reqwest. Test case results are long-polled: `execUnitTestCase` answers with
//! a ticket right away, and a background task waits on `awaitUnitTestCase`
//! for the result code.

use std::{
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use tracing::{debug, trace};

use super::{
    Engine, EngineError, PendingTestCase, TestCaseResolver,
    protocol::{EngineRequest, EngineResponse},
};
use crate::{Result, tree::LabelEntry};

/// HTTP implementation of [`Engine`].
#[derive(Debug)]
pub struct HttpEngine {
    base_url: String,
    client: reqwest::Client,
    active: AtomicBool,
}

impl HttpEngine {
    /// Create a client for the engine at `base_url` (e.g. `http://127.0.0.1:7000`).
    ///
    /// The engine starts inactive; the first load activates it.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            active: AtomicBool::new(false),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/api/v0", self.base_url)
    }

    /// Send a request and return the engine's response.
    ///
    /// `EngineResponse::Error` is turned into [`EngineError::CommandFailed`].
    pub async fn send_request(&self, request: &EngineRequest) -> Result<EngineResponse> {
        send(&self.client, &self.endpoint(), request).await
    }

    async fn expect_ack(&self, request: EngineRequest) -> Result<()> {
        match self.send_request(&request).await? {
            EngineResponse::Ack => Ok(()),
            other => Err(EngineError::UnexpectedResponse {
                expected: "Ack",
                actual: format!("{other:?}"),
            }
            .into()),
        }
    }
}

async fn send(
    client: &reqwest::Client,
    url: &str,
    request: &EngineRequest,
) -> Result<EngineResponse> {
    trace!(command = request.name(), "Sending engine request");
    let response = client
        .post(url)
        .json(request)
        .send()
        .await
        .map_err(|e| EngineError::ConnectionFailed {
            address: url.to_string(),
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(EngineError::CommandFailed {
            command: request.name(),
            reason: format!("Engine returned error: {}", response.status()),
        }
        .into());
    }

    let engine_response: EngineResponse =
        response
            .json()
            .await
            .map_err(|e| EngineError::UnexpectedResponse {
                expected: "EngineResponse",
                actual: e.to_string(),
            })?;

    match engine_response {
        EngineResponse::Error(reason) => Err(EngineError::CommandFailed {
            command: request.name(),
            reason,
        }
        .into()),
        other => Ok(other),
    }
}

/// Long-poll the result of `ticket` into `resolver`.
///
/// Gives up as soon as the pending test case is dropped, e.g. because its run
/// was cancelled. Returns whether a result was delivered.
async fn await_result(
    client: reqwest::Client,
    url: String,
    ticket: u64,
    mut resolver: TestCaseResolver,
) -> bool {
    let request = EngineRequest::AwaitUnitTestCase { ticket };
    let response = tokio::select! {
        _ = resolver.closed() => {
            trace!(ticket, "Test case abandoned, no longer awaiting its result");
            return false;
        }
        response = send(&client, &url, &request) => response,
    };

    match response {
        Ok(EngineResponse::Result(code)) => resolver.resolve(code),
        Ok(other) => resolver.fail(
            EngineError::UnexpectedResponse {
                expected: "Result",
                actual: format!("{other:?}"),
            }
            .into(),
        ),
        Err(e) => resolver.fail(e),
    }
}

#[async_trait]
impl Engine for HttpEngine {
    fn engine_type(&self) -> &'static str {
        "http"
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn activate(&self) -> Result<()> {
        self.expect_ack(EngineRequest::Activate).await?;
        self.active.store(true, Ordering::SeqCst);
        debug!(url = %self.base_url, "HTTP engine activated");
        Ok(())
    }

    async fn enumerate_tests(&self, root: &Path) -> Result<Vec<LabelEntry>> {
        let request = EngineRequest::GetAllUnitTests {
            root: root.to_path_buf(),
        };
        match self.send_request(&request).await? {
            EngineResponse::UnitTests(entries) => Ok(entries),
            other => Err(EngineError::UnexpectedResponse {
                expected: "UnitTests",
                actual: format!("{other:?}"),
            }
            .into()),
        }
    }

    async fn init_run(&self, root: &Path) -> Result<()> {
        self.expect_ack(EngineRequest::InitUnitTests {
            root: root.to_path_buf(),
        })
        .await
    }

    async fn execute_test_case(&self, label: &str) -> Result<PendingTestCase> {
        let request = EngineRequest::ExecUnitTestCase {
            label: label.to_string(),
        };
        let ticket = match self.send_request(&request).await? {
            EngineResponse::Ticket(ticket) => ticket,
            other => {
                return Err(EngineError::UnexpectedResponse {
                    expected: "Ticket",
                    actual: format!("{other:?}"),
                }
                .into());
            }
        };

        let (resolver, pending) = PendingTestCase::channel(label);
        let client = self.client.clone();
        let url = self.endpoint();
        tokio::spawn(await_result(client, url, ticket, resolver));

        Ok(pending)
    }

    async fn run_batch(&self, root: &Path, debug: bool) -> Result<()> {
        let root = root.to_path_buf();
        let request = if debug {
            EngineRequest::DebugPartialUnitTests { root }
        } else {
            EngineRequest::RunPartialUnitTests { root }
        };
        self.expect_ack(request).await
    }

    async fn cancel_all(&self) -> Result<()> {
        self.expect_ack(EngineRequest::CancelUnitTests).await
    }
}
