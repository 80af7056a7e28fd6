//! Engine registry and HTTP engine client tests.
//!
//! The HTTP tests run the client against a small axum stand-in for the
//! debugger's `/api/v0` endpoint.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{Json, Router, extract::State, routing::post};
use z80unit::{
    AdapterConfig, AdapterEvent, Engine, EngineRegistry, LabelEntry, Orchestrator, TestAdapter,
    TestCaseResult,
    engine::{
        http::HttpEngine,
        protocol::{EngineRequest, EngineResponse},
    },
};

use crate::helpers::{drain, failed, passed};

/// In-process stand-in for a remote engine.
#[derive(Default)]
struct StubEngine {
    labels: Vec<LabelEntry>,
    requests: Mutex<Vec<EngineRequest>>,
    tickets: Mutex<HashMap<u64, String>>,
}

impl StubEngine {
    fn with_labels(labels: Vec<LabelEntry>) -> Self {
        Self {
            labels,
            ..Default::default()
        }
    }

    fn commands(&self) -> Vec<&'static str> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(EngineRequest::name)
            .collect()
    }

    fn answer(&self, request: EngineRequest) -> EngineResponse {
        self.requests.lock().unwrap().push(request.clone());
        match request {
            EngineRequest::GetAllUnitTests { .. } => EngineResponse::UnitTests(self.labels.clone()),
            EngineRequest::ExecUnitTestCase { label } => {
                if !self.labels.iter().any(|entry| entry.label == label) {
                    return EngineResponse::Error(format!("unknown label '{label}'"));
                }
                let mut tickets = self.tickets.lock().unwrap();
                let ticket = tickets.len() as u64 + 1;
                tickets.insert(ticket, label);
                EngineResponse::Ticket(ticket)
            }
            EngineRequest::AwaitUnitTestCase { ticket } => {
                let tickets = self.tickets.lock().unwrap();
                match tickets.get(&ticket) {
                    Some(label) if label.contains("fail") => {
                        EngineResponse::Result(TestCaseResult::Failed)
                    }
                    Some(_) => EngineResponse::Result(TestCaseResult::Ok),
                    None => EngineResponse::Error(format!("unknown ticket {ticket}")),
                }
            }
            _ => EngineResponse::Ack,
        }
    }
}

async fn handle_request(
    State(stub): State<Arc<StubEngine>>,
    Json(request): Json<EngineRequest>,
) -> Json<EngineResponse> {
    Json(stub.answer(request))
}

/// Serve `stub` on an ephemeral port and return its base URL.
async fn serve(stub: Arc<StubEngine>) -> String {
    let router = Router::new()
        .route("/api/v0", post(handle_request))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn project_labels() -> Vec<LabelEntry> {
    vec![
        LabelEntry::with_location("ut_math.UTT_add", "src/ut_math.asm", 12),
        LabelEntry::with_location("ut_math.UTT_sub_fail", "src/ut_math.asm", 30),
    ]
}

#[tokio::test]
async fn test_http_activate() {
    let stub = Arc::new(StubEngine::default());
    let engine = HttpEngine::new(serve(Arc::clone(&stub)).await);

    assert!(!engine.is_active());
    engine.activate().await.unwrap();

    assert!(engine.is_active());
    assert_eq!(stub.commands(), vec!["activate"]);
}

#[tokio::test]
async fn test_http_enumerate_keeps_locations() {
    let stub = Arc::new(StubEngine::with_labels(project_labels()));
    let engine = HttpEngine::new(serve(Arc::clone(&stub)).await);

    let entries = engine.enumerate_tests(&PathBuf::from("/project")).await.unwrap();

    assert_eq!(entries, project_labels());
    assert_eq!(
        stub.requests.lock().unwrap()[0],
        EngineRequest::GetAllUnitTests {
            root: PathBuf::from("/project")
        }
    );
}

#[tokio::test]
async fn test_http_test_case_result() {
    let stub = Arc::new(StubEngine::with_labels(project_labels()));
    let engine = HttpEngine::new(serve(Arc::clone(&stub)).await);

    let passing = engine.execute_test_case("ut_math.UTT_add").await.unwrap();
    let failing = engine
        .execute_test_case("ut_math.UTT_sub_fail")
        .await
        .unwrap();
    engine
        .run_batch(&PathBuf::from("/project"), false)
        .await
        .unwrap();

    assert_eq!(passing.label(), "ut_math.UTT_add");
    assert_eq!(passing.result().await.unwrap(), TestCaseResult::Ok);
    assert_eq!(failing.result().await.unwrap(), TestCaseResult::Failed);
    assert!(stub.commands().contains(&"runPartialUnitTests"));
}

#[tokio::test]
async fn test_http_engine_error_is_command_failure() {
    let stub = Arc::new(StubEngine::with_labels(project_labels()));
    let engine = HttpEngine::new(serve(stub).await);

    let err = engine.execute_test_case("ut_io.UTT_missing").await.unwrap_err();

    assert!(err.is_engine_error());
    assert!(!err.is_network_error());
    assert!(err.to_string().contains("unknown label 'ut_io.UTT_missing'"));
}

#[tokio::test]
async fn test_http_unreachable_engine() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let engine = HttpEngine::new(format!("http://{addr}"));

    let err = engine.activate().await.unwrap_err();

    assert!(err.is_network_error());
    assert!(!engine.is_active());
}

#[tokio::test]
async fn test_http_engine_end_to_end() {
    let stub = Arc::new(StubEngine::with_labels(project_labels()));
    let url = serve(Arc::clone(&stub)).await;
    let config = AdapterConfig::default().with_engine_url(url.clone());
    let engine: Arc<dyn Engine> = Arc::new(HttpEngine::new(url));
    let registry = Arc::new(EngineRegistry::with_engine(config.engine_id.clone(), engine));
    let (adapter, mut rx) = TestAdapter::new(
        "/project",
        config,
        registry,
        Arc::new(Orchestrator::new()),
    );

    let tree = adapter.load().await.unwrap().unwrap();
    let add = tree.children()[0].children()[0].as_test().unwrap();
    assert_eq!(add.location.as_ref().unwrap().line, 12);

    adapter.debug(&["ut_math"]).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.contains(&passed("ut_math.UTT_add")));
    assert!(events.contains(&failed("ut_math.UTT_sub_fail", None)));
    assert_eq!(events.last(), Some(&AdapterEvent::RunFinished));
    // Result polls run in the background and interleave with the other commands.
    let (polls, commands): (Vec<_>, Vec<_>) = stub
        .commands()
        .into_iter()
        .partition(|command| *command == "awaitUnitTestCase");
    assert_eq!(polls.len(), 2);
    assert_eq!(
        commands,
        vec![
            "activate",
            "getAllUnitTests",
            "initUnitTests",
            "execUnitTestCase",
            "execUnitTestCase",
            "debugPartialUnitTests",
        ]
    );
}

#[test]
fn test_registry_lookup() {
    let registry = EngineRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.require("maziac.z80-debug").err().unwrap().is_engine_unavailable());

    let engine: Arc<dyn Engine> = Arc::new(HttpEngine::new("http://127.0.0.1:1"));
    registry.register("maziac.z80-debug", engine);

    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.require("maziac.z80-debug").unwrap().engine_type(),
        "http"
    );
    assert!(registry.unregister("maziac.z80-debug").is_some());
    assert!(registry.get("maziac.z80-debug").is_none());
}
