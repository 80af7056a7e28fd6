use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc::UnboundedReceiver;
use z80unit::{
    AdapterConfig, AdapterEvent, Engine, EngineRegistry, LabelEntry, Orchestrator, ScriptedEngine,
    TestAdapter, TestState, events::LoadOutcome,
};

/// Labels of a small project with two suites.
pub const UT_LABELS: &[&str] = &[
    "ut_string.UTT_byte_to_string",
    "ut_string.UTT_word_to_string",
    "ut_math.UTT_add",
];

pub fn entries(labels: &[&str]) -> Vec<LabelEntry> {
    labels.iter().map(|label| LabelEntry::new(*label)).collect()
}

/// Registry holding `engine` under the default engine id.
pub fn registry_with(engine: &Arc<ScriptedEngine>) -> Arc<EngineRegistry> {
    let engine: Arc<dyn Engine> = engine.clone();
    Arc::new(EngineRegistry::with_engine(
        AdapterConfig::default().engine_id,
        engine,
    ))
}

pub fn adapter_at(
    root: &str,
    registry: &Arc<EngineRegistry>,
    orchestrator: &Arc<Orchestrator>,
) -> (TestAdapter, UnboundedReceiver<AdapterEvent>) {
    TestAdapter::new(
        root,
        AdapterConfig::default(),
        Arc::clone(registry),
        Arc::clone(orchestrator),
    )
}

/// An adapter for `/project` that has loaded the engine's tests, with the
/// load events already consumed.
pub async fn loaded_adapter(
    engine: &Arc<ScriptedEngine>,
) -> (Arc<TestAdapter>, UnboundedReceiver<AdapterEvent>) {
    let orchestrator = Arc::new(Orchestrator::new());
    let (adapter, mut rx) = adapter_at("/project", &registry_with(engine), &orchestrator);
    adapter.load().await.unwrap();
    drain(&mut rx);
    (Arc::new(adapter), rx)
}

/// Events already delivered, without waiting.
pub fn drain(rx: &mut UnboundedReceiver<AdapterEvent>) -> Vec<AdapterEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Receive events up to and including `expected`.
pub async fn wait_for(
    rx: &mut UnboundedReceiver<AdapterEvent>,
    expected: &AdapterEvent,
) -> Vec<AdapterEvent> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for adapter event")
            .expect("event stream closed");
        let done = event == *expected;
        events.push(event);
        if done {
            return events;
        }
    }
}

pub fn running(test: &str) -> AdapterEvent {
    AdapterEvent::test_state(test, TestState::Running, None)
}

pub fn passed(test: &str) -> AdapterEvent {
    AdapterEvent::test_state(test, TestState::Passed, None)
}

pub fn failed(test: &str, message: Option<&str>) -> AdapterEvent {
    AdapterEvent::test_state(test, TestState::Failed, message.map(str::to_string))
}

pub fn run_started(tests: &[&str]) -> AdapterEvent {
    AdapterEvent::RunStarted {
        tests: tests.iter().map(|t| t.to_string()).collect(),
    }
}

/// Unwrap the outcome of a `LoadFinished` event.
pub fn load_outcome(event: &AdapterEvent) -> &LoadOutcome {
    match event {
        AdapterEvent::LoadFinished(outcome) => outcome,
        other => panic!("expected LoadFinished, got {other:?}"),
    }
}
