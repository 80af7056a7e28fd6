use std::{path::PathBuf, sync::Arc};

use z80unit::{
    AdapterConfig, AdapterEvent, Engine, EngineRegistry, Orchestrator, ScriptedEngine, TestAdapter,
    engine::scripted::EngineCall, events::LoadOutcome,
};

use crate::helpers::{
    UT_LABELS, adapter_at, drain, entries, load_outcome, loaded_adapter, passed, registry_with,
    run_started,
};

#[tokio::test]
async fn test_load_reports_tree() {
    let engine = Arc::new(ScriptedEngine::new().with_entries(entries(UT_LABELS)));
    let orchestrator = Arc::new(Orchestrator::new());
    let (adapter, mut rx) = adapter_at("/project", &registry_with(&engine), &orchestrator);

    let tree = adapter.load().await.unwrap().unwrap();

    assert_eq!(tree.label(), "z80-unit-tests");
    assert_eq!(tree.test_count(), 3);
    assert_eq!(adapter.current_tree(), Some(Arc::clone(&tree)));
    assert_eq!(
        engine.calls(),
        vec![EngineCall::EnumerateTests(PathBuf::from("/project"))]
    );

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], AdapterEvent::LoadStarted);
    assert_eq!(load_outcome(&events[1]), &LoadOutcome::Loaded(tree));
}

#[tokio::test]
async fn test_load_uses_configured_root_label() {
    let engine = Arc::new(ScriptedEngine::new().with_entries(entries(UT_LABELS)));
    let config = AdapterConfig {
        root_label: "my project".to_string(),
        ..Default::default()
    };
    let (adapter, _rx) = TestAdapter::new(
        "/project",
        config,
        registry_with(&engine),
        Arc::new(Orchestrator::new()),
    );

    let tree = adapter.load().await.unwrap().unwrap();

    assert_eq!(tree.label(), "my project");
    assert_eq!(tree.id(), "");
}

#[tokio::test]
async fn test_load_without_tests_is_empty() {
    let engine = Arc::new(ScriptedEngine::new());
    let orchestrator = Arc::new(Orchestrator::new());
    let (adapter, mut rx) = adapter_at("/project", &registry_with(&engine), &orchestrator);

    assert_eq!(adapter.load().await.unwrap(), None);

    let events = drain(&mut rx);
    assert_eq!(load_outcome(&events[1]), &LoadOutcome::Empty);
    assert!(adapter.current_tree().is_none());
}

#[tokio::test]
async fn test_load_activates_inactive_engine() {
    let engine = Arc::new(
        ScriptedEngine::new()
            .with_entries(entries(UT_LABELS))
            .inactive(),
    );
    let orchestrator = Arc::new(Orchestrator::new());
    let (adapter, _rx) = adapter_at("/project", &registry_with(&engine), &orchestrator);

    adapter.load().await.unwrap();

    assert!(engine.is_active());
    assert_eq!(engine.calls()[0], EngineCall::Activate);
}

#[tokio::test]
async fn test_load_without_engine_fails() {
    let registry = Arc::new(EngineRegistry::new());
    let orchestrator = Arc::new(Orchestrator::new());
    let (adapter, mut rx) = adapter_at("/project", &registry, &orchestrator);

    let err = adapter.load().await.unwrap_err();

    assert!(err.is_engine_unavailable());
    let events = drain(&mut rx);
    assert_eq!(
        load_outcome(&events[1]),
        &LoadOutcome::Failed(
            "'maziac.z80-debug' extension not found. Please install!".to_string()
        )
    );
}

#[tokio::test]
async fn test_load_with_failing_activation() {
    let engine = Arc::new(ScriptedEngine::new().failing_activation("no emulator"));
    let orchestrator = Arc::new(Orchestrator::new());
    let (adapter, mut rx) = adapter_at("/project", &registry_with(&engine), &orchestrator);

    let err = adapter.load().await.unwrap_err();

    assert!(err.is_activation_error());
    assert!(err.to_string().contains("no emulator"));
    assert!(matches!(
        load_outcome(&drain(&mut rx)[1]),
        LoadOutcome::Failed(_)
    ));
}

#[tokio::test]
async fn test_failed_reload_clears_tree() {
    let engine = Arc::new(ScriptedEngine::new().with_entries(entries(UT_LABELS)));
    let registry = registry_with(&engine);
    let orchestrator = Arc::new(Orchestrator::new());
    let (adapter, _rx) = adapter_at("/project", &registry, &orchestrator);
    adapter.load().await.unwrap();
    assert!(adapter.current_tree().is_some());

    let broken: Arc<dyn Engine> = Arc::new(ScriptedEngine::new().failing_enumeration("lost"));
    registry.register(AdapterConfig::default().engine_id, broken);

    assert!(adapter.load().await.is_err());
    assert!(adapter.current_tree().is_none());
}

#[tokio::test]
async fn test_run_expands_suite() {
    let engine = Arc::new(ScriptedEngine::new().with_entries(entries(UT_LABELS)));
    let (adapter, mut rx) = loaded_adapter(&engine).await;

    let submitted = adapter.run(&["ut_string"]).await.unwrap();
    assert!(submitted.is_complete());

    let executed: Vec<_> = engine
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            EngineCall::ExecuteTestCase(label) => Some(label),
            _ => None,
        })
        .collect();
    assert_eq!(
        executed,
        vec!["ut_string.UTT_byte_to_string", "ut_string.UTT_word_to_string"]
    );
    let events = drain(&mut rx);
    assert!(events.contains(&passed("ut_string.UTT_byte_to_string")));
    assert!(events.contains(&passed("ut_string.UTT_word_to_string")));
}

#[tokio::test]
async fn test_debug_runs_batch_under_debugger() {
    let engine = Arc::new(ScriptedEngine::new().with_entries(entries(UT_LABELS)));
    let (adapter, _rx) = loaded_adapter(&engine).await;

    adapter.debug(&["ut_math.UTT_add"]).await.unwrap();

    assert!(engine.calls().contains(&EngineCall::RunBatch {
        root: PathBuf::from("/project"),
        debug: true
    }));
}

#[tokio::test]
async fn test_run_before_load_runs_nothing() {
    let engine = Arc::new(ScriptedEngine::new().with_entries(entries(UT_LABELS)));
    let orchestrator = Arc::new(Orchestrator::new());
    let (adapter, mut rx) = adapter_at("/project", &registry_with(&engine), &orchestrator);

    let submitted = adapter.run(&["ut_string"]).await.unwrap();
    assert_eq!(submitted.unknown, vec!["ut_string"]);

    assert_eq!(
        drain(&mut rx),
        vec![run_started(&[]), AdapterEvent::RunFinished]
    );
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_run_returns_unknown_ids() {
    let engine = Arc::new(ScriptedEngine::new().with_entries(entries(UT_LABELS)));
    let (adapter, mut rx) = loaded_adapter(&engine).await;

    let submitted = adapter
        .run(&["typo_suite", "ut_math.UTT_add", "ut_math.UTT_missing"])
        .await
        .unwrap();

    assert!(!submitted.is_complete());
    assert_eq!(submitted.unknown, vec!["typo_suite", "ut_math.UTT_missing"]);
    let events = drain(&mut rx);
    assert!(events.contains(&passed("ut_math.UTT_add")));
    assert_eq!(events.last(), Some(&AdapterEvent::RunFinished));
}

#[tokio::test]
async fn test_run_without_engine_fails() {
    let orchestrator = Arc::new(Orchestrator::new());
    let (adapter, mut rx) = adapter_at("/project", &Arc::new(EngineRegistry::new()), &orchestrator);

    let err = adapter.run(&[""]).await.unwrap_err();

    assert!(err.is_engine_unavailable());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_dispose_drops_tree() {
    let engine = Arc::new(ScriptedEngine::new().with_entries(entries(UT_LABELS)));
    let (adapter, _rx) = loaded_adapter(&engine).await;

    adapter.dispose().await;

    assert!(adapter.current_tree().is_none());
    assert_eq!(engine.cancel_count(), 0);
}
