//! Test adapter: the per-project entry point of the library.
//!
//! A [`TestAdapter`] owns the suite tree of one project root. It loads the tree
//! from the engine, expands run requests against it, and hands the resulting
//! runs to the [`Orchestrator`] it shares with every other adapter. Everything
//! the UI needs to know is reported through the adapter's event stream.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::{
    Result,
    config::AdapterConfig,
    engine::EngineRegistry,
    events::{AdapterEvent, EventSink, LoadOutcome},
    run::{Orchestrator, RunId, RunRequest, TestRun},
    tree::{TreeBuilder, TreeNode, resolve},
};

/// A run request handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRun {
    pub id: RunId,
    /// Requested ids that matched nothing in the loaded tree, in request order.
    pub unknown: Vec<String>,
}

impl SubmittedRun {
    /// Check if every requested id was found.
    pub fn is_complete(&self) -> bool {
        self.unknown.is_empty()
    }
}

/// Adapter for the unit tests of one project root.
pub struct TestAdapter {
    root: PathBuf,
    config: AdapterConfig,
    registry: Arc<EngineRegistry>,
    orchestrator: Arc<Orchestrator>,
    snapshot: RwLock<Option<Arc<TreeNode>>>,
    events: EventSink,
}

impl TestAdapter {
    /// Create an adapter and the receiver its events are delivered to.
    pub fn new(
        root: impl Into<PathBuf>,
        config: AdapterConfig,
        registry: Arc<EngineRegistry>,
        orchestrator: Arc<Orchestrator>,
    ) -> (Self, UnboundedReceiver<AdapterEvent>) {
        let (events, rx) = EventSink::channel();
        let root = root.into();
        info!(root = %root.display(), engine = %config.engine_id, "Initializing Z80 unit test adapter");
        let adapter = Self {
            root,
            config,
            registry,
            orchestrator,
            snapshot: RwLock::new(None),
            events,
        };
        (adapter, rx)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// The tree of the last successful load, if any.
    pub fn current_tree(&self) -> Option<Arc<TreeNode>> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace_tree(&self, tree: Option<Arc<TreeNode>>) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = tree;
    }

    /// Load the unit tests of the project.
    ///
    /// Emits `LoadStarted`, then `LoadFinished` with the tree, an empty result,
    /// or the error. A failed load clears the previous tree before reporting.
    /// Returns `Ok(None)` if the engine knows no tests.
    pub async fn load(&self) -> Result<Option<Arc<TreeNode>>> {
        info!(root = %self.root.display(), "Loading unit tests");
        self.events.emit(AdapterEvent::LoadStarted);

        let outcome = match self.fetch_tree().await {
            Ok(Some(tree)) => {
                let tree = Arc::new(tree);
                info!(tests = tree.test_count(), "Unit tests found");
                self.replace_tree(Some(Arc::clone(&tree)));
                self.events
                    .emit(AdapterEvent::LoadFinished(LoadOutcome::Loaded(Arc::clone(
                        &tree,
                    ))));
                Ok(Some(tree))
            }
            Ok(None) => {
                info!("No unit tests found");
                self.replace_tree(None);
                self.events
                    .emit(AdapterEvent::LoadFinished(LoadOutcome::Empty));
                Ok(None)
            }
            Err(e) => {
                warn!("Loading unit tests failed: {e}");
                self.replace_tree(None);
                self.events
                    .emit(AdapterEvent::LoadFinished(LoadOutcome::Failed(e.to_string())));
                Err(e)
            }
        };

        info!("Loading finished");
        outcome
    }

    async fn fetch_tree(&self) -> Result<Option<TreeNode>> {
        let engine = self.registry.require_active(&self.config.engine_id).await?;
        let entries = engine.enumerate_tests(&self.root).await?;
        Ok(TreeBuilder::new()
            .root_label(self.config.root_label.clone())
            .build(&entries))
    }

    /// Run the given suite or test ids.
    ///
    /// Unknown ids are skipped and reported back in [`SubmittedRun::unknown`].
    /// Returns once the run has been served, or right away if it had to be
    /// queued behind another run.
    pub async fn run<S: AsRef<str>>(&self, ids: &[S]) -> Result<SubmittedRun> {
        self.start(ids, false).await
    }

    /// Like [`TestAdapter::run`], but under the debugger.
    pub async fn debug<S: AsRef<str>>(&self, ids: &[S]) -> Result<SubmittedRun> {
        self.start(ids, true).await
    }

    async fn start<S: AsRef<str>>(&self, ids: &[S], debug: bool) -> Result<SubmittedRun> {
        let engine = self.registry.require(&self.config.engine_id)?;
        let resolution = resolve(self.current_tree().as_deref(), ids);
        if resolution.has_unknown() {
            warn!(unknown = ?resolution.unknown, "Some requested tests were not found");
        }

        let request = RunRequest::new(
            self.root.clone(),
            ids.iter().map(|id| id.as_ref().to_string()).collect(),
            debug,
        );
        let run = TestRun {
            request,
            tests: resolution.tests,
            engine,
            events: self.events.clone(),
        };
        let id = self.orchestrator.run_or_enqueue(run).await;
        Ok(SubmittedRun {
            id,
            unknown: resolution.unknown,
        })
    }

    /// Cancel every active and queued run, of this and every other adapter
    /// sharing the orchestrator.
    pub async fn cancel(&self) -> Result<bool> {
        self.orchestrator.cancel_all().await
    }

    /// Cancel outstanding runs and drop the loaded tree.
    pub async fn dispose(&self) {
        if let Err(e) = self.cancel().await {
            warn!("Failed to cancel runs while disposing adapter: {e}");
        }
        self.replace_tree(None);
    }
}
