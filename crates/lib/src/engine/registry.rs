//! Registry of available test engines.
//!
//! Engines are registered under an id (e.g. `maziac.z80-debug`). Adapters look
//! their configured engine up on every load and run, so an engine that is
//! registered later becomes usable without recreating the adapters.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tracing::debug;

use super::{Engine, EngineError};
use crate::Result;

/// Maps engine ids to engine instances.
#[derive(Default)]
pub struct EngineRegistry {
    engines: RwLock<HashMap<String, Arc<dyn Engine>>>,
}

impl EngineRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with a single engine.
    pub fn with_engine(id: impl Into<String>, engine: Arc<dyn Engine>) -> Self {
        let registry = Self::new();
        registry.register(id, engine);
        registry
    }

    /// Register an engine, replacing any engine with the same id.
    pub fn register(&self, id: impl Into<String>, engine: Arc<dyn Engine>) {
        let id = id.into();
        debug!(engine_id = %id, engine_type = engine.engine_type(), "Registered engine");
        self.engines
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, engine);
    }

    /// Remove an engine. Returns the removed engine, if any.
    pub fn unregister(&self, id: &str) -> Option<Arc<dyn Engine>> {
        self.engines
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(id)
    }

    /// Look up an engine by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Engine>> {
        self.engines
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    /// Look up an engine by id, failing with [`EngineError::Unavailable`].
    pub fn require(&self, id: &str) -> Result<Arc<dyn Engine>> {
        self.get(id).ok_or_else(|| {
            EngineError::Unavailable {
                engine_id: id.to_string(),
            }
            .into()
        })
    }

    /// Look up an engine and activate it if needed.
    pub async fn require_active(&self, id: &str) -> Result<Arc<dyn Engine>> {
        let engine = self.require(id)?;
        if !engine.is_active() {
            debug!(engine_id = %id, "Activating engine");
            engine.activate().await.map_err(|e| EngineError::ActivationFailed {
                engine_id: id.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(engine)
    }

    /// Check if any engines are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of registered engines.
    pub fn len(&self) -> usize {
        self.engines
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Get all registered engine ids.
    pub fn ids(&self) -> Vec<String> {
        self.engines
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
