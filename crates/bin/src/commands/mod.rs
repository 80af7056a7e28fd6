//! Subcommand implementations.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use z80unit::{
    AdapterConfig, AdapterEvent, Engine, EngineRegistry, Orchestrator, TestAdapter,
    engine::http::HttpEngine,
};

use crate::cli::ProjectArgs;

pub mod list;
pub mod run;

/// Build an adapter for the project, talking to its engine over HTTP.
///
/// The engine URL comes from the command line if given, else from the
/// project's config file.
pub fn connect(
    args: &ProjectArgs,
) -> Result<(TestAdapter, UnboundedReceiver<AdapterEvent>), Box<dyn std::error::Error>> {
    let mut config = AdapterConfig::discover(&args.root)?;
    if let Some(url) = &args.engine_url {
        config = config.with_engine_url(url.as_str());
    }
    let Some(url) = config.engine_url.clone() else {
        return Err(format!(
            "No engine URL: pass --engine-url or set engineUrl in {}",
            args.root.join(z80unit::constants::CONFIG_FILE).display()
        )
        .into());
    };

    tracing::debug!(url = %url, engine = %config.engine_id, "Connecting to engine");
    let engine: Arc<dyn Engine> = Arc::new(HttpEngine::new(url));
    let registry = Arc::new(EngineRegistry::with_engine(config.engine_id.clone(), engine));
    Ok(TestAdapter::new(
        args.root.clone(),
        config,
        registry,
        Arc::new(Orchestrator::new()),
    ))
}
