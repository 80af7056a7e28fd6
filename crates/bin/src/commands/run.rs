//! Run command - runs unit tests and prints their states as they arrive.

use tokio::sync::mpsc::UnboundedReceiver;
use z80unit::{AdapterEvent, TestState, constants::ROOT_SUITE_ID};

use crate::cli::RunArgs;
use crate::output::{OutputFormat, state_tag};

#[derive(Debug, Default)]
struct Summary {
    passed: usize,
    failed: usize,
    errored: usize,
    /// Requested ids the loaded tests do not contain.
    unknown: Vec<String>,
}

impl Summary {
    fn record(&mut self, state: TestState) {
        match state {
            TestState::Passed => self.passed += 1,
            TestState::Failed => self.failed += 1,
            TestState::Errored => self.errored += 1,
            TestState::Running => {}
        }
    }

    fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0 && self.unknown.is_empty()
    }
}

/// Print run events until the stream closes.
async fn report(mut events: UnboundedReceiver<AdapterEvent>, format: OutputFormat) -> Summary {
    let mut summary = Summary::default();
    while let Some(event) = events.recv().await {
        let AdapterEvent::TestState {
            test,
            state,
            message,
        } = event
        else {
            continue;
        };
        summary.record(state);

        match format {
            OutputFormat::Human => match &message {
                Some(message) => println!("{} {test}: {message}", state_tag(state)),
                None => println!("{} {test}", state_tag(state)),
            },
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "test": test,
                    "state": state,
                    "message": message,
                });
                println!("{value}");
            }
        }
    }
    summary
}

/// Run the run command
pub async fn run(args: &RunArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let (adapter, events) = super::connect(&args.project)?;
    if adapter.load().await?.is_none() {
        println!("No unit tests found in {}", adapter.root().display());
        return Ok(());
    }

    let ids = if args.ids.is_empty() {
        vec![ROOT_SUITE_ID.to_string()]
    } else {
        args.ids.clone()
    };

    let reporter = tokio::spawn(report(events, format));
    let start = async {
        if args.debug {
            adapter.debug(ids.as_slice()).await
        } else {
            adapter.run(ids.as_slice()).await
        }
    };
    let mut unknown = Vec::new();
    tokio::select! {
        result = start => {
            unknown = result?.unknown;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, cancelling test run");
            adapter.cancel().await?;
        }
    }

    // Closing the adapter's event stream ends the reporter.
    drop(adapter);
    let mut summary = reporter.await?;
    summary.unknown = unknown;

    if !summary.unknown.is_empty() {
        eprintln!("Unknown test ids: {}", summary.unknown.join(", "));
    }
    if format == OutputFormat::Human {
        println!();
        println!(
            "{} passed, {} failed, {} errored",
            summary.passed, summary.failed, summary.errored
        );
    }
    if !summary.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
