//! CLI argument definitions for the z80unit binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

/// Z80 unit test runner
#[derive(Parser, Debug)]
#[command(name = "z80unit")]
#[command(about = "z80unit: list and run Z80 unit tests through a debugger engine")]
#[command(version)]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the unit tests of a project
    List(ListArgs),
    /// Run unit tests of a project
    Run(RunArgs),
}

/// Where to find the project and its engine
#[derive(clap::Args, Debug)]
pub struct ProjectArgs {
    /// Project root directory
    #[arg(long, default_value = ".", env = "Z80UNIT_ROOT")]
    pub root: PathBuf,

    /// Base URL of the engine's HTTP endpoint.
    /// Overrides `engineUrl` from the project's .z80unit.json
    #[arg(long, env = "Z80UNIT_ENGINE_URL")]
    pub engine_url: Option<Url>,
}

/// Arguments for the list command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Arguments for the run command
#[derive(clap::Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Suite or test ids to run (default: all tests)
    pub ids: Vec<String>,

    /// Run the tests under the debugger
    #[arg(long)]
    pub debug: bool,
}
