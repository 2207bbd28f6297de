//! git-download — mirror repositories from archive snapshots, no clone needed.
//!
//! # Usage
//!
//! ```text
//! git-download init --url <url> [--ref main] [--ref-type branch|tag] [--destination <dir>] [--name <name>]
//! git-download sync [--name <name>]
//! git-download status [--json]
//! git-download remove --name <name> [--delete-local]
//! ```
//!
//! Every command reads `--registry` (default `.syncmeta.json`, env
//! `GIT_DOWNLOAD_REGISTRY`).

mod commands;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, remove::RemoveArgs, status::StatusArgs, sync::SyncArgs};
use gitdl_core::{RefKind, DEFAULT_REGISTRY_FILE};
use gitdl_sync::SyncConfig;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "git-download",
    version,
    about = "Download and sync Git repositories from ZIP archives instead of git clone",
    long_about = None,
)]
struct Cli {
    /// Path of the registry document tracking all repositories.
    #[arg(
        long,
        global = true,
        env = "GIT_DOWNLOAD_REGISTRY",
        default_value = DEFAULT_REGISTRY_FILE,
        value_name = "PATH"
    )]
    registry: PathBuf,

    /// Log progress to stderr (overridden by RUST_LOG).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start tracking a repository.
    Init(InitArgs),

    /// Download and extract one or all tracked repositories.
    Sync(SyncArgs),

    /// Show the sync status of all tracked repositories.
    Status(StatusArgs),

    /// Stop tracking a repository, optionally deleting its files.
    Remove(RemoveArgs),
}

// ---------------------------------------------------------------------------
// Shared RefKind argument — parsed from CLI strings, converts to core type
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `RefKind` from CLI args.
#[derive(Debug, Clone, Default)]
pub struct RefKindArg(pub RefKind);

impl FromStr for RefKindArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<RefKind>().map(Self).map_err(|e| e.to_string())
    }
}

impl fmt::Display for RefKindArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<RefKindArg> for RefKind {
    fn from(k: RefKindArg) -> Self {
        k.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = SyncConfig::new(cli.registry);
    match cli.command {
        Commands::Init(args) => args.run(&config),
        Commands::Sync(args) => args.run(&config),
        Commands::Status(args) => args.run(&config),
        Commands::Remove(args) => args.run(&config),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
