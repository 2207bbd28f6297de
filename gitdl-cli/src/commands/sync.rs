//! `git-download sync [--name <name>]` — download and extract archives.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;

use gitdl_sync::{
    pipeline::{self, SyncScope},
    HttpFetcher, SyncConfig, SyncOutcome,
};

/// Arguments for `git-download sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Name of the repository to sync (omit to sync all).
    #[arg(long, short = 'n')]
    pub name: Option<String>,
}

impl SyncArgs {
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let fetcher = HttpFetcher::new();
        tracing::debug!("registry: {}", config.registry_path().display());

        match self.name {
            Some(name) => {
                println!("Syncing '{name}'...");
                let mut summary = pipeline::run(config, &fetcher, SyncScope::Repo(name.clone()))
                    .with_context(|| format!("sync failed for '{name}'"))?;
                let outcome = summary
                    .outcomes
                    .pop()
                    .ok_or_else(|| anyhow!("sync produced no result for '{name}'"))?;
                match outcome.error {
                    None => {
                        print_outcome(&outcome);
                        Ok(())
                    }
                    Some(err) => Err(anyhow::Error::new(err))
                        .with_context(|| format!("failed to sync '{name}'")),
                }
            }
            None => {
                let summary = pipeline::run(config, &fetcher, SyncScope::All)
                    .context("sync of all repositories failed")?;
                if summary.is_empty() {
                    println!("No repositories are being tracked. Run `git-download init` first.");
                    return Ok(());
                }
                for outcome in &summary.outcomes {
                    print_outcome(outcome);
                }
                println!(
                    "{} synced, {} failed",
                    summary.succeeded(),
                    summary.failed()
                );
                Ok(())
            }
        }
    }
}

fn print_outcome(outcome: &SyncOutcome) {
    match &outcome.error {
        None => {
            let files = outcome.installed.map(|r| r.files).unwrap_or_default();
            println!(
                "{} Successfully synced '{}' ({files} files)",
                "✓".green(),
                outcome.name
            );
        }
        Some(err) => println!(
            "{} Error syncing '{}' ({}): {err}",
            "✗".red(),
            outcome.name,
            outcome.state
        ),
    }
}
