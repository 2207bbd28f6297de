//! `git-download status` — what is tracked and when it was last synced.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use gitdl_core::{registry, RepoEntry};
use gitdl_sync::SyncConfig;

/// Arguments for `git-download status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let reg = registry::load_at(config.registry_path()).with_context(|| {
            format!(
                "failed to load registry '{}'",
                config.registry_path().display()
            )
        })?;

        if self.json {
            return print_json(&reg.repositories);
        }
        print_table(&reg.repositories);
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RepoStatusJson {
    name: String,
    url: String,
    #[serde(rename = "ref")]
    reference: String,
    ref_type: String,
    destination: String,
    last_sync: Option<String>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "url")]
    url: String,
    #[tabled(rename = "ref")]
    reference: String,
    #[tabled(rename = "destination")]
    destination: String,
    #[tabled(rename = "last sync")]
    last_sync: String,
}

fn print_json(entries: &[RepoEntry]) -> Result<()> {
    let payload: Vec<RepoStatusJson> = entries
        .iter()
        .map(|entry| RepoStatusJson {
            name: entry.name.to_string(),
            url: entry.url.clone(),
            reference: entry.reference.clone(),
            ref_type: entry.ref_kind.to_string(),
            destination: entry.destination.display().to_string(),
            last_sync: entry.last_synced_at.map(format_timestamp),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(entries: &[RepoEntry]) {
    if entries.is_empty() {
        println!("No repositories are being tracked. Run `git-download init` first.");
        return;
    }

    let synced = entries.iter().filter(|e| e.last_synced_at.is_some()).count();
    println!(
        "git-download v{} | {} repositories | {} never synced",
        env!("CARGO_PKG_VERSION"),
        entries.len(),
        entries.len() - synced,
    );

    let rows: Vec<StatusTableRow> = entries
        .iter()
        .map(|entry| StatusTableRow {
            name: entry.name.to_string(),
            url: entry.url.clone(),
            reference: format!("{}: {}", entry.ref_kind, entry.reference),
            destination: entry.destination.display().to_string(),
            last_sync: last_sync_label(entry.last_synced_at),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn last_sync_label(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => format_timestamp(at),
        None => "Never".bright_black().to_string(),
    }
}
