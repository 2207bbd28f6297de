//! `git-download init --url <url> [--ref ...] [--ref-type ...] [--destination ...] [--name ...]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gitdl_core::{registry, NewRepo};
use gitdl_sync::SyncConfig;

use super::super::RefKindArg;

/// Start tracking a repository.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Repository URL, e.g. https://github.com/owner/repo.
    #[arg(long)]
    pub url: String,

    /// Branch or tag to download. Defaults to "main".
    #[arg(long = "ref", value_name = "REF")]
    pub reference: Option<String>,

    /// Reference type: branch | tag. Defaults to branch.
    #[arg(long = "ref-type", value_name = "TYPE")]
    pub ref_type: Option<RefKindArg>,

    /// Local directory to extract into. Defaults to ./<name>.
    #[arg(long, short = 'd')]
    pub destination: Option<PathBuf>,

    /// Repository name. Defaults to the last segment of the URL.
    #[arg(long, short = 'n')]
    pub name: Option<String>,
}

impl InitArgs {
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let request = NewRepo {
            url: self.url,
            reference: self.reference,
            ref_kind: self.ref_type.map(Into::into),
            destination: self.destination,
            name: self.name,
        };
        let entry = registry::init_at(config.registry_path(), request).with_context(|| {
            format!(
                "failed to initialize repository in '{}'",
                config.registry_path().display()
            )
        })?;

        println!("✓ Repository '{}' initialized successfully", entry.name);
        println!(
            "  {} {} → {}",
            entry.ref_kind,
            entry.reference,
            entry.destination.display()
        );
        Ok(())
    }
}
