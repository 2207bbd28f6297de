//! `git-download remove --name <name> [--delete-local]`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use gitdl_core::registry;
use gitdl_sync::SyncConfig;

/// Stop tracking a repository.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Name of the repository to remove.
    #[arg(long, short = 'n')]
    pub name: String,

    /// Also delete the repository's destination directory.
    #[arg(long)]
    pub delete_local: bool,
}

impl RemoveArgs {
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let removal = registry::remove_at(config.registry_path(), &self.name, self.delete_local)
            .with_context(|| format!("failed to remove '{}'", self.name))?;

        if let Some(err) = &removal.local_delete_error {
            eprintln!(
                "{} failed to delete local files: {err}",
                "warning:".yellow().bold()
            );
        } else if removal.deleted_local {
            println!("  Deleted {}", removal.entry.destination.display());
        }
        println!("✓ Repository '{}' removed successfully", removal.entry.name);
        Ok(())
    }
}
