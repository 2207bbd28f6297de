//! Shared sync pipeline entrypoint used by the CLI.

use crate::{sync_all, sync_named, ArchiveFetcher, SyncConfig, SyncError, SyncSummary};

/// Scope for a sync pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    /// Sync every tracked repository.
    All,
    /// Sync a single named repository.
    Repo(String),
}

/// Run the sync pipeline for a scope.
///
/// Per-repository fetch/install failures land in the summary; only problems
/// that stop the run from starting (unreadable registry, unknown name) are
/// returned as errors.
pub fn run<F: ArchiveFetcher + ?Sized>(
    config: &SyncConfig,
    fetcher: &F,
    scope: SyncScope,
) -> Result<SyncSummary, SyncError> {
    match scope {
        SyncScope::All => sync_all(config, fetcher),
        SyncScope::Repo(name) => Ok(SyncSummary {
            outcomes: vec![sync_named(config, fetcher, &name)?],
        }),
    }
}
