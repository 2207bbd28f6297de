//! # gitdl-sync
//!
//! Archive fetcher, archive installer, and sync orchestration.
//!
//! Call [`sync_named`] to refresh a single tracked repository, or
//! [`sync_all`] to process every one in registry order. [`pipeline::run`]
//! wraps both behind a [`pipeline::SyncScope`].

pub mod config;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod installer;
pub mod pipeline;

pub use config::SyncConfig;
pub use engine::{sync_all, sync_named, sync_one, SyncOutcome, SyncState, SyncSummary};
pub use error::SyncError;
pub use fetcher::{archive_url, ArchiveFetcher, HttpFetcher, StagedArchive};
pub use installer::{install, InstallReport};
