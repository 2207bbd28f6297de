//! Error types for gitdl-sync.

use std::path::PathBuf;

use thiserror::Error;

use gitdl_core::{ErrorKind, RegistryError};

/// All errors that can arise from fetch, install, and sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid entry or request (empty URL, empty destination, empty name).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An error from the registry.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The request never produced a response.
    #[error("failed to download {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// The connection failed while the response body was being read.
    #[error("download of {url} was interrupted: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The remote answered with a non-success status.
    #[error("failed to download {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive (or one of its members) could not be read.
    #[error("failed to read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// An archive entry would land outside the destination.
    #[error("archive entry '{entry}' escapes the destination")]
    UnsafeEntry { entry: String },

    /// An install step failed for a specific target path.
    #[error("failed to {step} {path}: {source}")]
    Install {
        step: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Config(_) => ErrorKind::Configuration,
            SyncError::Registry(e) => e.kind(),
            SyncError::Transport { .. } | SyncError::Body { .. } | SyncError::Status { .. } => {
                ErrorKind::Transport
            }
            SyncError::Io { .. }
            | SyncError::Archive { .. }
            | SyncError::UnsafeEntry { .. }
            | SyncError::Install { .. } => ErrorKind::Storage,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Install`].
pub(crate) fn install_err(
    step: &'static str,
    path: impl Into<PathBuf>,
    source: std::io::Error,
) -> SyncError {
    SyncError::Install {
        step,
        path: path.into(),
        source,
    }
}
