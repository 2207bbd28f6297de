//! Error types for gitdl-core.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification shared by every error in the workspace.
///
/// Callers branch on this instead of matching individual variants across
/// crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid input: no URL, bad ref type, empty name.
    Configuration,
    /// The named repository is not in the registry.
    NotFound,
    /// Network failure or non-success response while fetching an archive.
    Transport,
    /// Filesystem create/read/write failure, or a malformed document.
    Storage,
    /// The registry document could not be written back.
    Persistence,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Storage => write!(f, "storage"),
            ErrorKind::Persistence => write!(f, "persistence"),
        }
    }
}

/// All errors that can arise from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Invalid or missing user input.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No entry with this name is tracked.
    #[error("repository '{name}' not found")]
    NotFound { name: String },

    /// Reading the registry document (or touching a destination) failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error on load — includes the document path.
    #[error("failed to parse registry at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (save path).
    #[error("failed to serialize registry: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Writing the registry document back failed.
    #[error("failed to save registry at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::Config(_) => ErrorKind::Configuration,
            RegistryError::NotFound { .. } => ErrorKind::NotFound,
            RegistryError::Io { .. } | RegistryError::Parse { .. } => ErrorKind::Storage,
            RegistryError::Serialize(_) | RegistryError::Persist { .. } => ErrorKind::Persistence,
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn persist_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Persist {
        path: path.into(),
        source,
    }
}
