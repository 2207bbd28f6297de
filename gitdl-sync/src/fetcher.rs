//! Archive fetcher — resolve a reference to a `.zip` address and download it.
//!
//! The download is streamed into a [`StagedArchive`] (a private temp file)
//! and flushed before it is handed to the installer, so a partial body never
//! reaches extraction. Dropping the [`StagedArchive`] deletes the file.

use std::io::{self, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use gitdl_core::RefKind;

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// Address convention
// ---------------------------------------------------------------------------

/// `<location>/archive/refs/{heads|tags}/<reference>.zip`
pub fn archive_url(location: &str, reference: &str, kind: RefKind) -> String {
    let segment = match kind {
        RefKind::Tag => "tags",
        RefKind::Branch => "heads",
    };
    format!(
        "{}/archive/refs/{segment}/{reference}.zip",
        location.trim_end_matches('/')
    )
}

// ---------------------------------------------------------------------------
// Staged archive
// ---------------------------------------------------------------------------

/// A fully downloaded archive in the system temp dir.
#[derive(Debug)]
pub struct StagedArchive {
    file: NamedTempFile,
}

impl StagedArchive {
    /// Stream `reader` to a fresh temp file.
    pub fn from_reader(reader: impl Read) -> Result<Self, SyncError> {
        Self::stage(reader, |path, e| io_err(path, e))
    }

    /// Like [`StagedArchive::from_reader`], but read failures go through
    /// `read_err` so they can be told apart from temp-file failures.
    fn stage(
        mut reader: impl Read,
        read_err: impl Fn(&Path, io::Error) -> SyncError,
    ) -> Result<Self, SyncError> {
        let mut file = tempfile::Builder::new()
            .prefix("git-download-")
            .suffix(".zip")
            .tempfile()
            .map_err(|e| io_err(std::env::temp_dir(), e))?;

        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(read_err(file.path(), e)),
            };
            file.as_file_mut()
                .write_all(&buf[..n])
                .map_err(|e| io_err(file.path(), e))?;
        }
        file.as_file_mut()
            .flush()
            .map_err(|e| io_err(file.path(), e))?;
        Ok(Self { file })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SyncError> {
        Self::from_reader(bytes)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

// ---------------------------------------------------------------------------
// Fetchers
// ---------------------------------------------------------------------------

/// Produces a staged archive for a repository reference.
pub trait ArchiveFetcher {
    fn fetch(
        &self,
        location: &str,
        reference: &str,
        kind: RefKind,
    ) -> Result<StagedArchive, SyncError>;
}

/// Blocking HTTP fetcher. One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("git-download/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(
        &self,
        location: &str,
        reference: &str,
        kind: RefKind,
    ) -> Result<StagedArchive, SyncError> {
        let url = archive_url(location, reference, kind);
        tracing::debug!("GET {url}");

        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => return Err(SyncError::Status { url, status }),
            Err(e) => {
                return Err(SyncError::Transport {
                    url,
                    source: Box::new(e),
                })
            }
        };
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(SyncError::Status { url, status });
        }

        let staged = StagedArchive::stage(response.into_reader(), |_, source| SyncError::Body {
            url: url.clone(),
            source,
        })?;
        tracing::debug!("staged {url} at {}", staged.path().display());
        Ok(staged)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
