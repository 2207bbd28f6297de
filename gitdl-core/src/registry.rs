//! The `.syncmeta.json` repository registry.
//!
//! # Storage layout
//!
//! ```text
//! <working dir>/
//!   .syncmeta.json        (the whole registry, rewritten on every mutation)
//!   .syncmeta.json.tmp    (only exists mid-save)
//! ```
//!
//! # API pattern
//!
//! Every function that touches disk takes the document path explicitly
//! (`fn_at(path: &Path, …)`), so tests point it at a `TempDir` and the CLI
//! resolves the path once from its flags.

use std::path::{Path, PathBuf};

use crate::error::{io_err, persist_err, RegistryError};
use crate::types::{default_reference, RefKind, Registry, RepoEntry, RepoName};

/// File name of the registry document in the working directory.
pub const DEFAULT_REGISTRY_FILE: &str = ".syncmeta.json";

// ---------------------------------------------------------------------------
// 1. In-memory operations
// ---------------------------------------------------------------------------

impl Registry {
    /// Insert `entry`, replacing any entry with the same name in place.
    pub fn upsert(&mut self, entry: RepoEntry) {
        match self.find_mut(entry.name.as_str()) {
            Some(existing) => *existing = entry,
            None => self.repositories.push(entry),
        }
    }

    /// Remove the first entry named `name`. Returns whether one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.repositories.iter().position(|r| r.name.0 == name) {
            Some(idx) => {
                self.repositories.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn find(&self, name: &str) -> Option<&RepoEntry> {
        self.repositories.iter().find(|r| r.name.0 == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut RepoEntry> {
        self.repositories.iter_mut().find(|r| r.name.0 == name)
    }

    /// Names in stored order.
    pub fn names(&self) -> Vec<RepoName> {
        self.repositories.iter().map(|r| r.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the registry document at `path`.
///
/// A missing document is an empty registry, not an error.
/// Returns `RegistryError::Parse` (with the path) if the JSON is malformed.
pub fn load_at(path: &Path) -> Result<Registry, RegistryError> {
    if !path.exists() {
        tracing::debug!("no registry at {}, starting empty", path.display());
        return Ok(Registry::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|e| RegistryError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically replace the registry document at `path`.
///
/// Write flow: serialize → `<file>.tmp` sibling → `rename`.
/// The `.tmp` sits next to the target so the rename never crosses filesystems.
pub fn save_at(path: &Path, registry: &Registry) -> Result<(), RegistryError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| persist_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(registry).map_err(RegistryError::Serialize)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, json).map_err(|e| persist_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(persist_err(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Registration request; everything but `url` falls back to a default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRepo {
    pub url: String,
    pub reference: Option<String>,
    pub ref_kind: Option<RefKind>,
    pub destination: Option<PathBuf>,
    pub name: Option<String>,
}

impl NewRepo {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Resolve defaults into a never-synced entry.
    ///
    /// - name: last `/` segment of the URL
    /// - reference: `main`
    /// - ref kind: branch
    /// - destination: `./<name>`
    pub fn into_entry(self) -> Result<RepoEntry, RegistryError> {
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(RegistryError::Config("URL is required".into()));
        }

        let name = match self.name.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => name_from_url(&url).ok_or_else(|| {
                RegistryError::Config(format!("cannot derive a repository name from '{url}'"))
            })?,
        };

        let destination = self
            .destination
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(".").join(&name));

        Ok(RepoEntry {
            name: RepoName::from(name),
            url,
            reference: self
                .reference
                .filter(|r| !r.is_empty())
                .unwrap_or_else(default_reference),
            ref_kind: self.ref_kind.unwrap_or_default(),
            last_synced_at: None,
            destination,
        })
    }
}

/// `https://github.com/owner/repo/` → `repo`.
pub fn name_from_url(url: &str) -> Option<String> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.ends_with(':'))
        .map(str::to_owned)
}

/// Register (or re-register) a repository in the document at `path`.
///
/// Re-running with an existing name replaces that entry in place, including
/// its sync timestamp.
pub fn init_at(path: &Path, request: NewRepo) -> Result<RepoEntry, RegistryError> {
    let entry = request.into_entry()?;
    let mut registry = load_at(path)?;
    registry.upsert(entry.clone());
    save_at(path, &registry)?;
    tracing::info!("registered '{}' ({})", entry.name, entry.url);
    Ok(entry)
}

// ---------------------------------------------------------------------------
// 5. Remove
// ---------------------------------------------------------------------------

/// Outcome of [`remove_at`].
#[derive(Debug)]
pub struct Removal {
    pub entry: RepoEntry,
    /// The destination tree was deleted.
    pub deleted_local: bool,
    /// Set when deleting the destination failed; the entry is removed anyway.
    pub local_delete_error: Option<RegistryError>,
}

/// Stop tracking `name`, optionally deleting its destination tree first.
pub fn remove_at(path: &Path, name: &str, delete_local: bool) -> Result<Removal, RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::Config("repository name is required".into()));
    }

    let mut registry = load_at(path)?;
    let entry = registry
        .find(name)
        .cloned()
        .ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })?;

    let mut deleted_local = false;
    let mut local_delete_error = None;
    if delete_local && !entry.destination.as_os_str().is_empty() {
        match std::fs::remove_dir_all(&entry.destination) {
            Ok(()) => deleted_local = true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    "failed to delete local files at {}: {e}",
                    entry.destination.display()
                );
                local_delete_error = Some(io_err(&entry.destination, e));
            }
        }
    }

    registry.remove(name);
    save_at(path, &registry)?;

    Ok(Removal {
        entry,
        deleted_local,
        local_delete_error,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
