//! Sync orchestration: fetch → install → record, one repository at a time.
//!
//! ## Per-repository state machine
//!
//! ```text
//! Pending → Fetching → Fetched → Installing → Installed → Recorded
//!              │                     │
//!              └──────── Errored ────┘
//! ```
//!
//! A repository only reaches `Recorded` once its new `lastSync` has been
//! written to the registry document. If that write fails the outcome stays at
//! `Installed` with the persistence error attached; the extracted files are
//! not rolled back.

use std::fmt;

use chrono::{DateTime, Utc};

use gitdl_core::{registry, Registry, RepoEntry, RepoName};

use crate::config::SyncConfig;
use crate::error::{install_err, SyncError};
use crate::fetcher::ArchiveFetcher;
use crate::installer::{self, InstallReport};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Where a repository's sync stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Pending,
    Fetching,
    Fetched,
    Installing,
    Installed,
    Recorded,
    Errored,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncState::Pending => "pending",
            SyncState::Fetching => "fetching",
            SyncState::Fetched => "fetched",
            SyncState::Installing => "installing",
            SyncState::Installed => "installed",
            SyncState::Recorded => "recorded",
            SyncState::Errored => "errored",
        };
        f.write_str(label)
    }
}

/// Outcome of syncing a single repository.
#[derive(Debug)]
pub struct SyncOutcome {
    pub name: RepoName,
    pub state: SyncState,
    /// Timestamp written to the registry; set once `Recorded`.
    pub synced_at: Option<DateTime<Utc>>,
    pub installed: Option<InstallReport>,
    pub error: Option<SyncError>,
}

impl SyncOutcome {
    fn pending(name: RepoName) -> Self {
        Self {
            name,
            state: SyncState::Pending,
            synced_at: None,
            installed: None,
            error: None,
        }
    }

    fn advance(&mut self, next: SyncState) {
        tracing::debug!("{}: {} -> {}", self.name, self.state, next);
        self.state = next;
    }

    fn errored(mut self, error: SyncError) -> Self {
        tracing::debug!("{}: {} -> errored: {error}", self.name, self.state);
        self.state = SyncState::Errored;
        self.error = Some(error);
        self
    }

    pub fn is_success(&self) -> bool {
        self.state == SyncState::Recorded
    }
}

/// Outcomes of a batch, in registry order.
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// sync_one
// ---------------------------------------------------------------------------

fn validate(entry: &RepoEntry) -> Result<(), SyncError> {
    if entry.url.trim().is_empty() {
        return Err(SyncError::Config(format!(
            "repository '{}' has no URL",
            entry.name
        )));
    }
    if entry.destination.as_os_str().is_empty() {
        return Err(SyncError::Config(format!(
            "repository '{}' has no destination",
            entry.name
        )));
    }
    Ok(())
}

/// Fetch, install, and record one repository.
///
/// On success `entry` is upserted into `reg` with a fresh `lastSync` and
/// the registry is saved to `config.registry_path`. On fetch or install
/// failure neither the registry nor its document is touched. The staged
/// archive is dropped before this returns on every path.
pub fn sync_one<F: ArchiveFetcher + ?Sized>(
    config: &SyncConfig,
    fetcher: &F,
    reg: &mut Registry,
    mut entry: RepoEntry,
) -> SyncOutcome {
    let mut outcome = SyncOutcome::pending(entry.name.clone());
    if let Err(e) = validate(&entry) {
        return outcome.errored(e);
    }
    if let Err(e) = std::fs::create_dir_all(&entry.destination) {
        return outcome.errored(install_err("create destination", &entry.destination, e));
    }

    outcome.advance(SyncState::Fetching);
    let staged = match fetcher.fetch(&entry.url, &entry.reference, entry.ref_kind) {
        Ok(staged) => staged,
        Err(e) => return outcome.errored(e),
    };
    outcome.advance(SyncState::Fetched);

    outcome.advance(SyncState::Installing);
    let report = match installer::install(staged.path(), &entry.destination) {
        Ok(report) => report,
        Err(e) => return outcome.errored(e),
    };
    drop(staged);
    outcome.installed = Some(report);
    outcome.advance(SyncState::Installed);

    let now = Utc::now();
    entry.last_synced_at = Some(now);
    reg.upsert(entry);
    if let Err(e) = registry::save_at(&config.registry_path, reg) {
        tracing::warn!("'{}' installed but not recorded: {e}", outcome.name);
        outcome.error = Some(e.into());
        return outcome;
    }
    outcome.synced_at = Some(now);
    outcome.advance(SyncState::Recorded);

    tracing::info!(
        "synced '{}' ({} files) at {}",
        outcome.name,
        report.files,
        now.to_rfc3339()
    );
    outcome
}

// ---------------------------------------------------------------------------
// sync_named / sync_all
// ---------------------------------------------------------------------------

/// Sync the repository called `name`.
///
/// Errors only for problems that prevent starting: an empty name, an
/// unreadable registry, or an unknown repository. Fetch and install failures
/// are reported in the returned outcome.
pub fn sync_named<F: ArchiveFetcher + ?Sized>(
    config: &SyncConfig,
    fetcher: &F,
    name: &str,
) -> Result<SyncOutcome, SyncError> {
    if name.is_empty() {
        return Err(SyncError::Config("repository name is required".into()));
    }
    let mut reg = registry::load_at(&config.registry_path)?;
    let entry = reg
        .find(name)
        .cloned()
        .ok_or_else(|| gitdl_core::RegistryError::NotFound {
            name: name.to_string(),
        })?;
    Ok(sync_one(config, fetcher, &mut reg, entry))
}

/// Sync every tracked repository in stored order.
///
/// The registry is re-read before each repository and re-written after each
/// success, so every sync sees the document as the previous one left it and a
/// crash mid-run keeps the repositories already recorded. One repository's
/// failure never stops the rest.
pub fn sync_all<F: ArchiveFetcher + ?Sized>(
    config: &SyncConfig,
    fetcher: &F,
) -> Result<SyncSummary, SyncError> {
    let names = registry::load_at(&config.registry_path)?.names();
    let mut summary = SyncSummary::default();

    for name in names {
        let mut reg = match registry::load_at(&config.registry_path) {
            Ok(reg) => reg,
            Err(e) => {
                tracing::warn!("error syncing '{name}': {e}");
                summary
                    .outcomes
                    .push(SyncOutcome::pending(name).errored(e.into()));
                continue;
            }
        };
        let Some(entry) = reg.find(name.as_str()).cloned() else {
            tracing::debug!("'{name}' was removed from the registry, skipping");
            continue;
        };

        let outcome = sync_one(config, fetcher, &mut reg, entry);
        if let Some(e) = &outcome.error {
            tracing::warn!("error syncing '{}': {e}", outcome.name);
        }
        summary.outcomes.push(outcome);
    }

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::{Cursor, Write};
    use std::path::{Path, PathBuf};

    use gitdl_core::{ErrorKind, NewRepo, RefKind};
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use crate::fetcher::{archive_url, StagedArchive};

    /// Serves `<name>-<ref>/README.md` archives; URLs listed in `failing`
    /// answer 404 and URLs in `corrupt` return bytes that are not a zip.
    #[derive(Default)]
    struct FakeFetcher {
        failing: Vec<String>,
        corrupt: Vec<String>,
        calls: RefCell<Vec<String>>,
        staged: RefCell<Vec<PathBuf>>,
    }

    impl ArchiveFetcher for FakeFetcher {
        fn fetch(
            &self,
            location: &str,
            reference: &str,
            kind: RefKind,
        ) -> Result<StagedArchive, SyncError> {
            let url = archive_url(location, reference, kind);
            self.calls.borrow_mut().push(url.clone());
            if self.failing.iter().any(|f| f == location) {
                return Err(SyncError::Status { url, status: 404 });
            }
            let staged = if self.corrupt.iter().any(|f| f == location) {
                StagedArchive::from_bytes(b"not a zip")?
            } else {
                let name = location.rsplit('/').next().unwrap_or("repo");
                StagedArchive::from_bytes(&zip_bytes(&format!("{name}-{reference}"), location))?
            };
            self.staged.borrow_mut().push(staged.path().to_path_buf());
            Ok(staged)
        }
    }

    fn zip_bytes(wrapper: &str, body: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.add_directory(format!("{wrapper}/"), options).unwrap();
        writer
            .start_file(format!("{wrapper}/README.md"), options)
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    struct Fixture {
        root: TempDir,
        config: SyncConfig,
    }

    impl Fixture {
        fn new(names: &[&str]) -> Self {
            let root = TempDir::new().unwrap();
            let config = SyncConfig::new(root.path().join(".syncmeta.json"));
            for name in names {
                let mut request = NewRepo::new(url(name));
                request.destination = Some(root.path().join("out").join(name));
                registry::init_at(&config.registry_path, request).unwrap();
            }
            Self { root, config }
        }

        fn registry(&self) -> Registry {
            registry::load_at(&self.config.registry_path).unwrap()
        }

        fn dest(&self, name: &str) -> PathBuf {
            self.root.path().join("out").join(name)
        }
    }

    fn url(name: &str) -> String {
        format!("https://example.test/acme/{name}")
    }

    #[test]
    fn sync_one_records_timestamp_and_installs() {
        let fx = Fixture::new(&["widget"]);
        let fetcher = FakeFetcher::default();
        let mut reg = fx.registry();
        let entry = reg.find("widget").cloned().unwrap();

        let outcome = sync_one(&fx.config, &fetcher, &mut reg, entry);

        assert!(outcome.is_success(), "got: {:?}", outcome.error);
        assert_eq!(outcome.installed.unwrap().files, 1);
        assert_eq!(
            std::fs::read_to_string(fx.dest("widget").join("README.md")).unwrap(),
            url("widget")
        );
        let stored = fx.registry();
        assert_eq!(
            stored.find("widget").unwrap().last_synced_at,
            outcome.synced_at
        );
        assert_eq!(
            fetcher.calls.borrow().as_slice(),
            ["https://example.test/acme/widget/archive/refs/heads/main.zip"]
        );
    }

    #[test]
    fn fetch_failure_leaves_registry_untouched() {
        let fx = Fixture::new(&["widget"]);
        let before = std::fs::read(&fx.config.registry_path).unwrap();
        let fetcher = FakeFetcher {
            failing: vec![url("widget")],
            ..FakeFetcher::default()
        };

        let outcome = sync_named(&fx.config, &fetcher, "widget").expect("sync");

        assert_eq!(outcome.state, SyncState::Errored);
        assert_eq!(outcome.error.as_ref().unwrap().kind(), ErrorKind::Transport);
        assert!(outcome.synced_at.is_none());
        assert_eq!(std::fs::read(&fx.config.registry_path).unwrap(), before);
        assert!(fx.registry().find("widget").unwrap().last_synced_at.is_none());
    }

    #[test]
    fn install_failure_discards_staged_archive() {
        let fx = Fixture::new(&["widget"]);
        let fetcher = FakeFetcher {
            corrupt: vec![url("widget")],
            ..FakeFetcher::default()
        };

        let outcome = sync_named(&fx.config, &fetcher, "widget").expect("sync");

        assert_eq!(outcome.state, SyncState::Errored);
        assert!(matches!(outcome.error, Some(SyncError::Archive { .. })));
        assert!(fx.registry().find("widget").unwrap().last_synced_at.is_none());
        let staged = fetcher.staged.borrow();
        assert_eq!(staged.len(), 1);
        assert!(!staged[0].exists(), "staged archive must be removed");
    }

    #[test]
    fn successful_sync_discards_staged_archive() {
        let fx = Fixture::new(&["widget"]);
        let fetcher = FakeFetcher::default();
        sync_named(&fx.config, &fetcher, "widget").expect("sync");
        assert!(fetcher.staged.borrow().iter().all(|p| !p.exists()));
    }

    #[test]
    fn empty_destination_is_rejected_before_fetch() {
        let fx = Fixture::new(&[]);
        let fetcher = FakeFetcher::default();
        let mut reg = Registry::default();
        let mut entry = NewRepo::new(url("widget")).into_entry().unwrap();
        entry.destination = PathBuf::new();

        let outcome = sync_one(&fx.config, &fetcher, &mut reg, entry);

        assert_eq!(outcome.state, SyncState::Errored);
        assert_eq!(
            outcome.error.as_ref().unwrap().kind(),
            ErrorKind::Configuration
        );
        assert!(fetcher.calls.borrow().is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn sync_named_unknown_is_not_found() {
        let fx = Fixture::new(&["widget"]);
        let err = sync_named(&fx.config, &FakeFetcher::default(), "ghost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = sync_named(&fx.config, &FakeFetcher::default(), "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn sync_all_continues_past_failures() {
        let fx = Fixture::new(&["one", "two", "three"]);
        let fetcher = FakeFetcher {
            failing: vec![url("two")],
            ..FakeFetcher::default()
        };

        let summary = sync_all(&fx.config, &fetcher).expect("sync all");

        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);
        let states: Vec<_> = summary.outcomes.iter().map(|o| o.state).collect();
        assert_eq!(
            states,
            [SyncState::Recorded, SyncState::Errored, SyncState::Recorded]
        );

        let reg = fx.registry();
        assert!(reg.find("one").unwrap().last_synced_at.is_some());
        assert!(reg.find("two").unwrap().last_synced_at.is_none());
        assert!(reg.find("three").unwrap().last_synced_at.is_some());
        let names: Vec<_> = reg.names().into_iter().map(|n| n.0).collect();
        assert_eq!(names, ["one", "two", "three"]);
    }

    /// Removes `victim` from the document while `trigger` is being fetched.
    struct RemovingFetcher<'a> {
        registry_path: &'a Path,
        trigger: String,
        victim: &'a str,
        inner: FakeFetcher,
    }

    impl ArchiveFetcher for RemovingFetcher<'_> {
        fn fetch(
            &self,
            location: &str,
            reference: &str,
            kind: RefKind,
        ) -> Result<StagedArchive, SyncError> {
            if location == self.trigger {
                let mut reg = registry::load_at(self.registry_path)?;
                if reg.remove(self.victim) {
                    registry::save_at(self.registry_path, &reg)?;
                }
            }
            self.inner.fetch(location, reference, kind)
        }
    }

    #[test]
    fn sync_all_rereads_registry_between_repositories() {
        let fx = Fixture::new(&["one", "two", "three"]);
        let fetcher = RemovingFetcher {
            registry_path: &fx.config.registry_path,
            trigger: url("two"),
            victim: "three",
            inner: FakeFetcher {
                failing: vec![url("two")],
                ..FakeFetcher::default()
            },
        };

        let summary = sync_all(&fx.config, &fetcher).expect("sync all");

        let attempted: Vec<_> = summary.outcomes.iter().map(|o| o.name.0.clone()).collect();
        assert_eq!(attempted, ["one", "two"]);
        let reg = fx.registry();
        let names: Vec<_> = reg.names().into_iter().map(|n| n.0).collect();
        assert_eq!(names, ["one", "two"]);
        assert!(reg.find("one").unwrap().last_synced_at.is_some());
    }

    #[test]
    fn sync_all_on_missing_registry_is_empty() {
        let fx = Fixture::new(&[]);
        let summary = sync_all(&fx.config, &FakeFetcher::default()).expect("sync all");
        assert!(summary.is_empty());
        assert!(!fx.config.registry_path.exists());
    }

    #[test]
    fn persistence_failure_keeps_installed_files() {
        let fx = Fixture::new(&[]);
        // A directory where the document should be makes the final rename fail.
        let blocked = fx.root.path().join("blocked.json");
        std::fs::create_dir_all(blocked.join("occupied")).unwrap();
        let config = SyncConfig::new(&blocked);
        let mut reg = Registry::default();
        let mut entry = NewRepo::new(url("widget")).into_entry().unwrap();
        entry.destination = fx.dest("widget");

        let outcome = sync_one(&config, &FakeFetcher::default(), &mut reg, entry);

        assert_eq!(outcome.state, SyncState::Installed);
        assert_eq!(
            outcome.error.as_ref().unwrap().kind(),
            ErrorKind::Persistence
        );
        assert!(outcome.synced_at.is_none());
        assert!(fx.dest("widget").join("README.md").exists());
    }
}
