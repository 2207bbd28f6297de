//! Archive installer — unpack a staged `.zip` into a destination directory.
//!
//! Archives of this shape wrap everything in one top-level directory
//! (`<repo>-<ref>/`). The first entry names that wrapper; it is stripped from
//! every entry path before writing.
//!
//! Installation is not transactional: on failure, entries already written
//! stay on disk and the error names the step that failed.

use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};

use zip::ZipArchive;

use crate::error::{install_err, io_err, SyncError};

/// What an installation wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub files: usize,
    pub directories: usize,
}

/// Unpack `archive` into `destination`, stripping the wrapper segment.
pub fn install(archive: &Path, destination: &Path) -> Result<InstallReport, SyncError> {
    let file = File::open(archive).map_err(|e| io_err(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| archive_err(archive, e))?;

    fs::create_dir_all(destination)
        .map_err(|e| install_err("create destination", destination, e))?;

    let wrapper = match zip.len() {
        0 => None,
        _ => {
            let first = zip.by_index(0).map_err(|e| archive_err(archive, e))?;
            Some(wrapper_prefix(first.name()))
        }
    };

    let mut report = InstallReport::default();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| archive_err(archive, e))?;
        let Some(relative) = strip_wrapper(entry.name(), wrapper.as_deref())? else {
            continue;
        };
        let target = destination.join(&relative);
        let mode = entry.unix_mode();

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| install_err("create directory", &target, e))?;
            apply_mode(&target, mode)?;
            report.directories += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| install_err("create directory", parent, e))?;
        }
        let mut out = File::create(&target).map_err(|e| install_err("create file", &target, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| install_err("write file", &target, e))?;
        drop(out);
        apply_mode(&target, mode)?;
        report.files += 1;
    }

    tracing::debug!(
        "installed {} files, {} directories into {}",
        report.files,
        report.directories,
        destination.display()
    );
    Ok(report)
}

/// `proj-main/src/lib.rs` → `proj-main/`.
fn wrapper_prefix(first_entry: &str) -> String {
    let segment = first_entry.split('/').next().unwrap_or_default();
    format!("{segment}/")
}

/// Strip the wrapper prefix from `name`. `Ok(None)` means there is nothing
/// to write (the wrapper itself). Paths that would escape the destination
/// are errors.
fn strip_wrapper(name: &str, prefix: Option<&str>) -> Result<Option<PathBuf>, SyncError> {
    let trimmed = prefix
        .and_then(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name);

    let mut relative = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => {
                return Err(SyncError::UnsafeEntry {
                    entry: name.to_string(),
                })
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Ok(None);
    }
    Ok(Some(relative))
}

fn archive_err(path: &Path, source: zip::result::ZipError) -> SyncError {
    SyncError::Archive {
        path: path.to_path_buf(),
        source,
    }
}

/// Permission bits honoured from the archive: no group/other write and no
/// setuid, setgid or sticky bits, as if created under a 022 umask.
const MODE_MASK: u32 = 0o755;
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Declared mode to apply, if any. Symlink entries are written as plain
/// files holding the link target and keep the default mode.
#[cfg_attr(not(unix), allow(dead_code))]
fn effective_mode(mode: Option<u32>) -> Option<u32> {
    mode.filter(|m| m & S_IFMT != S_IFLNK)
        .map(|m| m & MODE_MASK)
        .filter(|m| *m != 0)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> Result<(), SyncError> {
    use std::os::unix::fs::PermissionsExt;

    let Some(mode) = effective_mode(mode) else {
        return Ok(());
    };
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| install_err("set permissions on", path, e))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> Result<(), SyncError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
