//! Save/load roundtrip tests for the registry document.
//!
//! Each `#[case]` is isolated — no shared state.

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use gitdl_core::{registry, RefKind, Registry, RepoEntry, RepoName};
use rstest::rstest;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn repo(name: &str, kind: RefKind, reference: &str) -> RepoEntry {
    RepoEntry {
        name: RepoName::from(name),
        url: format!("https://github.com/acme/{name}"),
        reference: reference.to_string(),
        ref_kind: kind,
        last_synced_at: None,
        destination: PathBuf::from("./vendor").join(name),
    }
}

fn empty_registry() -> Registry {
    Registry::default()
}

fn mixed_registry() -> Registry {
    let mut synced = repo("tokio", RefKind::Tag, "tokio-1.38.0");
    synced.last_synced_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap());
    Registry {
        repositories: vec![
            repo("serde", RefKind::Branch, "master"),
            synced,
            repo("clap", RefKind::Branch, "main"),
        ],
    }
}

fn unicode_registry() -> Registry {
    let mut entry = repo("プロジェクト", RefKind::Branch, "функция/новая");
    entry.destination = PathBuf::from("./目录/проект");
    Registry {
        repositories: vec![entry],
    }
}

// ---------------------------------------------------------------------------
// Parameterised roundtrip test
// ---------------------------------------------------------------------------

#[rstest]
#[case("empty", empty_registry())]
#[case("mixed", mixed_registry())]
#[case("unicode", unicode_registry())]
fn save_then_load_reproduces_registry(#[case] label: &str, #[case] registry: Registry) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(".syncmeta.json");

    registry::save_at(&path, &registry).unwrap_or_else(|e| panic!("[{label}] save: {e}"));
    let back = registry::load_at(&path).unwrap_or_else(|e| panic!("[{label}] load: {e}"));

    assert_eq!(registry, back, "[{label}] registry differs after roundtrip");
}

// ---------------------------------------------------------------------------
// Documents written by older tools
// ---------------------------------------------------------------------------

#[test]
fn reads_legacy_document_with_zero_timestamps() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(".syncmeta.json");
    std::fs::write(
        &path,
        r#"{
  "repositories": [
    {
      "name": "widget",
      "url": "https://github.com/acme/widget",
      "branch": "main",
      "refType": "branch",
      "lastSync": "0001-01-01T00:00:00Z",
      "destination": "./widget"
    },
    {
      "name": "gadget",
      "url": "https://github.com/acme/gadget",
      "branch": "v1.0.0",
      "refType": "tag",
      "lastSync": "2024-03-10T09:15:00.5-05:00",
      "destination": "gadget"
    }
  ]
}"#,
    )
    .expect("write");

    let reg = registry::load_at(&path).expect("load");
    assert_eq!(reg.len(), 2);
    assert!(reg.repositories[0].last_synced_at.is_none());
    assert_eq!(reg.repositories[1].ref_kind, RefKind::Tag);
    let ts = reg.repositories[1].last_synced_at.expect("synced");
    assert_eq!(ts.to_rfc3339(), "2024-03-10T14:15:00.500+00:00");
}
