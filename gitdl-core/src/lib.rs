//! gitdl core library — domain types, registry persistence, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and the `.syncmeta.json` document structs
//! - [`error`] — [`RegistryError`] and the shared [`ErrorKind`]
//! - [`registry`] — load / save / upsert / init / remove

pub mod error;
pub mod registry;
pub mod types;

pub use error::{ErrorKind, RegistryError};
pub use registry::{NewRepo, Removal, DEFAULT_REGISTRY_FILE};
pub use types::{RefKind, Registry, RepoEntry, RepoName, DEFAULT_REFERENCE};
