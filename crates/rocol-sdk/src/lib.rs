//! High-level SDK for rocol.
//!
//! A [`Collector`] holds the settings and repository shared by a run. Each
//! [`CollectionObject`] it hands out assembles one RO-Crate in a scratch
//! workspace, then validates it and commits it as a new version with
//! [`CollectionObject::add_to_repo`].

pub mod collector;
pub mod commit;
pub mod config;
pub mod error;
pub mod files;
pub mod object;
pub mod provenance;

pub use collector::Collector;
pub use commit::{CommitReceipt, CommitTransaction};
pub use config::CollectorConfig;
pub use error::{SdkError, SdkResult};
pub use files::{scan_workspace, FileRecord, FileRegistry, FileResolver};
pub use object::{CollectionObject, FileEntity, FileSource, ObjectState};
pub use provenance::{Provenance, ProvenanceConfig, PROVENANCE_ID};

// Re-export key types
pub use rocol_gate::{GateConfig, GateError, ValidatorSetting};
pub use rocol_graph::{CrateGraph, Entity};
pub use rocol_store::{FsRepository, InMemoryRepository, Repository, VersionedObject};
pub use rocol_types::{ArcpId, PathSegments, VersionId};
