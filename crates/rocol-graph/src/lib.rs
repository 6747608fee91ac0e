//! RO-Crate description graph for rocol.
//!
//! A crate is a flat JSON-LD `@graph` of entities. One entity, the metadata
//! descriptor (`ro-crate-metadata.json`), points via `about` at the root
//! dataset, which describes the collection object as a whole and links its
//! files through `hasPart`.
//!
//! Entity properties are always held as ordered lists, even when the source
//! document used a single value. Entities are additive: this crate offers
//! no removal.
//!
//! # Modules
//!
//! - [`entity`] -- [`Entity`] and reference helpers
//! - [`graph`] -- [`CrateGraph`], the mutable in-memory crate
//! - [`check`] -- structural checks against the set of known files
//! - [`preview`] -- HTML preview rendering

pub mod check;
pub mod entity;
pub mod error;
pub mod graph;
pub mod preview;
pub mod vocab;

pub use check::{validate, CheckResult, CheckStatus, FileIndex};
pub use entity::{as_reference, is_local_path, local_file_path, reference, Entity, EntityMut};
pub use error::{GraphError, GraphResult};
pub use graph::CrateGraph;
pub use preview::render_preview;
