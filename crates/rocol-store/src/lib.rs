//! Versioned, content-addressed object storage for rocol.
//!
//! A repository holds named objects. Each object is a sequence of immutable
//! versions; each version maps logical file paths to content digests. File
//! content is stored once per digest, so unchanged files cost nothing when a
//! new version is committed.
//!
//! # Writing
//!
//! All writes go through a [`Transaction`]: the caller stages named writes
//! (`write`, `import_file`, `import_dir`) inside a closure passed to
//! [`VersionedObject::transaction`]. Returning `Ok` commits every staged
//! write as one new version; returning `Err` (or failing while content is
//! copied) leaves the object exactly as it was.
//!
//! # Backends
//!
//! All backends implement the [`Repository`] trait:
//!
//! - [`InMemoryRepository`] -- `HashMap`-based store for tests and embedding
//! - [`FsRepository`] -- directory-backed store with atomic inventory swaps
//!
//! # Design Rules
//!
//! 1. Versions are immutable once committed.
//! 2. Content first, inventory last: a version becomes visible only when its
//!    inventory is swapped in, after every content blob is durable.
//! 3. One writer per object; this crate does no cross-object locking.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod hasher;
pub mod inventory;
pub mod memory;
pub mod object;
pub mod traits;
pub mod transaction;

pub use error::{StoreError, StoreResult};
pub use fs::FsRepository;
pub use hasher::ContentHasher;
pub use inventory::{Inventory, VersionRecord};
pub use memory::InMemoryRepository;
pub use object::VersionedObject;
pub use traits::Repository;
pub use transaction::{normalize_logical_path, StagedContent, StagedVersion, Transaction};
