//! Foundation types for rocol.
//!
//! Every other rocol crate depends on `rocol-types`.
//!
//! # Key Types
//!
//! - [`ArcpId`]: Globally meaningful object identifier minted from a namespace and path
//! - [`PathSegments`]: Ordered path segments fed to the minter
//! - [`ObjectId`]: Content digest (BLAKE3 hash) of stored file content
//! - [`VersionId`]: 1-based version number of a versioned object

pub mod error;
pub mod identity;
pub mod object;
pub mod version;

pub use error::TypeError;
pub use identity::{ArcpId, PathSegments};
pub use object::ObjectId;
pub use version::VersionId;
