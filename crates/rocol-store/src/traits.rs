use rocol_types::{ObjectId, VersionId};

use crate::error::StoreResult;
use crate::inventory::Inventory;
use crate::object::VersionedObject;
use crate::transaction::StagedVersion;

/// Versioned object repository.
///
/// All implementations must satisfy these invariants:
/// - Committed versions are immutable.
/// - `commit_version` is all-or-nothing: on `Err`, `inventory(id)` returns
///   exactly what it returned before the call.
/// - Content is addressed by digest; writing the same bytes twice stores
///   them once.
/// - All I/O errors are propagated, never silently ignored.
pub trait Repository: Send + Sync {
    /// Read an object's inventory. `Ok(None)` if the object does not exist.
    fn inventory(&self, id: &str) -> StoreResult<Option<Inventory>>;

    /// Ids of every object that has at least one version, sorted.
    fn object_ids(&self) -> StoreResult<Vec<String>>;

    /// Read content by digest. `Ok(None)` if the digest is unknown.
    fn read_content(&self, digest: &ObjectId) -> StoreResult<Option<Vec<u8>>>;

    /// Append one version built from `staged`, creating the object if it
    /// does not exist yet.
    fn commit_version(&self, id: &str, staged: StagedVersion) -> StoreResult<VersionId>;
}

impl<'r> dyn Repository + 'r {
    /// Handle to a (possibly not yet existing) object.
    pub fn object<'a>(&'a self, id: &str) -> VersionedObject<'a> {
        VersionedObject::open(self, id)
    }
}
