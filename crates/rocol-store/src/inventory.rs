use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rocol_types::{ObjectId, VersionId};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// One immutable version of an object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub created: DateTime<Utc>,
    pub message: String,
    /// Logical path -> content digest, for every file in this version.
    pub state: BTreeMap<String, ObjectId>,
}

impl VersionRecord {
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&ObjectId> {
        self.state.get(path)
    }
}

/// Complete description of one object: every version and every digest it
/// references.
///
/// The inventory is the unit of visibility. Backends swap a whole inventory
/// in one step, so readers see either the old version list or the new one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: String,
    pub head: Option<VersionId>,
    /// Digest -> size in bytes, for every digest referenced by any version.
    pub manifest: BTreeMap<ObjectId, u64>,
    pub versions: BTreeMap<VersionId, VersionRecord>,
}

impl Inventory {
    /// An inventory for an object that has no versions yet.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            head: None,
            manifest: BTreeMap::new(),
            versions: BTreeMap::new(),
        }
    }

    /// Version ids in ascending order.
    pub fn version_ids(&self) -> Vec<VersionId> {
        self.versions.keys().copied().collect()
    }

    pub fn head_record(&self) -> Option<&VersionRecord> {
        self.head.and_then(|v| self.versions.get(&v))
    }

    /// The version the next commit will create.
    pub fn next_version(&self) -> VersionId {
        self.head.map(|v| v.next()).unwrap_or(VersionId::FIRST)
    }

    /// Build the inventory that results from committing `changes` on top of
    /// the current head. Staged paths replace same-named paths.
    ///
    /// `self` is left untouched; the caller swaps the returned value in.
    pub fn with_version(
        &self,
        message: &str,
        changes: &BTreeMap<String, (ObjectId, u64)>,
    ) -> Inventory {
        let mut next = self.clone();
        let version = self.next_version();
        let mut state = self
            .head_record()
            .map(|r| r.state.clone())
            .unwrap_or_default();
        for (path, (digest, size)) in changes {
            state.insert(path.clone(), *digest);
            next.manifest.insert(*digest, *size);
        }
        next.versions.insert(
            version,
            VersionRecord {
                created: Utc::now(),
                message: message.to_string(),
                state,
            },
        );
        next.head = Some(version);
        next
    }

    pub fn to_json(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn from_json(data: &[u8]) -> StoreResult<Self> {
        serde_json::from_slice(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(path: &str, content: &[u8]) -> (String, (ObjectId, u64)) {
        (
            path.to_string(),
            (ObjectId::from_bytes(content), content.len() as u64),
        )
    }

    #[test]
    fn empty_inventory_starts_at_v1() {
        let inv = Inventory::new("obj");
        assert!(inv.head.is_none());
        assert_eq!(inv.next_version(), VersionId::FIRST);
        assert!(inv.head_record().is_none());
    }

    #[test]
    fn with_version_overlays_previous_state() {
        let inv = Inventory::new("obj");
        let v1 = inv.with_version("first", &BTreeMap::from([change("a.txt", b"a"), change("b.txt", b"b")]));
        let v2 = v1.with_version("second", &BTreeMap::from([change("b.txt", b"B")]));

        assert_eq!(v2.version_ids().len(), 2);
        let head = v2.head_record().unwrap();
        assert_eq!(head.len(), 2);
        assert_eq!(head.get("a.txt"), Some(&ObjectId::from_bytes(b"a")));
        assert_eq!(head.get("b.txt"), Some(&ObjectId::from_bytes(b"B")));
        // v1 unchanged
        let first = &v2.versions[&VersionId::FIRST];
        assert_eq!(first.get("b.txt"), Some(&ObjectId::from_bytes(b"b")));
        assert_eq!(v2.manifest.len(), 3);
    }

    #[test]
    fn with_version_does_not_mutate_source() {
        let inv = Inventory::new("obj");
        let _ = inv.with_version("first", &BTreeMap::from([change("a.txt", b"a")]));
        assert!(inv.versions.is_empty());
    }

    #[test]
    fn json_roundtrip_keeps_versions() {
        let inv = Inventory::new("arcp://name,ns/x")
            .with_version("first", &BTreeMap::from([change("a.txt", b"a")]));
        let parsed = Inventory::from_json(&inv.to_json().unwrap()).unwrap();
        assert_eq!(parsed, inv);
    }
}
