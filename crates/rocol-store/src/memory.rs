use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use rocol_types::{ObjectId, VersionId};

use crate::error::StoreResult;
use crate::hasher::ContentHasher;
use crate::inventory::Inventory;
use crate::traits::Repository;
use crate::transaction::StagedVersion;

/// In-memory, HashMap-based repository.
///
/// Intended for tests and embedding. Inventories and content live behind
/// `RwLock`s; a commit reads every staged source before taking any lock, so
/// an unreadable source leaves the repository untouched.
pub struct InMemoryRepository {
    inventories: RwLock<HashMap<String, Inventory>>,
    content: RwLock<HashMap<ObjectId, Vec<u8>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            inventories: RwLock::new(HashMap::new()),
            content: RwLock::new(HashMap::new()),
        }
    }

    /// Number of distinct content blobs held.
    pub fn content_count(&self) -> usize {
        self.content.read().expect("lock poisoned").len()
    }

    /// Total bytes across all content blobs.
    pub fn total_bytes(&self) -> u64 {
        self.content
            .read()
            .expect("lock poisoned")
            .values()
            .map(|c| c.len() as u64)
            .sum()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for InMemoryRepository {
    fn inventory(&self, id: &str) -> StoreResult<Option<Inventory>> {
        let map = self.inventories.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn object_ids(&self) -> StoreResult<Vec<String>> {
        let map = self.inventories.read().expect("lock poisoned");
        let mut ids: Vec<String> = map.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn read_content(&self, digest: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let map = self.content.read().expect("lock poisoned");
        Ok(map.get(digest).cloned())
    }

    fn commit_version(&self, id: &str, staged: StagedVersion) -> StoreResult<VersionId> {
        let mut blobs = Vec::with_capacity(staged.entries.len());
        let mut changes = BTreeMap::new();
        for (path, content) in &staged.entries {
            let data = content.read()?;
            let digest = ContentHasher::CONTENT.hash(&data);
            changes.insert(path.clone(), (digest, data.len() as u64));
            blobs.push((digest, data));
        }

        {
            let mut content = self.content.write().expect("lock poisoned");
            for (digest, data) in blobs {
                content.entry(digest).or_insert(data);
            }
        }

        let mut inventories = self.inventories.write().expect("lock poisoned");
        let current = inventories
            .get(id)
            .cloned()
            .unwrap_or_else(|| Inventory::new(id));
        let version = current.next_version();
        let next = current.with_version(&staged.message, &changes);
        inventories.insert(id.to_string(), next);
        Ok(version)
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let objects = self.inventories.read().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("InMemoryRepository")
            .field("object_count", &objects)
            .field("content_count", &self.content_count())
            .finish()
    }
}
