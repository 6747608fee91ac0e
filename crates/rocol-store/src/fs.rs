use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rocol_types::{ObjectId, VersionId};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;
use crate::inventory::Inventory;
use crate::traits::Repository;
use crate::transaction::StagedVersion;

const MARKER_FILE: &str = "rocol.json";
const CONTENT_DIR: &str = "content";
const OBJECTS_DIR: &str = "objects";
const INVENTORY_FILE: &str = "inventory.json";

/// Marker written at the repository root.
#[derive(Debug, Serialize, Deserialize)]
struct RepositoryMarker {
    #[serde(rename = "type")]
    kind: String,
    version: u32,
}

impl RepositoryMarker {
    fn current() -> Self {
        Self {
            kind: "rocol-repository".into(),
            version: 1,
        }
    }
}

/// Directory-backed repository.
///
/// On-disk layout:
/// ```text
/// <root>/rocol.json                       repository marker
/// <root>/content/<2 hex>/<64 hex>         content blobs, one per digest
/// <root>/objects/<64 hex>/inventory.json  one inventory per object
/// ```
///
/// Object directories are named by a digest of the object id, so ids may
/// contain any characters. A commit writes every content blob first and
/// then replaces `inventory.json` with a rename, which is the single step
/// that makes the new version visible.
pub struct FsRepository {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsRepository {
    /// Initialize a new repository. The root must be absent or empty.
    pub fn create(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        if root.exists() && fs::read_dir(&root)?.next().is_some() {
            return Err(StoreError::AlreadyExists(root));
        }
        fs::create_dir_all(root.join(CONTENT_DIR))?;
        fs::create_dir_all(root.join(OBJECTS_DIR))?;
        let marker = serde_json::to_vec_pretty(&RepositoryMarker::current())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(root.join(MARKER_FILE), marker)?;
        info!(root = %root.display(), "created repository");
        Ok(Self::at(root))
    }

    /// Open an existing repository.
    pub fn load(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let marker_path = root.join(MARKER_FILE);
        if !marker_path.is_file() {
            return Err(StoreError::NotARepository(root));
        }
        let marker: RepositoryMarker = serde_json::from_slice(&fs::read(&marker_path)?)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if marker.kind != RepositoryMarker::current().kind {
            return Err(StoreError::NotARepository(root));
        }
        debug!(root = %root.display(), "loaded repository");
        Ok(Self::at(root))
    }

    /// Create the repository if the root does not exist yet, else load it.
    pub fn open_or_create(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref();
        if root.exists() {
            Self::load(root)
        } else {
            Self::create(root)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn at(root: PathBuf) -> Self {
        Self {
            root,
            write_lock: Mutex::new(()),
        }
    }

    fn object_dir(&self, id: &str) -> PathBuf {
        let digest = ContentHasher::OBJECT_PATH.hash(id.as_bytes());
        self.root.join(OBJECTS_DIR).join(digest.to_hex())
    }

    fn content_path(&self, digest: &ObjectId) -> PathBuf {
        let hex = digest.to_hex();
        self.root.join(CONTENT_DIR).join(&hex[..2]).join(hex)
    }

    fn write_content(&self, digest: &ObjectId, data: &[u8]) -> StoreResult<()> {
        let path = self.content_path(digest);
        if path.exists() {
            return Ok(());
        }
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(path.display().to_string()))?;
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn write_inventory(&self, inventory: &Inventory) -> StoreResult<()> {
        let dir = self.object_dir(&inventory.id);
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&inventory.to_json()?)?;
        tmp.as_file().sync_all()?;
        tmp.persist(dir.join(INVENTORY_FILE))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl Repository for FsRepository {
    fn inventory(&self, id: &str) -> StoreResult<Option<Inventory>> {
        let path = self.object_dir(id).join(INVENTORY_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Inventory::from_json(&fs::read(path)?).map(Some)
    }

    fn object_ids(&self) -> StoreResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root.join(OBJECTS_DIR))? {
            let path = entry?.path().join(INVENTORY_FILE);
            if path.is_file() {
                ids.push(Inventory::from_json(&fs::read(path)?)?.id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn read_content(&self, digest: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let path = self.content_path(digest);
        if !path.is_file() {
            return Ok(None);
        }
        let data = fs::read(path)?;
        if !ContentHasher::CONTENT.verify(&data, digest) {
            return Err(StoreError::CorruptContent {
                digest: digest.to_hex(),
                reason: "digest mismatch".into(),
            });
        }
        Ok(Some(data))
    }

    fn commit_version(&self, id: &str, staged: StagedVersion) -> StoreResult<VersionId> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::LockPoisoned(self.root.clone()))?;
        let current = self.inventory(id)?.unwrap_or_else(|| Inventory::new(id));

        let mut changes = BTreeMap::new();
        for (path, content) in &staged.entries {
            let data = content.read()?;
            let digest = ContentHasher::CONTENT.hash(&data);
            self.write_content(&digest, &data)?;
            debug!(%path, digest = %digest.short_hex(), "stored content");
            changes.insert(path.clone(), (digest, data.len() as u64));
        }

        let version = current.next_version();
        let next = current.with_version(&staged.message, &changes);
        self.write_inventory(&next)?;
        Ok(version)
    }
}

impl std::fmt::Debug for FsRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsRepository")
            .field("root", &self.root)
            .finish()
    }
}
