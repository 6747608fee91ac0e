use std::fmt;

use rocol_types::VersionId;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::inventory::{Inventory, VersionRecord};
use crate::traits::Repository;
use crate::transaction::Transaction;

/// Handle to one object inside a repository.
///
/// Opening a handle never touches storage; an object springs into existence
/// with its first committed transaction.
pub struct VersionedObject<'r> {
    repo: &'r dyn Repository,
    id: String,
}

impl<'r> VersionedObject<'r> {
    pub fn open(repo: &'r dyn Repository, id: impl Into<String>) -> Self {
        Self {
            repo,
            id: id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exists(&self) -> StoreResult<bool> {
        Ok(self.repo.inventory(&self.id)?.is_some())
    }

    pub fn inventory(&self) -> StoreResult<Inventory> {
        self.repo
            .inventory(&self.id)?
            .ok_or_else(|| StoreError::ObjectNotFound(self.id.clone()))
    }

    /// Version ids in ascending order; empty for an object not yet written.
    pub fn versions(&self) -> StoreResult<Vec<VersionId>> {
        Ok(self
            .repo
            .inventory(&self.id)?
            .map(|inv| inv.version_ids())
            .unwrap_or_default())
    }

    pub fn head(&self) -> StoreResult<Option<VersionId>> {
        Ok(self.repo.inventory(&self.id)?.and_then(|inv| inv.head))
    }

    /// The record of one version, or of the head when `version` is `None`.
    pub fn version(&self, version: Option<VersionId>) -> StoreResult<VersionRecord> {
        let inv = self.inventory()?;
        let version = match version.or(inv.head) {
            Some(v) => v,
            None => return Err(StoreError::ObjectNotFound(self.id.clone())),
        };
        inv.versions
            .get(&version)
            .cloned()
            .ok_or_else(|| StoreError::VersionNotFound {
                id: self.id.clone(),
                version,
            })
    }

    /// Read one file from a version (head when `version` is `None`).
    pub fn read_file(&self, version: Option<VersionId>, path: &str) -> StoreResult<Vec<u8>> {
        let inv = self.inventory()?;
        let version = version
            .or(inv.head)
            .ok_or_else(|| StoreError::ObjectNotFound(self.id.clone()))?;
        let record = inv
            .versions
            .get(&version)
            .ok_or_else(|| StoreError::VersionNotFound {
                id: self.id.clone(),
                version,
            })?;
        let digest = record.get(path).ok_or_else(|| StoreError::FileNotFound {
            id: self.id.clone(),
            version,
            path: path.to_string(),
        })?;
        self.repo
            .read_content(digest)?
            .ok_or_else(|| StoreError::CorruptContent {
                digest: digest.to_hex(),
                reason: "content missing from store".into(),
            })
    }

    /// Run `f` against a fresh [`Transaction`] and commit everything it
    /// staged as one new version.
    ///
    /// If `f` returns `Err`, nothing is committed and the error is returned.
    /// If the backend fails while copying content, no version is created.
    pub fn transaction<F>(&self, message: &str, f: F) -> StoreResult<VersionId>
    where
        F: FnOnce(&mut Transaction) -> StoreResult<()>,
    {
        let mut tx = Transaction::new();
        if let Err(e) = f(&mut tx) {
            debug!(object = %self.id, error = %e, "transaction aborted before commit");
            return Err(e);
        }
        if tx.is_empty() {
            return Err(StoreError::EmptyTransaction(self.id.clone()));
        }
        let files = tx.len();
        let version = self.repo.commit_version(&self.id, tx.into_staged(message))?;
        info!(object = %self.id, %version, files, "committed version");
        Ok(version)
    }
}

impl fmt::Display for VersionedObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl fmt::Debug for VersionedObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedObject").field("id", &self.id).finish()
    }
}
