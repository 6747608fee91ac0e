use std::path::{Path, PathBuf};

use rocol_graph::vocab;
use rocol_store::{Repository, StoreResult, VersionedObject};
use rocol_types::{ArcpId, VersionId};
use serde::Serialize;

use crate::files::FileRegistry;

/// Everything that goes into one committed version of an object.
///
/// Staging order: metadata, preview, the workspace tree at the object root,
/// registered files, then the caller's extra files. A later entry for the
/// same path replaces an earlier one.
pub struct CommitTransaction<'a> {
    pub object_id: &'a ArcpId,
    pub message: String,
    pub metadata: String,
    pub preview: String,
    pub workspace: Option<&'a Path>,
    pub records: &'a FileRegistry,
    /// Additional `(source, target)` pairs for this commit only.
    pub extras: &'a [(PathBuf, String)],
}

impl CommitTransaction<'_> {
    /// Run as one storage transaction. Returns the new version and the
    /// number of files it holds.
    pub fn run(self, repo: &dyn Repository) -> StoreResult<(VersionId, usize)> {
        let object = VersionedObject::open(repo, self.object_id.as_str());
        let mut staged = 0;
        let version = object.transaction(&self.message, |tx| {
            tx.write(vocab::METADATA_FILE, self.metadata.into_bytes())?;
            tx.write(vocab::PREVIEW_FILE, self.preview.into_bytes())?;
            if let Some(dir) = self.workspace {
                tx.import_dir(dir, "")?;
            }
            for record in self.records.iter() {
                tx.import_file(&record.source, &record.target)?;
            }
            for (source, target) in self.extras {
                tx.import_file(source, target)?;
            }
            staged = tx.len();
            Ok(())
        })?;
        Ok((version, staged))
    }
}

/// What `add_to_repo` hands back on success.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub object_id: ArcpId,
    pub version: VersionId,
    /// Number of files in the new version's staged set.
    pub files: usize,
}
