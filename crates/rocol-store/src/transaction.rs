use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};

/// Content staged for one logical path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StagedContent {
    /// Bytes held in memory (rendered metadata, previews).
    Bytes(Vec<u8>),
    /// A file on disk, read when the transaction commits.
    File(PathBuf),
}

impl StagedContent {
    /// Materialize the content. Files are read at this point, so a source
    /// that vanished after staging fails the commit.
    pub fn read(&self) -> StoreResult<Vec<u8>> {
        match self {
            Self::Bytes(b) => Ok(b.clone()),
            Self::File(p) => std::fs::read(p).map_err(StoreError::from),
        }
    }
}

/// Everything a backend needs to append one version.
#[derive(Clone, Debug, Default)]
pub struct StagedVersion {
    pub message: String,
    pub entries: BTreeMap<String, StagedContent>,
}

/// Writer handed to a transaction closure.
///
/// Staged writes are applied in call order; a later write to the same
/// logical path replaces an earlier one.
#[derive(Debug, Default)]
pub struct Transaction {
    entries: BTreeMap<String, StagedContent>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage bytes at a logical path.
    pub fn write(&mut self, path: &str, bytes: impl Into<Vec<u8>>) -> StoreResult<()> {
        let path = normalize_logical_path(path)?;
        self.entries.insert(path, StagedContent::Bytes(bytes.into()));
        Ok(())
    }

    /// Stage a single file from the filesystem at a logical path.
    pub fn import_file(&mut self, source: &Path, target: &str) -> StoreResult<()> {
        if !source.is_file() {
            return Err(StoreError::SourceMissing(source.to_path_buf()));
        }
        let target = normalize_logical_path(target)?;
        debug!(source = %source.display(), %target, "staged file import");
        self.entries
            .insert(target, StagedContent::File(source.to_path_buf()));
        Ok(())
    }

    /// Stage every regular file below `source` under `target`. An empty
    /// target imports into the object root. Returns the number of files.
    pub fn import_dir(&mut self, source: &Path, target: &str) -> StoreResult<usize> {
        if !source.is_dir() {
            return Err(StoreError::SourceMissing(source.to_path_buf()));
        }
        let mut count = 0;
        for entry in WalkDir::new(source).follow_links(true) {
            let entry = entry.map_err(|e| match e.into_io_error() {
                Some(io) => StoreError::Io(io),
                None => StoreError::InvalidPath("filesystem loop during import".into()),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| StoreError::InvalidPath(e.to_string()))?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let logical = if target.is_empty() {
                relative
            } else {
                format!("{}/{relative}", target.trim_end_matches('/'))
            };
            let logical = normalize_logical_path(&logical)?;
            self.entries
                .insert(logical, StagedContent::File(entry.path().to_path_buf()));
            count += 1;
        }
        debug!(source = %source.display(), count, "staged directory import");
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub(crate) fn into_staged(self, message: impl Into<String>) -> StagedVersion {
        StagedVersion {
            message: message.into(),
            entries: self.entries,
        }
    }
}

/// Validate a logical path: relative, `/`-separated, no `.` or `..`
/// segments, no empty segments.
pub fn normalize_logical_path(path: &str) -> StoreResult<String> {
    let trimmed = path.trim_start_matches("./");
    if trimmed.is_empty() || trimmed.starts_with('/') {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    for component in Path::new(trimmed).components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
    }
    if trimmed.split('/').any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(trimmed.to_string())
}
