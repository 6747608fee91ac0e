//! File registry and resolution of declared file entities.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rocol_graph::{is_local_path, local_file_path, vocab, CrateGraph, FileIndex};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::SdkResult;

/// One file that will be imported into the object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path inside the object.
    pub target: String,
    /// Where the content is read from.
    pub source: PathBuf,
    /// Whether `source` was found to be a readable file.
    pub exists: bool,
}

/// Registered files, keyed by target path. One record per target.
#[derive(Clone, Debug, Default)]
pub struct FileRegistry {
    records: BTreeMap<String, FileRecord>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` at `target`, replacing any earlier record for the
    /// same target. Existence is established later, during resolution.
    ///
    /// Targets are keyed the way entity ids map to files, so `./a.txt` and
    /// `a.txt` are the same record.
    pub fn register(&mut self, source: impl Into<PathBuf>, target: impl AsRef<str>) {
        let target = local_file_path(target.as_ref());
        let record = FileRecord {
            target: target.clone(),
            source: source.into(),
            exists: false,
        };
        if self.records.insert(target.clone(), record).is_some() {
            debug!(%target, "replaced file registration");
        }
    }

    pub fn get(&self, target: &str) -> Option<&FileRecord> {
        self.records.get(target)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.records.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    /// Target to existence, for structural checks.
    pub fn index(&self) -> FileIndex {
        self.records
            .values()
            .map(|r| (r.target.clone(), r.exists))
            .collect()
    }
}

/// Directories searched, in order, for files the graph declares but nobody
/// registered.
#[derive(Clone, Debug, Default)]
pub struct FileResolver {
    pub data_dir: Option<PathBuf>,
    pub template_dir: Option<PathBuf>,
}

impl FileResolver {
    pub fn new(data_dir: Option<PathBuf>, template_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir,
            template_dir,
        }
    }

    /// Make sure every local `File` entity has a record, then stat every
    /// record.
    ///
    /// Files already present in the object's workspace (`staged`) need no
    /// record. URL and fragment ids are skipped. A missing source is not an
    /// error here: the record is marked as not existing and the structural
    /// checks report it.
    pub fn resolve_all(
        &self,
        graph: &mut CrateGraph,
        registry: &mut FileRegistry,
        staged: &FileIndex,
    ) {
        let mut entity_for_target = BTreeMap::new();
        for entity in graph.entities_of_type(vocab::FILE) {
            if is_local_path(entity.id()) {
                entity_for_target.insert(local_file_path(entity.id()), entity.id().to_string());
            }
        }

        for target in entity_for_target.keys() {
            if staged.contains_key(target) || registry.contains(target) {
                continue;
            }
            let source = self.locate(target);
            debug!(%target, source = %source.display(), "resolved undeclared file");
            registry.register(source, target.as_str());
        }

        for record in registry.records.values_mut() {
            match std::fs::metadata(&record.source) {
                Ok(meta) if meta.is_file() => {
                    record.exists = true;
                    let entity = entity_for_target
                        .get(&record.target)
                        .and_then(|id| graph.get_mut(id));
                    if let Some(mut entity) = entity {
                        entity.set(vocab::CONTENT_SIZE, vec![Value::String(meta.len().to_string())]);
                    }
                }
                _ => {
                    record.exists = false;
                    warn!(
                        target = %record.target,
                        source = %record.source.display(),
                        "missing input file"
                    );
                }
            }
        }
    }

    /// First candidate that exists, else the first candidate, else the
    /// target itself.
    fn locate(&self, target: &str) -> PathBuf {
        let candidates: Vec<PathBuf> = [&self.data_dir, &self.template_dir]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(target))
            .collect();
        candidates
            .iter()
            .find(|p| p.is_file())
            .or(candidates.first())
            .cloned()
            .unwrap_or_else(|| PathBuf::from(target))
    }
}

/// Every regular file below `dir`, keyed by `/`-separated relative path.
pub fn scan_workspace(dir: &Path) -> SdkResult<FileIndex> {
    let mut index = FileIndex::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop in workspace"))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        index.insert(key, true);
    }
    Ok(index)
}
