//! Structural consistency checks over a crate and its file index.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::entity::{is_local_path, local_file_path};
use crate::graph::CrateGraph;
use crate::vocab;

/// Known files in the object, keyed by target path, valued by existence.
pub type FileIndex = BTreeMap<String, bool>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
}

/// One entry of a validation report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    /// Check identifier, e.g. `fileExists`.
    pub id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl CheckResult {
    fn ok(id: &str, message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Ok,
            id: id.to_string(),
            message: message.into(),
            entity: None,
        }
    }

    fn error(id: &str, message: impl Into<String>, entity: Option<&str>) -> Self {
        Self {
            status: CheckStatus::Error,
            id: id.to_string(),
            message: message.into(),
            entity: entity.map(str::to_string),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == CheckStatus::Error
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.id, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, ": entity: {entity}")?;
        }
        Ok(())
    }
}

pub const ROOT_DATASET: &str = "rootDataset";
pub const METADATA_DESCRIPTOR: &str = "metadataDescriptor";
pub const FILE_EXISTS: &str = "fileExists";
pub const DATA_ENTITY_LINKED: &str = "dataEntityLinked";

/// Run every structural check. Each check contributes one `Ok` entry when it
/// finds nothing wrong, otherwise one `Error` entry per offending entity.
pub fn validate(graph: &CrateGraph, files: &FileIndex) -> Vec<CheckResult> {
    let mut results = Vec::new();
    check_root(graph, &mut results);
    check_descriptor(graph, &mut results);
    check_files(graph, files, &mut results);
    check_linked(graph, &mut results);
    results
}

fn check_root(graph: &CrateGraph, out: &mut Vec<CheckResult>) {
    if graph.root().has_type(vocab::DATASET) {
        out.push(CheckResult::ok(ROOT_DATASET, "root data entity is a Dataset"));
    } else {
        out.push(CheckResult::error(
            ROOT_DATASET,
            "root data entity must have type Dataset",
            Some(graph.root_id()),
        ));
    }
}

fn check_descriptor(graph: &CrateGraph, out: &mut Vec<CheckResult>) {
    let descriptor = graph.descriptor();
    let about = descriptor.references_in(vocab::ABOUT).next();
    if about != Some(graph.root_id()) {
        out.push(CheckResult::error(
            METADATA_DESCRIPTOR,
            "metadata descriptor must be about the root data entity",
            Some(descriptor.id()),
        ));
        return;
    }
    if descriptor.references_in(vocab::CONFORMS_TO).next().is_none() {
        out.push(CheckResult::error(
            METADATA_DESCRIPTOR,
            "metadata descriptor must declare conformsTo",
            Some(descriptor.id()),
        ));
        return;
    }
    out.push(CheckResult::ok(METADATA_DESCRIPTOR, "metadata descriptor is valid"));
}

fn local_files(graph: &CrateGraph) -> impl Iterator<Item = &str> {
    graph
        .entities_of_type(vocab::FILE)
        .map(|e| e.id())
        .filter(|id| is_local_path(id))
}

fn check_files(graph: &CrateGraph, files: &FileIndex, out: &mut Vec<CheckResult>) {
    let before = out.len();
    for id in local_files(graph) {
        let path = local_file_path(id);
        match files.get(&path) {
            Some(true) => {}
            Some(false) => out.push(CheckResult::error(
                FILE_EXISTS,
                format!("file {path} is registered but does not exist"),
                Some(id),
            )),
            None => out.push(CheckResult::error(
                FILE_EXISTS,
                format!("file {path} is not present in the crate"),
                Some(id),
            )),
        }
    }
    if out.len() == before {
        out.push(CheckResult::ok(FILE_EXISTS, "all data entities have files"));
    }
}

fn check_linked(graph: &CrateGraph, out: &mut Vec<CheckResult>) {
    let mut reachable = HashSet::new();
    let mut queue = VecDeque::from([graph.root_id().to_string()]);
    while let Some(id) = queue.pop_front() {
        if !reachable.insert(id.clone()) {
            continue;
        }
        if let Some(entity) = graph.get(&id) {
            for part in entity.references_in(vocab::HAS_PART) {
                queue.push_back(part.to_string());
            }
        }
    }

    let before = out.len();
    for id in local_files(graph) {
        if reachable.contains(id) {
            continue;
        }
        let linked_by_parent = graph
            .get(id)
            .map(|e| e.references_in(vocab::IS_PART_OF).any(|p| reachable.contains(p)))
            .unwrap_or(false);
        if !linked_by_parent {
            out.push(CheckResult::error(
                DATA_ENTITY_LINKED,
                "data entity is not linked to the root data entity via hasPart",
                Some(id),
            ));
        }
    }
    if out.len() == before {
        out.push(CheckResult::ok(DATA_ENTITY_LINKED, "all data entities are linked"));
    }
}
