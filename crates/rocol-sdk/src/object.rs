use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rocol_gate::{GateContext, ValidationGate};
use rocol_graph::{local_file_path, reference, render_preview, vocab, CrateGraph, Entity};
use rocol_store::{normalize_logical_path, Repository};
use rocol_types::{ArcpId, PathSegments};
use serde_json::Value;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::commit::{CommitReceipt, CommitTransaction};
use crate::config::CollectorConfig;
use crate::error::{SdkError, SdkResult};
use crate::files::{scan_workspace, FileRegistry, FileResolver};
use crate::provenance::Provenance;

/// Where an object is in its life.
///
/// `Building -> Validating -> Committing -> Done | Failed`. `Done` and
/// `Failed` are terminal and the workspace is gone in both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectState {
    Building,
    Validating,
    Committing,
    Done,
    Failed,
}

impl ObjectState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for ObjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Building => "building",
            Self::Validating => "validating",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Where [`CollectionObject::add_file`] reads a file from.
#[derive(Clone, Debug, Default)]
pub enum FileSource {
    /// `<data_dir>/<entity id>`.
    #[default]
    DataDir,
    /// `<dir>/<entity id>`.
    Dir(PathBuf),
    /// Exactly this path.
    Path(PathBuf),
}

/// Graph entity to create for an imported file.
#[derive(Clone, Debug, Default)]
pub struct FileEntity {
    /// Entity the file is part of. The root dataset when `None`.
    pub parent: Option<String>,
    /// Extra properties, e.g. `name` or `encodingFormat`.
    pub props: serde_json::Map<String, Value>,
}

/// One object under construction: a crate graph, the files registered for
/// it, and a private scratch workspace.
pub struct CollectionObject {
    config: Arc<CollectorConfig>,
    repo: Arc<dyn Repository>,
    provenance: Arc<Provenance>,
    graph: CrateGraph,
    files: FileRegistry,
    id: Option<ArcpId>,
    workspace: Option<TempDir>,
    state: ObjectState,
}

impl CollectionObject {
    pub(crate) fn new(
        config: Arc<CollectorConfig>,
        repo: Arc<dyn Repository>,
        provenance: Arc<Provenance>,
        crate_dir: Option<&Path>,
    ) -> SdkResult<Self> {
        let mut graph = match crate_dir {
            Some(dir) => {
                debug!(crate_dir = %dir.display(), "loading template crate");
                CrateGraph::from_dir(dir)?
            }
            None => CrateGraph::new(),
        };
        if let Some(name) = &config.collection_name {
            let mut root = graph.root_mut();
            if !root.has(vocab::NAME) {
                root.set(vocab::NAME, vec![Value::String(name.clone())]);
            }
        }

        std::fs::create_dir_all(&config.temp_path)?;
        let workspace = tempfile::Builder::new()
            .prefix("rocol-")
            .tempdir_in(&config.temp_path)?;
        debug!(workspace = %workspace.path().display(), "created scratch workspace");

        Ok(Self {
            config,
            repo,
            provenance,
            graph,
            files: FileRegistry::new(),
            id: None,
            workspace: Some(workspace),
            state: ObjectState::Building,
        })
    }

    pub fn id(&self) -> Option<&ArcpId> {
        self.id.as_ref()
    }

    pub fn state(&self) -> ObjectState {
        self.state
    }

    pub fn graph(&self) -> &CrateGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut CrateGraph {
        &mut self.graph
    }

    pub fn files(&self) -> &FileRegistry {
        &self.files
    }

    /// The scratch workspace; `None` once the object has finished.
    pub fn workspace_path(&self) -> Option<&Path> {
        self.workspace.as_ref().map(TempDir::path)
    }

    /// Mint this object's identifier under the collector's namespace and
    /// make it the root dataset's `@id`. `id` is appended as a final
    /// disambiguating segment.
    pub fn mint_arcp_id(
        &mut self,
        segments: impl Into<PathSegments>,
        id: Option<&str>,
    ) -> SdkResult<ArcpId> {
        self.require_building()?;
        let mut segments = segments.into();
        if let Some(id) = id {
            segments = segments.with_id(id);
        }
        let arcp = ArcpId::mint(&self.config.namespace, segments);
        self.graph.set_root_id(arcp.as_str())?;
        debug!(id = %arcp, "minted identifier");
        self.id = Some(arcp.clone());
        Ok(arcp)
    }

    /// Register `source` to be imported at `target`. With `entity`, also
    /// declare a `File` entity at `target` linked from its parent.
    ///
    /// Registering the same target again replaces the earlier source.
    pub fn import_file(
        &mut self,
        source: impl Into<PathBuf>,
        target: &str,
        entity: Option<FileEntity>,
    ) -> SdkResult<()> {
        self.require_building()?;
        let key = checked_target(&local_file_path(target))?;
        self.files.register(source, key);
        if let Some(declared) = entity {
            let mut file = Entity::new(target).with_type(vocab::FILE);
            for (prop, value) in declared.props {
                file.push_unique(&prop, value);
            }
            match declared.parent {
                Some(parent) => {
                    if !self.graph.contains(&parent) {
                        return Err(rocol_graph::GraphError::EntityNotFound(parent).into());
                    }
                    file.push_unique(vocab::IS_PART_OF, reference(&parent));
                    self.graph.push_entity(&parent, vocab::HAS_PART, file)?;
                }
                None => {
                    let root = self.graph.root_id().to_string();
                    self.graph.push_entity(&root, vocab::HAS_PART, file)?;
                }
            }
        }
        Ok(())
    }

    /// Copy a file into the workspace and add `entity` to the graph, linked
    /// from the root's `hasPart` when `link_to_root` is set.
    ///
    /// A missing source is logged and skipped; structural validation
    /// reports it at commit time. Returns whether the file was copied.
    pub fn add_file(
        &mut self,
        entity: Entity,
        source: FileSource,
        link_to_root: bool,
    ) -> SdkResult<bool> {
        self.require_building()?;
        let relative = checked_target(&local_file_path(entity.id()))?;
        let src = match source {
            FileSource::Path(p) => p,
            FileSource::Dir(dir) => dir.join(&relative),
            FileSource::DataDir => match &self.config.data_dir {
                Some(dir) => dir.join(&relative),
                None => PathBuf::from(&relative),
            },
        };

        let id = entity.id().to_string();
        if link_to_root {
            let root = self.graph.root_id().to_string();
            self.graph.push_entity(&root, vocab::HAS_PART, entity)?;
        } else {
            self.graph.add_entity(entity);
        }

        if !src.is_file() {
            warn!(source = %src.display(), "missing file");
            return Ok(false);
        }
        let dest = self.workspace_dir()?.join(&relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let size = std::fs::copy(&src, &dest)?;
        if let Some(mut e) = self.graph.get_mut(&id) {
            e.set(vocab::CONTENT_SIZE, vec![Value::String(size.to_string())]);
        }
        debug!(source = %src.display(), dest = %dest.display(), "copied file");
        Ok(true)
    }

    /// Write `data` into the workspace at the entity's path and link the
    /// entity from the root's `hasPart`.
    pub fn write_file(&mut self, entity: Entity, data: impl AsRef<[u8]>) -> SdkResult<()> {
        self.require_building()?;
        let relative = checked_target(&local_file_path(entity.id()))?;
        let dest = self.workspace_dir()?.join(&relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&dest, data)?;
        let root = self.graph.root_id().to_string();
        self.graph.push_entity(&root, vocab::HAS_PART, entity)?;
        Ok(())
    }

    /// Validate the object and commit it as a new version.
    ///
    /// `extra_files` are `(source, target)` pairs imported in this commit
    /// only. The scratch workspace is deleted whatever the outcome; a failed
    /// object cannot be retried.
    pub async fn add_to_repo(&mut self, extra_files: &[(PathBuf, String)]) -> SdkResult<CommitReceipt> {
        if self.state.is_terminal() {
            return Err(SdkError::InvalidState(self.state));
        }
        let id = self.id.clone().ok_or(SdkError::MissingIdentifier)?;

        self.state = ObjectState::Validating;
        let result = self.validate_and_commit(&id, extra_files).await;
        self.remove_workspace();

        match &result {
            Ok(receipt) => {
                self.state = ObjectState::Done;
                info!(object = %id, version = %receipt.version, files = receipt.files, "wrote crate");
            }
            Err(e) => {
                self.state = ObjectState::Failed;
                warn!(object = %id, error = %e, "object was not added to the repository");
            }
        }
        result
    }

    async fn validate_and_commit(
        &mut self,
        id: &ArcpId,
        extra_files: &[(PathBuf, String)],
    ) -> SdkResult<CommitReceipt> {
        let repo_name = self.config.repo_name.clone();
        let local_id = self.graph.add_identifier(&repo_name, id.as_str());
        let attached = self
            .graph
            .descriptor()
            .references_in(vocab::IDENTIFIER)
            .any(|r| r == local_id);
        if !attached || !self.graph.contains(&local_id) {
            return Err(SdkError::IdentifierAssertion(local_id));
        }
        for entity in self.provenance.entities() {
            self.graph.add_entity(entity.clone());
        }

        let workspace = self.workspace_dir()?.to_path_buf();
        let staged = scan_workspace(&workspace)?;
        let resolver = FileResolver::new(
            self.config.data_dir.clone(),
            self.config.template_dir.clone(),
        );
        resolver.resolve_all(&mut self.graph, &mut self.files, &staged);

        let mut index = staged;
        index.extend(self.files.index());
        let gate = ValidationGate::with_default_stages(self.config.gate_config());
        let report = gate
            .evaluate(&GateContext::new(id.as_str(), &self.graph, &index))
            .await?;
        debug!(object = %id, stages = report.stage_results.len(), elapsed = ?report.elapsed, "crate validated");

        self.state = ObjectState::Committing;
        let metadata = self.graph.to_json_pretty()?;
        let preview = render_preview(&self.graph);
        let (version, files) = CommitTransaction {
            object_id: id,
            message: format!("rocol: add {id}"),
            metadata,
            preview,
            workspace: Some(&workspace),
            records: &self.files,
            extras: extra_files,
        }
        .run(self.repo.as_ref())?;

        Ok(CommitReceipt {
            object_id: id.clone(),
            version,
            files,
        })
    }

    fn require_building(&self) -> SdkResult<()> {
        if self.state == ObjectState::Building {
            Ok(())
        } else {
            Err(SdkError::InvalidState(self.state))
        }
    }

    fn workspace_dir(&self) -> SdkResult<&Path> {
        self.workspace_path()
            .ok_or(SdkError::InvalidState(self.state))
    }

    fn remove_workspace(&mut self) {
        let Some(dir) = self.workspace.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => info!(workspace = %path.display(), "deleted scratch workspace"),
            Err(e) => warn!(workspace = %path.display(), error = %e, "could not delete scratch workspace"),
        }
    }
}

impl fmt::Debug for CollectionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionObject")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("files", &self.files.len())
            .finish()
    }
}

/// Normalized workspace-relative target. Absolute paths, `..` segments and
/// the files the commit writes itself are refused.
fn checked_target(target: &str) -> SdkResult<String> {
    let t = normalize_logical_path(target)
        .map_err(|_| SdkError::InvalidTarget(target.to_string()))?;
    if t == vocab::METADATA_FILE || t == vocab::PREVIEW_FILE {
        return Err(SdkError::InvalidTarget(target.to_string()));
    }
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Collector;
    use crate::provenance::ProvenanceConfig;
    use rocol_gate::{GateError, ValidatorSetting};
    use rocol_store::{InMemoryRepository, VersionedObject};
    use rocol_types::VersionId;
    use serde_json::json;

    struct Fixture {
        _root: tempfile::TempDir,
        data: PathBuf,
        template: PathBuf,
        temp: PathBuf,
        repo: Arc<InMemoryRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let data = root.path().join("data");
            let template = root.path().join("template");
            let temp = root.path().join("temp");
            std::fs::create_dir_all(&data).unwrap();
            std::fs::create_dir_all(&template).unwrap();
            Self {
                data,
                template,
                temp,
                repo: Arc::new(InMemoryRepository::new()),
                _root: root,
            }
        }

        fn config(&self) -> CollectorConfig {
            CollectorConfig {
                namespace: "ns".into(),
                temp_path: self.temp.clone(),
                data_dir: Some(self.data.clone()),
                template_dir: Some(self.template.clone()),
                ..Default::default()
            }
        }

        fn collector_with(&self, config: CollectorConfig) -> Collector {
            let prov = Provenance::new(&ProvenanceConfig {
                name: Some("test collector".into()),
                description: Some("builds test crates".into()),
                repository_url: Some("https://example.org/test-collector".into()),
                inputs: Some(json!({"@id": "contents.xlsx"})),
            })
            .unwrap();
            Collector::with_repository(config, prov, self.repo.clone())
        }

        fn collector(&self) -> Collector {
            self.collector_with(self.config())
        }

        fn write_template(&self, graph: &CrateGraph) {
            std::fs::write(
                self.template.join("ro-crate-metadata.json"),
                graph.to_json_pretty().unwrap(),
            )
            .unwrap();
        }

        fn versions(&self, id: &ArcpId) -> Vec<VersionId> {
            VersionedObject::open(self.repo.as_ref(), id.as_str())
                .versions()
                .unwrap()
        }
    }

    fn template_with_files(ids: &[&str]) -> CrateGraph {
        let mut g = CrateGraph::new();
        g.root_mut().set("name", vec![json!("Demo")]);
        let root = g.root_id().to_string();
        for id in ids {
            g.push_entity(&root, "hasPart", Entity::new(*id).with_type("File"))
                .unwrap();
        }
        g
    }

    #[tokio::test]
    async fn builds_and_commits_from_template() {
        let fx = Fixture::new();
        fx.write_template(&template_with_files(&["a.txt", "b.txt"]));
        std::fs::write(fx.data.join("a.txt"), b"from data").unwrap();
        std::fs::write(fx.template.join("b.txt"), b"from template").unwrap();

        let collector = fx.collector();
        let mut obj = collector.new_object(Some(&fx.template)).unwrap();
        let id = obj.mint_arcp_id(["corpus", "item"], Some("1")).unwrap();
        assert_eq!(id.as_str(), "arcp://name,ns/corpus/item/1");
        let workspace = obj.workspace_path().unwrap().to_path_buf();

        let receipt = obj.add_to_repo(&[]).await.unwrap();
        assert_eq!(receipt.version, VersionId::FIRST);
        assert_eq!(obj.state(), ObjectState::Done);
        assert!(!workspace.exists());
        assert!(obj.workspace_path().is_none());

        let stored = VersionedObject::open(fx.repo.as_ref(), id.as_str());
        assert_eq!(stored.read_file(None, "a.txt").unwrap(), b"from data");
        assert_eq!(stored.read_file(None, "b.txt").unwrap(), b"from template");
        assert!(stored.read_file(None, "ro-crate-preview.html").is_ok());

        let meta: Value =
            serde_json::from_slice(&stored.read_file(None, "ro-crate-metadata.json").unwrap())
                .unwrap();
        let graph = CrateGraph::from_json(&meta).unwrap();
        assert_eq!(graph.root_id(), id.as_str());
        assert_eq!(graph.descriptor().references_in("about").next(), Some(id.as_str()));
        assert_eq!(
            graph.descriptor().references_in("identifier").next(),
            Some(format!("_:local-id:repository:{id}").as_str())
        );
        assert!(graph.get("#provenance").is_some());
        assert!(graph.get("https://example.org/test-collector").is_some());
        assert_eq!(graph.get("a.txt").unwrap().first_str("contentSize"), Some("9"));
    }

    #[tokio::test]
    async fn missing_file_fails_structural_check_and_cleans_up() {
        let fx = Fixture::new();
        fx.write_template(&template_with_files(&["gone.wav"]));
        let mut obj = fx.collector().new_object(Some(&fx.template)).unwrap();
        let id = obj.mint_arcp_id("item", None).unwrap();
        let workspace = obj.workspace_path().unwrap().to_path_buf();

        let err = obj.add_to_repo(&[]).await.unwrap_err();
        match err {
            SdkError::Validation(GateError::GraphLink { messages, .. }) => {
                assert_eq!(messages.len(), 1);
                assert!(messages[0].contains("fileExists"));
                assert!(messages[0].ends_with("entity: gone.wav"));
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(obj.state(), ObjectState::Failed);
        assert!(!workspace.exists());
        assert!(fx.versions(&id).is_empty());
    }

    #[tokio::test]
    async fn failed_import_leaves_no_new_version() {
        let fx = Fixture::new();
        let collector = fx.collector();

        let mut first = collector.new_object(None).unwrap();
        let id = first.mint_arcp_id("item", None).unwrap();
        first.add_to_repo(&[]).await.unwrap();
        let before = fx.versions(&id);

        let mut second = collector.new_object(None).unwrap();
        second.mint_arcp_id("item", None).unwrap();
        second
            .write_file(Entity::new("notes.txt").with_type("File"), b"notes")
            .unwrap();
        let extras = vec![(fx.data.join("not-there.csv"), "extra.csv".to_string())];
        let err = second.add_to_repo(&extras).await.unwrap_err();

        assert!(matches!(err, SdkError::Commit(_)));
        assert_eq!(fx.versions(&id), before);
        assert_eq!(second.state(), ObjectState::Failed);
    }

    #[tokio::test]
    async fn second_commit_creates_new_version() {
        let fx = Fixture::new();
        let collector = fx.collector();
        for expected in [1, 2] {
            let mut obj = collector.new_object(None).unwrap();
            obj.mint_arcp_id("item", None).unwrap();
            let receipt = obj.add_to_repo(&[]).await.unwrap();
            assert_eq!(receipt.version, VersionId::new(expected).unwrap());
        }
    }

    #[tokio::test]
    async fn terminal_objects_refuse_work() {
        let fx = Fixture::new();
        let mut obj = fx.collector().new_object(None).unwrap();
        obj.mint_arcp_id("item", None).unwrap();
        obj.add_to_repo(&[]).await.unwrap();

        assert!(matches!(
            obj.add_to_repo(&[]).await.unwrap_err(),
            SdkError::InvalidState(ObjectState::Done)
        ));
        assert!(matches!(
            obj.write_file(Entity::new("x.txt"), b"x").unwrap_err(),
            SdkError::InvalidState(_)
        ));
    }

    #[tokio::test]
    async fn add_to_repo_requires_identifier() {
        let fx = Fixture::new();
        let mut obj = fx.collector().new_object(None).unwrap();
        assert!(matches!(
            obj.add_to_repo(&[]).await.unwrap_err(),
            SdkError::MissingIdentifier
        ));
        assert_eq!(obj.state(), ObjectState::Building);
    }

    #[tokio::test]
    async fn add_file_copies_into_workspace() {
        let fx = Fixture::new();
        std::fs::create_dir_all(fx.data.join("Sound files")).unwrap();
        std::fs::write(fx.data.join("Sound files/a.wav"), b"wave").unwrap();
        let mut obj = fx.collector().new_object(None).unwrap();
        let id = obj.mint_arcp_id("item", None).unwrap();

        let copied = obj
            .add_file(
                Entity::new("Sound%20files/a.wav").with_type("File"),
                FileSource::DataDir,
                true,
            )
            .unwrap();
        assert!(copied);
        assert!(obj
            .workspace_path()
            .unwrap()
            .join("Sound files/a.wav")
            .is_file());
        let missing = obj
            .add_file(Entity::new("b.wav").with_type("File"), FileSource::DataDir, true)
            .unwrap();
        assert!(!missing);

        // b.wav is declared but absent, so the commit is refused
        assert!(obj.add_to_repo(&[]).await.is_err());
        assert!(fx.versions(&id).is_empty());
    }

    #[tokio::test]
    async fn import_file_links_under_parent() {
        let fx = Fixture::new();
        let src = fx.data.join("rec.wav");
        std::fs::write(&src, b"rec").unwrap();
        let mut obj = fx.collector().new_object(None).unwrap();
        let id = obj.mint_arcp_id("item", None).unwrap();
        let root = obj.graph().root_id().to_string();
        obj.graph_mut()
            .push_entity(&root, "hasPart", Entity::new("audio/").with_type("Dataset"))
            .unwrap();

        let entity = FileEntity {
            parent: Some("audio/".into()),
            props: serde_json::Map::from_iter([("name".to_string(), json!("Recording"))]),
        };
        obj.import_file(&src, "audio/rec.wav", Some(entity.clone())).unwrap();
        obj.import_file(&src, "audio/rec.wav", Some(entity)).unwrap();

        assert_eq!(obj.files().len(), 1);
        let file = obj.graph().get("audio/rec.wav").unwrap();
        assert_eq!(file.references_in("isPartOf").next(), Some("audio/"));
        assert_eq!(obj.graph().get("audio/").unwrap().get("hasPart").len(), 1);

        let receipt = obj.add_to_repo(&[]).await.unwrap();
        let stored = VersionedObject::open(fx.repo.as_ref(), id.as_str());
        assert_eq!(stored.read_file(Some(receipt.version), "audio/rec.wav").unwrap(), b"rec");
    }

    #[tokio::test]
    async fn expectation_mismatch_is_reported() {
        let fx = Fixture::new();
        let checks = fx.data.join("checks");
        std::fs::create_dir_all(&checks).unwrap();
        std::fs::write(checks.join("types.csv"), "crate,type,count\nall,File,3\n").unwrap();
        std::fs::write(
            checks.join("properties.csv"),
            "entity,property,count,value\n./,name,,Demo\n",
        )
        .unwrap();
        fx.write_template(&template_with_files(&["a.txt", "b.txt"]));
        std::fs::write(fx.data.join("a.txt"), b"a").unwrap();
        std::fs::write(fx.data.join("b.txt"), b"b").unwrap();

        let config = CollectorConfig {
            validate_with_excel: ValidatorSetting::Location(checks.to_string_lossy().into_owned()),
            ..fx.config()
        };
        let mut obj = fx.collector_with(config).new_object(Some(&fx.template)).unwrap();
        let id = obj.mint_arcp_id("item", None).unwrap();
        let err = obj.add_to_repo(&[]).await.unwrap_err();
        match err {
            SdkError::Validation(GateError::ExpectationMismatch { messages, .. }) => {
                assert_eq!(
                    messages,
                    vec!["[validation] Entities File expected count is 3 but actual is 2".to_string()]
                );
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(fx.versions(&id).is_empty());
    }

    #[test]
    fn reserved_targets_are_rejected() {
        let fx = Fixture::new();
        let mut obj = fx.collector().new_object(None).unwrap();
        assert!(matches!(
            obj.write_file(Entity::new("ro-crate-metadata.json"), b"{}"),
            Err(SdkError::InvalidTarget(_))
        ));
        assert!(matches!(
            obj.import_file("/x", "./ro-crate-preview.html", None),
            Err(SdkError::InvalidTarget(_))
        ));
    }

    #[tokio::test]
    async fn writes_cannot_leave_the_workspace() {
        let fx = Fixture::new();
        let outside = tempfile::tempdir().unwrap();
        let absolute = outside.path().join("outside.txt");
        let mut obj = fx.collector().new_object(None).unwrap();
        obj.mint_arcp_id("item", None).unwrap();

        let escaping = [
            absolute.to_string_lossy().into_owned(),
            "../outside.txt".to_string(),
            "a/../../outside.txt".to_string(),
        ];
        for id in &escaping {
            assert!(matches!(
                obj.write_file(Entity::new(id.as_str()).with_type("File"), b"leak"),
                Err(SdkError::InvalidTarget(_))
            ));
            assert!(matches!(
                obj.add_file(
                    Entity::new(id.as_str()).with_type("File"),
                    FileSource::Path(fx.data.join("any.txt")),
                    true
                ),
                Err(SdkError::InvalidTarget(_))
            ));
            assert!(matches!(
                obj.import_file(fx.data.join("any.txt"), id, None),
                Err(SdkError::InvalidTarget(_))
            ));
        }
        let workspace = obj.workspace_path().unwrap().to_path_buf();
        assert!(!absolute.exists());
        assert!(!workspace.parent().unwrap().join("outside.txt").exists());

        obj.add_to_repo(&[]).await.unwrap();
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn dot_slash_and_encoded_targets_commit() {
        let fx = Fixture::new();
        let src = fx.data.join("src.txt");
        std::fs::write(&src, b"source").unwrap();
        let mut obj = fx.collector().new_object(None).unwrap();
        let id = obj.mint_arcp_id("item", None).unwrap();

        obj.import_file(&src, "./a.txt", Some(FileEntity::default())).unwrap();
        obj.import_file(&src, "Sound%20files/b.txt", Some(FileEntity::default()))
            .unwrap();
        assert_eq!(obj.files().len(), 2);
        assert!(obj.files().contains("a.txt"));
        assert!(obj.files().contains("Sound files/b.txt"));

        let receipt = obj.add_to_repo(&[]).await.unwrap();
        let stored = VersionedObject::open(fx.repo.as_ref(), id.as_str());
        assert_eq!(stored.read_file(Some(receipt.version), "a.txt").unwrap(), b"source");
        assert_eq!(
            stored.read_file(Some(receipt.version), "Sound files/b.txt").unwrap(),
            b"source"
        );
    }

    #[test]
    fn collection_name_fills_missing_root_name() {
        let fx = Fixture::new();
        let config = CollectorConfig {
            collection_name: Some("My Corpus".into()),
            ..fx.config()
        };
        let obj = fx.collector_with(config).new_object(None).unwrap();
        assert_eq!(obj.graph().root().first_str("name"), Some("My Corpus"));
    }

    #[test]
    fn minting_is_deterministic_across_objects() {
        let fx = Fixture::new();
        let collector = fx.collector();
        let a = collector.new_object(None).unwrap().mint_arcp_id(["a", "b"], None).unwrap();
        let b = collector.new_object(None).unwrap().mint_arcp_id(["a", "b"], None).unwrap();
        let c = collector
            .new_object(None)
            .unwrap()
            .mint_arcp_id(["a", "b"], Some("x"))
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
