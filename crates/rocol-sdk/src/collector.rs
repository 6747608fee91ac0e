use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rocol_store::{FsRepository, Repository};
use tracing::{info, warn};

use crate::config::CollectorConfig;
use crate::error::SdkResult;
use crate::object::CollectionObject;
use crate::provenance::Provenance;

/// Shared configuration and repository handle for every object a collector
/// builds. Cloning is cheap.
#[derive(Clone)]
pub struct Collector {
    config: Arc<CollectorConfig>,
    repo: Arc<dyn Repository>,
    provenance: Arc<Provenance>,
}

impl Collector {
    /// Open the filesystem repository at `config.repo_path`, creating it if
    /// the path does not exist yet.
    pub fn connect(config: CollectorConfig, provenance: Provenance) -> SdkResult<Self> {
        Self::connect_at(config, provenance, false)
    }

    /// Like [`Collector::connect`] but against `config.repo_scratch`.
    pub fn connect_scratch(config: CollectorConfig, provenance: Provenance) -> SdkResult<Self> {
        Self::connect_at(config, provenance, true)
    }

    fn connect_at(config: CollectorConfig, provenance: Provenance, scratch: bool) -> SdkResult<Self> {
        let root = config.repository_root(scratch).to_path_buf();
        let repo = FsRepository::open_or_create(&root)?;
        info!(root = %root.display(), scratch, "connected to repository");
        Ok(Self::with_repository(config, provenance, Arc::new(repo)))
    }

    /// Use an already opened repository of any backend.
    pub fn with_repository(
        config: CollectorConfig,
        provenance: Provenance,
        repo: Arc<dyn Repository>,
    ) -> Self {
        if config.namespace.is_empty() {
            warn!("no namespace configured; minted identifiers will have an empty namespace");
        }
        if config.debug {
            info!("running in debug mode");
        }
        Self {
            config: Arc::new(config),
            repo,
            provenance: Arc::new(provenance),
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Start a new object, seeded from the crate in `crate_dir` when given.
    pub fn new_object(&self, crate_dir: Option<&Path>) -> SdkResult<CollectionObject> {
        CollectionObject::new(
            self.config.clone(),
            self.repo.clone(),
            self.provenance.clone(),
            crate_dir,
        )
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("namespace", &self.config.namespace)
            .field("repo_name", &self.config.repo_name)
            .finish()
    }
}
