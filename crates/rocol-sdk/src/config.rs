use std::path::{Path, PathBuf};

use rocol_gate::{GateConfig, ValidatorSetting};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{SdkError, SdkResult};
use crate::provenance::ProvenanceConfig;

/// Process-wide collector settings. Every field has a default, so a config
/// file only needs to name what it changes.
///
/// ```toml
/// namespace = "sydney-speaks"
/// data_dir = "data"
/// template_dir = "template"
/// validate_with_mode = true
///
/// [provenance]
/// description = "Builds the Sydney Speaks corpus"
/// repository_url = "https://github.com/example/sydney-speaks-collector"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Root of the versioned repository.
    pub repo_path: PathBuf,
    /// Name under which objects are identified in the repository.
    pub repo_name: String,
    /// Root of a scratch repository for trial runs.
    pub repo_scratch: PathBuf,
    /// Namespace of minted `arcp://name,<namespace>/...` identifiers.
    pub namespace: String,
    /// Root dataset name, used when the template crate has none.
    pub collection_name: Option<String>,
    /// Parent directory of per-object scratch workspaces.
    pub temp_path: PathBuf,
    /// Crate directory whose metadata seeds new objects. Also the second
    /// place file sources are looked up.
    pub template_dir: Option<PathBuf>,
    /// First place file sources are looked up.
    pub data_dir: Option<PathBuf>,
    /// Input workbook; names the default provenance input.
    pub excel: Option<PathBuf>,
    pub validate_with_excel: ValidatorSetting,
    pub validate_with_mode: ValidatorSetting,
    pub debug: bool,
    /// Build one object per identifier instead of a single object.
    pub multiple: bool,
    pub provenance: ProvenanceConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("../repo"),
            repo_name: "repository".into(),
            repo_scratch: PathBuf::from("../scratch"),
            namespace: String::new(),
            collection_name: None,
            temp_path: PathBuf::from("./temp"),
            template_dir: None,
            data_dir: None,
            excel: None,
            validate_with_excel: ValidatorSetting::Disabled,
            validate_with_mode: ValidatorSetting::Disabled,
            debug: false,
            multiple: false,
            provenance: ProvenanceConfig::default(),
        }
    }
}

impl CollectorConfig {
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            expectations: self.validate_with_excel.clone(),
            mode: self.validate_with_mode.clone(),
        }
    }

    /// Repository root: the scratch repository when `scratch` is set.
    pub fn repository_root(&self, scratch: bool) -> &Path {
        if scratch {
            &self.repo_scratch
        } else {
            &self.repo_path
        }
    }

    /// Provenance settings with `inputs` defaulted to the input workbook.
    pub fn resolved_provenance(&self) -> ProvenanceConfig {
        let mut prov = self.provenance.clone();
        if prov.inputs.is_none() {
            prov.inputs = self.default_inputs();
        }
        prov
    }

    fn default_inputs(&self) -> Option<Value> {
        let name = self.excel.as_ref()?.file_name()?.to_string_lossy().into_owned();
        Some(json!({ "@id": name }))
    }
}
