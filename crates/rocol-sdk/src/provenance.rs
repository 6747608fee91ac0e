use rocol_graph::{vocab, Entity};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{SdkError, SdkResult};

/// Id of the creation action added to every crate.
pub const PROVENANCE_ID: &str = "#provenance";

/// Describes the program that builds the crates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Source repository of the program; doubles as the tool's `@id`.
    pub repository_url: Option<String>,
    /// The `object` of the creation action, e.g. `{"@id": "contents.xlsx"}`.
    pub inputs: Option<Value>,
}

/// Tool and creation-action entities, built once per collector and copied
/// into every crate it produces.
#[derive(Clone, Debug)]
pub struct Provenance {
    entities: Vec<Entity>,
}

impl Provenance {
    pub fn new(config: &ProvenanceConfig) -> SdkResult<Self> {
        let url = config.repository_url.as_deref().ok_or_else(|| {
            SdkError::Provenance("a repository URL is required".into())
        })?;
        let description = config
            .description
            .as_deref()
            .ok_or_else(|| SdkError::Provenance("a description is required".into()))?;
        let name = config.name.as_deref().unwrap_or(url);

        let tool = Entity::new(url)
            .with_type("SoftwareSourceCode")
            .with(vocab::NAME, name)
            .with(vocab::DESCRIPTION, description)
            .with("codeRepository", url)
            .with("programmingLanguage", "Rust");

        let mut action = json!({
            "@id": PROVENANCE_ID,
            "@type": "CreateAction",
            "name": format!("Create RO-Crate using {name}"),
            "instrument": {"@id": url},
            "result": {"@id": vocab::METADATA_FILE},
        });
        if let (Some(inputs), Some(obj)) = (&config.inputs, action.as_object_mut()) {
            obj.insert("object".into(), inputs.clone());
        }
        let (action, nested) = Entity::from_json(&action)?;

        let mut entities = vec![tool, action];
        entities.extend(nested);
        Ok(Self { entities })
    }

    /// The `SoftwareSourceCode` entity.
    pub fn tool(&self) -> &Entity {
        &self.entities[0]
    }

    /// The `#provenance` `CreateAction` entity.
    pub fn create_action(&self) -> &Entity {
        &self.entities[1]
    }

    /// Every entity to add to a crate, including embedded inputs.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}
