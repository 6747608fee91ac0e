//! Mode definition checks.
//!
//! A mode lists, per entity type, the properties ("inputs") an entity of that
//! type may or must carry. Loading follows a two-step policy: fetch the
//! location over HTTP; if that cannot be attempted or fails in transport,
//! read it as a local file. A fetch answered with a non-success status
//! yields no mode and the check is skipped.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use rocol_graph::{as_reference, CrateGraph, Entity};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{GateError, GateResult};
use crate::stage::{GateContext, GateStage, StageDecision};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Input types whose values are literals rather than entity references.
const LITERAL_TYPES: &[&str] = &[
    "Text", "TextArea", "Date", "DateTime", "Time", "Number", "Integer", "Float", "Boolean",
    "URL", "Select", "Value",
];

/// Wildcard input type: any referenced entity is acceptable.
const ANY_TYPE: &str = "Any";

// ---------------------------------------------------------------------------
// Mode model
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModeDefinition {
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub classes: BTreeMap<String, ModeClass>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModeClass {
    #[serde(default)]
    pub inputs: Vec<ModeInput>,
}

/// One property allowed on a class.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModeInput {
    /// Full property IRI.
    pub id: String,
    /// Compact property name as used in the crate.
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_multiple")]
    pub multiple: bool,
    #[serde(rename = "type", default, deserialize_with = "one_or_many")]
    pub types: Vec<String>,
}

fn default_multiple() -> bool {
    true
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(d)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

impl ModeInput {
    /// Declared types that denote entities.
    fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.types
            .iter()
            .map(String::as_str)
            .filter(|t| !LITERAL_TYPES.contains(t))
    }
}

/// One problem found on one property of one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeFinding {
    pub entity: String,
    pub property: String,
    pub description: String,
}

impl ModeFinding {
    pub fn message(&self) -> String {
        format!(
            "[validation][mode][{}][{}] {}",
            self.entity, self.property, self.description
        )
    }
}

// ---------------------------------------------------------------------------
// Checking
// ---------------------------------------------------------------------------

/// Check every entity of `graph` against the classes of `mode` it belongs to.
pub fn check_mode(mode: &ModeDefinition, graph: &CrateGraph) -> Vec<ModeFinding> {
    let mut findings = Vec::new();
    for entity in graph.entities() {
        for ty in entity.types() {
            let Some(class) = mode.classes.get(ty) else {
                continue;
            };
            for input in &class.inputs {
                check_input(graph, entity, input, &mut findings);
            }
        }
    }
    findings
}

fn check_input(graph: &CrateGraph, entity: &Entity, input: &ModeInput, out: &mut Vec<ModeFinding>) {
    let values = if entity.has(&input.name) {
        entity.get(&input.name)
    } else {
        entity.get(&input.id)
    };
    let mut push = |description: String| {
        out.push(ModeFinding {
            entity: entity.id().to_string(),
            property: input.name.clone(),
            description,
        })
    };

    if values.is_empty() {
        if input.required {
            push(format!(
                "Missing required property {} of type {}",
                input.name,
                input.types.join(", ")
            ));
        }
        return;
    }
    if !input.multiple && values.len() > 1 {
        push(format!(
            "Property {} allows a single value but has {}",
            input.name,
            values.len()
        ));
    }

    let allowed: Vec<&str> = input.entity_types().collect();
    if allowed.is_empty() || allowed.contains(&ANY_TYPE) {
        return;
    }
    for target in values.iter().filter_map(as_reference) {
        // External references cannot be checked.
        let Some(referenced) = graph.get(target) else {
            continue;
        };
        if !referenced.types().iter().any(|t| allowed.contains(&t.as_str())) {
            push(format!(
                "Referenced entity {target} has type {} but expected one of {}",
                referenced.types().join(", "),
                allowed.join(", ")
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a mode definition from a URL or a local path.
///
/// Returns `Ok(None)` when the server answered with a non-success status.
pub async fn load_mode(location: &str) -> GateResult<Option<ModeDefinition>> {
    match fetch_mode(location).await {
        Ok(Some(mode)) => Ok(Some(mode)),
        Ok(None) => Ok(None),
        Err(reason) => {
            debug!(%location, %reason, "fetch failed, reading mode from local file");
            read_local_mode(location).await.map(Some)
        }
    }
}

async fn fetch_mode(location: &str) -> Result<Option<ModeDefinition>, String> {
    let url = Url::parse(location).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| e.to_string())?;
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        warn!(%location, status = %response.status(), "mode definition unavailable");
        return Ok(None);
    }
    response
        .json::<ModeDefinition>()
        .await
        .map(Some)
        .map_err(|e| e.to_string())
}

async fn read_local_mode(location: &str) -> GateResult<ModeDefinition> {
    let fail = |reason: String| GateError::ModeLoad {
        location: location.to_string(),
        reason,
    };
    let data = tokio::fs::read(location)
        .await
        .map_err(|e| fail(e.to_string()))?;
    serde_json::from_slice(&data).map_err(|e| fail(e.to_string()))
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

enum ModeSource {
    Location(String),
    Loaded(ModeDefinition),
}

/// Mode validation stage.
pub struct ModeStage {
    source: ModeSource,
}

impl ModeStage {
    /// Load the mode from `location` on every evaluation.
    pub fn from_location(location: impl Into<String>) -> Self {
        Self {
            source: ModeSource::Location(location.into()),
        }
    }

    pub fn from_definition(mode: ModeDefinition) -> Self {
        Self {
            source: ModeSource::Loaded(mode),
        }
    }
}

#[async_trait]
impl GateStage for ModeStage {
    fn name(&self) -> &str {
        "mode"
    }

    async fn evaluate(&self, ctx: &GateContext<'_>) -> GateResult<StageDecision> {
        let loaded;
        let mode = match &self.source {
            ModeSource::Loaded(mode) => mode,
            ModeSource::Location(location) => {
                info!(mode = %location, "validating crate using mode");
                match load_mode(location).await? {
                    Some(mode) => {
                        loaded = mode;
                        &loaded
                    }
                    None => {
                        return Ok(StageDecision::Skipped {
                            reason: format!("mode definition {location} unavailable"),
                        })
                    }
                }
            }
        };

        let messages: Vec<String> = check_mode(mode, ctx.graph)
            .iter()
            .map(ModeFinding::message)
            .collect();
        if messages.is_empty() {
            Ok(StageDecision::Pass)
        } else {
            Err(GateError::ModeViolation { messages })
        }
    }
}
