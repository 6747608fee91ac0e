use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::entity::{as_reference, reference, Entity, EntityMut};
use crate::error::{GraphError, GraphResult};
use crate::vocab;

/// Mutable in-memory RO-Crate.
///
/// Invariants:
/// - the metadata descriptor and the root dataset always exist;
/// - the root dataset always carries `hasPart` and `hasMember`, possibly empty;
/// - every entity added through this API can be found with [`CrateGraph::get`].
#[derive(Clone, Debug)]
pub struct CrateGraph {
    context: Value,
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
    root: usize,
    descriptor: usize,
}

impl CrateGraph {
    /// An empty crate: descriptor plus an unnamed root dataset.
    pub fn new() -> Self {
        let descriptor = Entity::new(vocab::METADATA_FILE)
            .with_type(vocab::CREATIVE_WORK)
            .with(vocab::CONFORMS_TO, reference(vocab::SPEC_ID))
            .with(vocab::ABOUT, reference(vocab::DEFAULT_ROOT_ID));
        let root = Entity::new(vocab::DEFAULT_ROOT_ID).with_type(vocab::DATASET);
        let mut graph = Self {
            context: Value::String(vocab::DEFAULT_CONTEXT.into()),
            entities: Vec::new(),
            index: HashMap::new(),
            root: 0,
            descriptor: 0,
        };
        graph.descriptor = graph.insert(descriptor);
        graph.root = graph.insert(root);
        graph.ensure_root_links();
        graph
    }

    /// Parse a crate document. A document without `@graph` (for example
    /// `{}`) yields an empty crate.
    pub fn from_json(doc: &Value) -> GraphResult<Self> {
        let obj = doc
            .as_object()
            .ok_or_else(|| GraphError::InvalidDocument("document is not an object".into()))?;
        let Some(nodes) = obj.get(vocab::GRAPH) else {
            let mut graph = Self::new();
            if let Some(ctx) = obj.get(vocab::CONTEXT) {
                graph.context = ctx.clone();
            }
            return Ok(graph);
        };
        let nodes = nodes
            .as_array()
            .ok_or_else(|| GraphError::InvalidDocument("@graph is not an array".into()))?;

        let mut graph = Self {
            context: obj
                .get(vocab::CONTEXT)
                .cloned()
                .unwrap_or_else(|| Value::String(vocab::DEFAULT_CONTEXT.into())),
            entities: Vec::with_capacity(nodes.len()),
            index: HashMap::new(),
            root: 0,
            descriptor: 0,
        };
        for node in nodes {
            let (entity, nested) = Entity::from_json(node)?;
            graph.upsert(entity);
            for child in nested {
                graph.upsert(child);
            }
        }

        graph.descriptor = *graph
            .index
            .get(vocab::METADATA_FILE)
            .ok_or_else(|| GraphError::MissingDescriptor(vocab::METADATA_FILE.into()))?;
        let root_id = graph.entities[graph.descriptor]
            .references_in(vocab::ABOUT)
            .next()
            .map(str::to_string)
            .ok_or_else(|| GraphError::MissingRoot("<none>".into()))?;
        graph.root = *graph
            .index
            .get(&root_id)
            .ok_or_else(|| GraphError::MissingRoot(root_id.clone()))?;
        graph.ensure_root_links();
        debug!(entities = graph.len(), root = %root_id, "parsed crate");
        Ok(graph)
    }

    /// Load `ro-crate-metadata.json` from a crate directory.
    pub fn from_dir(dir: &Path) -> GraphResult<Self> {
        let data = std::fs::read(dir.join(vocab::METADATA_FILE))?;
        let doc: Value =
            serde_json::from_slice(&data).map_err(|e| GraphError::Serialization(e.to_string()))?;
        Self::from_json(&doc)
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn root_id(&self) -> &str {
        self.entities[self.root].id()
    }

    pub fn root(&self) -> &Entity {
        &self.entities[self.root]
    }

    pub fn root_mut(&mut self) -> EntityMut<'_> {
        EntityMut::new(&mut self.entities[self.root])
    }

    pub fn descriptor(&self) -> &Entity {
        &self.entities[self.descriptor]
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<EntityMut<'_>> {
        let i = *self.index.get(id)?;
        Some(EntityMut::new(&mut self.entities[i]))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn entities_of_type<'a>(&'a self, t: &'a str) -> impl Iterator<Item = &'a Entity> {
        self.entities.iter().filter(move |e| e.has_type(t))
    }

    /// Add an entity, merging it into an existing entity with the same id.
    pub fn add_entity(&mut self, entity: Entity) -> EntityMut<'_> {
        let idx = self.upsert(entity);
        EntityMut::new(&mut self.entities[idx])
    }

    /// Append a value to a property of entity `id`.
    ///
    /// An embedded node (object with `@id` and other keys) is added to the
    /// graph as its own entity and a reference is pushed in its place.
    pub fn push_value(&mut self, id: &str, prop: &str, value: Value) -> GraphResult<()> {
        if !self.contains(id) {
            return Err(GraphError::EntityNotFound(id.to_string()));
        }
        let value = match as_reference(&value) {
            Some(target) if value.as_object().map_or(0, Map::len) > 1 => {
                let target = target.to_string();
                let (entity, nested) = Entity::from_json(&value)?;
                self.upsert(entity);
                for child in nested {
                    self.upsert(child);
                }
                reference(&target)
            }
            _ => value,
        };
        if let Some(mut e) = self.get_mut(id) {
            e.push_unique(prop, value);
        }
        Ok(())
    }

    /// Add `entity` to the graph and link it from `id` under `prop`.
    pub fn push_entity(&mut self, id: &str, prop: &str, entity: Entity) -> GraphResult<()> {
        if !self.contains(id) {
            return Err(GraphError::EntityNotFound(id.to_string()));
        }
        let target = entity.id().to_string();
        self.upsert(entity);
        if let Some(mut e) = self.get_mut(id) {
            e.push_unique(prop, reference(&target));
        }
        Ok(())
    }

    /// Give the root dataset a new id and rewrite every reference to it,
    /// including the descriptor's `about`.
    pub fn set_root_id(&mut self, new_id: &str) -> GraphResult<()> {
        let old_id = self.root_id().to_string();
        if old_id == new_id {
            return Ok(());
        }
        if self.contains(new_id) {
            return Err(GraphError::DuplicateId(new_id.to_string()));
        }
        self.index.remove(&old_id);
        self.entities[self.root].set_id(new_id);
        self.index.insert(new_id.to_string(), self.root);
        for entity in &mut self.entities {
            entity.rename_references(&old_id, new_id);
        }
        let descriptor = &mut self.entities[self.descriptor];
        if descriptor.references_in(vocab::ABOUT).next().is_none() {
            descriptor.set(vocab::ABOUT, vec![reference(new_id)]);
        }
        Ok(())
    }

    /// Attach a `PropertyValue` identifier to the metadata descriptor and
    /// return its id, `_:local-id:<name>:<value>`.
    pub fn add_identifier(&mut self, name: &str, value: &str) -> String {
        let id = format!("_:local-id:{name}:{value}");
        let entity = Entity::new(id.as_str())
            .with_type(vocab::PROPERTY_VALUE)
            .with(vocab::NAME, name)
            .with(vocab::VALUE, value);
        self.upsert(entity);
        self.entities[self.descriptor].push_unique(vocab::IDENTIFIER, reference(&id));
        id
    }

    pub fn to_json(&self) -> Value {
        let mut doc = Map::new();
        doc.insert(vocab::CONTEXT.into(), self.context.clone());
        doc.insert(
            vocab::GRAPH.into(),
            Value::Array(self.entities.iter().map(Entity::to_json).collect()),
        );
        Value::Object(doc)
    }

    pub fn to_json_pretty(&self) -> GraphResult<String> {
        serde_json::to_string_pretty(&self.to_json())
            .map_err(|e| GraphError::Serialization(e.to_string()))
    }

    fn insert(&mut self, entity: Entity) -> usize {
        let idx = self.entities.len();
        self.index.insert(entity.id().to_string(), idx);
        self.entities.push(entity);
        idx
    }

    fn upsert(&mut self, entity: Entity) -> usize {
        match self.index.get(entity.id()) {
            Some(&idx) => {
                self.entities[idx].merge(entity);
                idx
            }
            None => self.insert(entity),
        }
    }

    fn ensure_root_links(&mut self) {
        let root = &mut self.entities[self.root];
        root.ensure(vocab::HAS_PART);
        root.ensure(vocab::HAS_MEMBER);
    }
}

impl Default for CrateGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> Value {
        json!({
            "@context": "https://w3id.org/ro/crate/1.1/context",
            "@graph": [
                {"@id": "ro-crate-metadata.json", "@type": "CreativeWork",
                 "about": {"@id": "./"}, "conformsTo": {"@id": "https://w3id.org/ro/crate/1.1"}},
                {"@id": "./", "@type": "Dataset", "name": "Demo",
                 "hasPart": [{"@id": "a.txt"}],
                 "author": {"@id": "#alice", "@type": "Person", "name": "Alice"}},
                {"@id": "a.txt", "@type": "File"}
            ]
        })
    }

    #[test]
    fn new_graph_has_root_and_descriptor() {
        let g = CrateGraph::new();
        assert_eq!(g.root_id(), "./");
        assert!(g.root().has_type("Dataset"));
        assert!(g.root().has("hasPart"));
        assert!(g.root().has("hasMember"));
        assert_eq!(g.descriptor().references_in("about").next(), Some("./"));
    }

    #[test]
    fn empty_document_yields_empty_crate() {
        let g = CrateGraph::from_json(&json!({})).unwrap();
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn parses_and_flattens() {
        let g = CrateGraph::from_json(&sample_doc()).unwrap();
        assert_eq!(g.root().first_str("name"), Some("Demo"));
        assert!(g.get("#alice").unwrap().has_type("Person"));
        assert!(g.root().has("hasMember"));
        assert_eq!(g.entities_of_type("File").count(), 1);
    }

    #[test]
    fn missing_descriptor_is_rejected() {
        let err = CrateGraph::from_json(&json!({"@graph": [{"@id": "./"}]})).unwrap_err();
        assert!(matches!(err, GraphError::MissingDescriptor(_)));
    }

    #[test]
    fn dangling_about_is_rejected() {
        let err = CrateGraph::from_json(&json!({"@graph": [
            {"@id": "ro-crate-metadata.json", "about": {"@id": "./"}}
        ]}))
        .unwrap_err();
        assert!(matches!(err, GraphError::MissingRoot(_)));
    }

    #[test]
    fn push_value_adds_embedded_entity() {
        let mut g = CrateGraph::new();
        let root = g.root_id().to_string();
        g.push_value(&root, "hasPart", json!({"@id": "b.csv", "@type": "File", "name": "B"}))
            .unwrap();
        g.push_value(&root, "hasPart", json!({"@id": "b.csv", "@type": "File"}))
            .unwrap();
        assert_eq!(g.root().get("hasPart"), [json!({"@id": "b.csv"})]);
        assert_eq!(g.get("b.csv").unwrap().first_str("name"), Some("B"));
        assert!(g.push_value("nope", "x", json!(1)).is_err());
    }

    #[test]
    fn mutable_access_keeps_ids_indexed() {
        let mut g = CrateGraph::from_json(&sample_doc()).unwrap();
        {
            let mut root = g.root_mut();
            root.add_type("RepositoryCollection");
            root.set("name", vec![json!("Renamed")]);
        }
        g.add_entity(Entity::new("#bob")).push("name", json!("Bob"));

        assert_eq!(g.root().first_str("name"), Some("Renamed"));
        assert!(g.get(g.root_id()).unwrap().has_type("RepositoryCollection"));
        assert_eq!(g.get("#bob").unwrap().first_str("name"), Some("Bob"));
        assert_eq!(g.get_mut("#bob").map(|e| e.id().to_string()), Some("#bob".into()));
    }

    #[test]
    fn set_root_id_rewrites_references() {
        let mut g = CrateGraph::from_json(&sample_doc()).unwrap();
        g.get_mut("#alice")
            .unwrap()
            .push("memberOf", reference("./"));
        g.set_root_id("arcp://name,ns/demo").unwrap();

        assert_eq!(g.root_id(), "arcp://name,ns/demo");
        assert!(g.get("./").is_none());
        assert_eq!(
            g.descriptor().references_in("about").next(),
            Some("arcp://name,ns/demo")
        );
        assert_eq!(
            g.get("#alice").unwrap().references_in("memberOf").next(),
            Some("arcp://name,ns/demo")
        );
    }

    #[test]
    fn set_root_id_refuses_collision() {
        let mut g = CrateGraph::from_json(&sample_doc()).unwrap();
        assert!(matches!(
            g.set_root_id("a.txt").unwrap_err(),
            GraphError::DuplicateId(_)
        ));
    }

    #[test]
    fn add_identifier_links_descriptor() {
        let mut g = CrateGraph::new();
        let id = g.add_identifier("repository", "arcp://name,ns/x");
        assert_eq!(id, "_:local-id:repository:arcp://name,ns/x");
        let pv = g.get(&id).unwrap();
        assert!(pv.has_type("PropertyValue"));
        assert_eq!(pv.first_str("value"), Some("arcp://name,ns/x"));
        assert_eq!(g.descriptor().references_in("identifier").next(), Some(id.as_str()));
        // idempotent
        g.add_identifier("repository", "arcp://name,ns/x");
        assert_eq!(g.descriptor().get("identifier").len(), 1);
    }

    #[test]
    fn json_roundtrip_preserves_entities() {
        let g = CrateGraph::from_json(&sample_doc()).unwrap();
        let again = CrateGraph::from_json(&g.to_json()).unwrap();
        assert_eq!(again.len(), g.len());
        assert_eq!(again.root(), g.root());
    }

    #[test]
    fn from_dir_reads_metadata_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ro-crate-metadata.json"),
            serde_json::to_vec(&sample_doc()).unwrap(),
        )
        .unwrap();
        let g = CrateGraph::from_dir(dir.path()).unwrap();
        assert_eq!(g.root().first_str("name"), Some("Demo"));
    }
}
