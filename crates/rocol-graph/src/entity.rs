use std::collections::BTreeMap;
use std::ops::Deref;

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{GraphError, GraphResult};
use crate::vocab;

/// A `{"@id": ...}` reference value.
pub fn reference(id: &str) -> Value {
    let mut map = Map::new();
    map.insert(vocab::ID.into(), Value::String(id.to_string()));
    Value::Object(map)
}

/// The target id if `value` is a JSON object carrying an `@id`.
pub fn as_reference(value: &Value) -> Option<&str> {
    value.as_object()?.get(vocab::ID)?.as_str()
}

/// `true` if `id` names a file relative to the crate root.
///
/// Absolute URLs, in-document `#fragment` ids and blank nodes (`_:`) are
/// not local paths.
pub fn is_local_path(id: &str) -> bool {
    if id.is_empty() || id.starts_with('#') || id.starts_with("_:") {
        return false;
    }
    Url::parse(id).is_err()
}

/// Filesystem-relative path for a local entity id. Ids are URI references,
/// so `Sound%20files/a.wav` names `Sound files/a.wav`.
pub fn local_file_path(id: &str) -> String {
    let id = id.strip_prefix("./").unwrap_or(id);
    percent_decode_str(id).decode_utf8_lossy().into_owned()
}

/// One node of the description graph.
///
/// Property values are always lists. A reference to another entity is held
/// as a `{"@id": ...}` object.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: String,
    types: Vec<String>,
    props: BTreeMap<String, Vec<Value>>,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            types: Vec::new(),
            props: BTreeMap::new(),
        }
    }

    /// Builder: add a type tag.
    pub fn with_type(mut self, t: impl Into<String>) -> Self {
        self.add_type(t);
        self
    }

    /// Builder: append a value to a property.
    pub fn with(mut self, prop: &str, value: impl Into<Value>) -> Self {
        self.push(prop, value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn has_type(&self, t: &str) -> bool {
        self.types.iter().any(|x| x == t)
    }

    pub fn add_type(&mut self, t: impl Into<String>) {
        let t = t.into();
        if !self.has_type(&t) {
            self.types.push(t);
        }
    }

    /// Values of a property; empty when the property is absent.
    pub fn get(&self, prop: &str) -> &[Value] {
        self.props.get(prop).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, prop: &str) -> bool {
        self.props.contains_key(prop)
    }

    /// First value of a property as a string, if it is one.
    pub fn first_str(&self, prop: &str) -> Option<&str> {
        self.get(prop).first()?.as_str()
    }

    pub fn props(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn push(&mut self, prop: &str, value: Value) {
        self.props.entry(prop.to_string()).or_default().push(value);
    }

    /// Append unless an equal value is already present.
    pub fn push_unique(&mut self, prop: &str, value: Value) {
        let values = self.props.entry(prop.to_string()).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// Replace all values of a property.
    pub fn set(&mut self, prop: &str, values: Vec<Value>) {
        self.props.insert(prop.to_string(), values);
    }

    /// Make sure a property is present, as an empty list if it was absent.
    pub fn ensure(&mut self, prop: &str) {
        self.props.entry(prop.to_string()).or_default();
    }

    /// Ids referenced from any property.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.props
            .values()
            .flat_map(|vs| vs.iter())
            .filter_map(as_reference)
    }

    /// Ids referenced from one property.
    pub fn references_in<'a>(&'a self, prop: &str) -> impl Iterator<Item = &'a str> {
        self.get(prop).iter().filter_map(as_reference)
    }

    /// Rewrite every reference to `from` into a reference to `to`.
    pub(crate) fn rename_references(&mut self, from: &str, to: &str) {
        for values in self.props.values_mut() {
            for value in values.iter_mut() {
                if as_reference(value) == Some(from) {
                    *value = reference(to);
                }
            }
        }
    }

    /// Union another entity's types and values into this one.
    pub(crate) fn merge(&mut self, other: Entity) {
        for t in other.types {
            self.add_type(t);
        }
        for (prop, values) in other.props {
            for v in values {
                self.push_unique(&prop, v);
            }
        }
    }

    /// Parse a JSON-LD node. Nested nodes that carry properties besides
    /// `@id` are split out into their own entities and replaced by
    /// references; they are returned after the parsed entity.
    pub fn from_json(value: &Value) -> GraphResult<(Entity, Vec<Entity>)> {
        let obj = value
            .as_object()
            .ok_or_else(|| GraphError::InvalidDocument(format!("node is not an object: {value}")))?;
        let id = obj
            .get(vocab::ID)
            .and_then(Value::as_str)
            .ok_or_else(|| GraphError::MissingId(value.to_string()))?;

        let mut entity = Entity::new(id);
        let mut nested = Vec::new();
        for (key, raw) in obj {
            match key.as_str() {
                vocab::ID => {}
                vocab::TYPE => {
                    for t in as_list(raw) {
                        if let Some(t) = t.as_str() {
                            entity.add_type(t);
                        }
                    }
                }
                _ => {
                    entity.ensure(key);
                    for v in as_list(raw) {
                        if is_embedded_node(v) {
                            let (child, grandchildren) = Entity::from_json(v)?;
                            entity.push(key, reference(child.id()));
                            nested.push(child);
                            nested.extend(grandchildren);
                        } else {
                            entity.push(key, v.clone());
                        }
                    }
                }
            }
        }
        Ok((entity, nested))
    }

    /// Compact JSON-LD form: single values are written without a list.
    /// Empty lists stay as `[]` so required links remain visible.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(vocab::ID.into(), Value::String(self.id.clone()));
        match self.types.as_slice() {
            [] => {}
            [one] => {
                obj.insert(vocab::TYPE.into(), Value::String(one.clone()));
            }
            many => {
                obj.insert(
                    vocab::TYPE.into(),
                    Value::Array(many.iter().cloned().map(Value::String).collect()),
                );
            }
        }
        for (prop, values) in &self.props {
            let v = match values.as_slice() {
                [one] => one.clone(),
                many => Value::Array(many.to_vec()),
            };
            obj.insert(prop.clone(), v);
        }
        Value::Object(obj)
    }
}

/// Mutable access to an entity held by a graph.
///
/// Properties and types can change; the id cannot, since the graph indexes
/// entities by id. Use [`CrateGraph::set_root_id`](crate::CrateGraph::set_root_id)
/// to rename the root.
#[derive(Debug)]
pub struct EntityMut<'a>(&'a mut Entity);

impl<'a> EntityMut<'a> {
    pub(crate) fn new(entity: &'a mut Entity) -> Self {
        Self(entity)
    }

    pub fn add_type(&mut self, t: impl Into<String>) {
        self.0.add_type(t);
    }

    pub fn push(&mut self, prop: &str, value: Value) {
        self.0.push(prop, value);
    }

    pub fn push_unique(&mut self, prop: &str, value: Value) {
        self.0.push_unique(prop, value);
    }

    pub fn set(&mut self, prop: &str, values: Vec<Value>) {
        self.0.set(prop, values);
    }

    pub fn ensure(&mut self, prop: &str) {
        self.0.ensure(prop);
    }
}

impl Deref for EntityMut<'_> {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        self.0
    }
}

fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn is_embedded_node(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => obj.get(vocab::ID).map_or(false, Value::is_string) && obj.len() > 1,
        None => false,
    }
}
