//! Terms and fixed identifiers used by RO-Crate documents.

/// Id of the metadata descriptor entity and name of the metadata file.
pub const METADATA_FILE: &str = "ro-crate-metadata.json";
/// Name of the HTML preview file.
pub const PREVIEW_FILE: &str = "ro-crate-preview.html";
/// Default root dataset id for a fresh crate.
pub const DEFAULT_ROOT_ID: &str = "./";
/// RO-Crate 1.1 JSON-LD context.
pub const DEFAULT_CONTEXT: &str = "https://w3id.org/ro/crate/1.1/context";
/// RO-Crate version the descriptor conforms to.
pub const SPEC_ID: &str = "https://w3id.org/ro/crate/1.1";

pub const ID: &str = "@id";
pub const TYPE: &str = "@type";
pub const CONTEXT: &str = "@context";
pub const GRAPH: &str = "@graph";

pub const DATASET: &str = "Dataset";
pub const FILE: &str = "File";
pub const CREATIVE_WORK: &str = "CreativeWork";
pub const PROPERTY_VALUE: &str = "PropertyValue";

pub const ABOUT: &str = "about";
pub const CONFORMS_TO: &str = "conformsTo";
pub const HAS_PART: &str = "hasPart";
pub const HAS_MEMBER: &str = "hasMember";
pub const IS_PART_OF: &str = "isPartOf";
pub const IDENTIFIER: &str = "identifier";
pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const VALUE: &str = "value";
pub const CONTENT_SIZE: &str = "contentSize";
