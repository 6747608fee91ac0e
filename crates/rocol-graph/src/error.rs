use thiserror::Error;

/// Errors from description graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The document is not a JSON object or `@graph` is not an array.
    #[error("invalid crate document: {0}")]
    InvalidDocument(String),

    /// A graph node lacks a string `@id`.
    #[error("entity without @id: {0}")]
    MissingId(String),

    /// The graph has no metadata descriptor entity.
    #[error("metadata descriptor '{0}' not found")]
    MissingDescriptor(String),

    /// The descriptor's `about` does not resolve to an entity.
    #[error("root dataset not found (descriptor about: {0})")]
    MissingRoot(String),

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// Renaming would collide with another entity.
    #[error("duplicate entity id: {0}")]
    DuplicateId(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;
