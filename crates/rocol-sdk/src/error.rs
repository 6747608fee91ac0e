use thiserror::Error;

use crate::object::ObjectState;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot build provenance: {0}")]
    Provenance(String),

    /// `add_to_repo` was called before an identifier was minted.
    #[error("no identifier has been minted for this object")]
    MissingIdentifier,

    /// The repository identifier could not be attached to the crate.
    #[error("was not able to add identifier: {0}")]
    IdentifierAssertion(String),

    /// The object already finished; a new object must be built.
    #[error("object is {0}; build a new object to try again")]
    InvalidState(ObjectState),

    /// A target path the object reserves for its own files.
    #[error("invalid target path: {0}")]
    InvalidTarget(String),

    #[error(transparent)]
    Validation(#[from] rocol_gate::GateError),

    #[error("commit failed: {0}")]
    Commit(#[from] rocol_store::StoreError),

    #[error("graph error: {0}")]
    Graph(#[from] rocol_graph::GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
