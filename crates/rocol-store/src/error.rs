use std::path::PathBuf;

use rocol_types::VersionId;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object does not exist in the repository.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// The object exists but has no such version.
    #[error("version {version} not found in object {id}")]
    VersionNotFound { id: String, version: VersionId },

    /// The version exists but holds no file at this logical path.
    #[error("file '{path}' not found in {id} {version}")]
    FileNotFound {
        id: String,
        version: VersionId,
        path: String,
    },

    /// A file or directory staged for import does not exist.
    #[error("import source missing: {}", .0.display())]
    SourceMissing(PathBuf),

    /// A logical path is empty, absolute, or escapes the object root.
    #[error("invalid logical path: {0}")]
    InvalidPath(String),

    /// A transaction staged nothing.
    #[error("transaction for {0} staged no content")]
    EmptyTransaction(String),

    /// Stored content no longer matches its digest.
    #[error("corrupt content {digest}: {reason}")]
    CorruptContent { digest: String, reason: String },

    /// The root directory is not a repository.
    #[error("not a repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// Refused to create a repository over existing data.
    #[error("repository already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    /// A writer panicked while holding the repository's commit lock.
    #[error("repository lock poisoned at {}", .0.display())]
    LockPoisoned(PathBuf),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
