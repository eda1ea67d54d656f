//! Error types for the engine module.

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by a provisioning engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Resource already declared: {0}")]
    DuplicateResource(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Resource {from} references undeclared resource {target}")]
    UnresolvedReference { from: String, target: String },

    #[error("Resource {id} is still referenced by {by}")]
    StillReferenced { id: String, by: String },

    #[error("Resource {0} does not accept tags")]
    NotTaggable(String),

    #[error("Engine rejected declaration: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
