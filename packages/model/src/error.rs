use thiserror::Error;

/// Errors raised while decoding or encoding persisted book documents
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Document root is not an object (found {0})")]
    NotAnObject(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;
