//! Error types for the editor

use crate::projection::SpreadKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Spread not found: {0}")]
    SpreadNotFound(SpreadKey),

    #[error("Spread {0} is authored; only dynamic spreads can be removed")]
    NotDynamic(SpreadKey),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Spread index {index} out of range (book has {len} spreads)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
