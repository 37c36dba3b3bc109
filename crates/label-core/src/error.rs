//! Error type shared by the label crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("invalid placeholder identifier `{0}` (expected Category.Field)")]
    InvalidPlaceholder(String),

    #[error("unknown paper size `{0}`")]
    UnknownPaperSize(String),

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("raster generator failed: {0}")]
    Generator(String),

    #[error("font load failed: {0}")]
    Font(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("document `{0}` not found")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, LabelError>;
