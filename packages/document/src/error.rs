use thiserror::Error;

/// Errors raised by the document model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Invalid order key: {0:?}")]
    InvalidKey(String),

    #[error("Order key {before:?} must sort before {after:?}")]
    KeyOrder { before: String, after: String },

    #[error("Order key space exhausted")]
    KeyExhausted,

    #[error("No handler registered for shape type '{0}'")]
    UnknownShapeType(String),

    #[error("Shape '{id}' has geometry that does not fit type '{shape_type}'")]
    InvalidGeometry { id: String, shape_type: String },

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for DocumentError {
    fn from(e: serde_json::Error) -> Self {
        DocumentError::Json(e.to_string())
    }
}
