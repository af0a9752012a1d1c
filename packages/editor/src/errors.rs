//! Error types for the editor
//!
//! Errors fall in three groups (see [`ErrorKind`]). Contract and
//! configuration errors are caller bugs and propagate as `Err`. Recoverable
//! errors only come out of undo/redo and are reported, not thrown.

use tessera_document::DocumentError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller bug: undo before apply, editing a missing shape, ...
    Contract,
    /// Undo/redo against state that moved underneath it
    Recoverable,
    /// Missing tool or shape handler
    Configuration,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Action '{0}' was undone before it was ever applied")]
    NotApplied(&'static str),

    #[error("Action '{0}' is already applied")]
    AlreadyApplied(&'static str),

    #[error("Shape not found: {0}")]
    ShapeNotFound(String),

    #[error("Shape already exists: {0}")]
    DuplicateShape(String),

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Shape '{id}' is stale: {reason}")]
    Stale { id: String, reason: &'static str },

    #[error("Replica committed without running the mutator")]
    MutatorNotRun,

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Stale { .. } => ErrorKind::Recoverable,
            ActionError::Document(DocumentError::UnknownShapeType(_)) => ErrorKind::Configuration,
            _ => ErrorKind::Contract,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Recoverable
    }

    pub(crate) fn stale(id: &str, reason: &'static str) -> Self {
        ActionError::Stale {
            id: id.to_string(),
            reason,
        }
    }
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Tool not registered: {0}")]
    UnknownTool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl EditorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorError::Action(e) => e.kind(),
            EditorError::Document(DocumentError::UnknownShapeType(_)) => ErrorKind::Configuration,
            EditorError::Document(_) => ErrorKind::Contract,
            EditorError::UnknownTool(_) | EditorError::Io(_) | EditorError::Config(_) => {
                ErrorKind::Configuration
            }
        }
    }
}
