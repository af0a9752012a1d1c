//! # Shape Registry
//!
//! Maps a shape type name to the handler that knows how to validate and
//! serialize it. One registry is built per editing session and passed to
//! whoever needs it; there is no process-wide default.

use crate::shape::{Geometry, Shape, CLEAR_SHAPE_TYPE};
use crate::DocumentError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-type shape behaviour
pub trait ShapeHandler: Send + Sync {
    fn shape_type(&self) -> &str;

    /// Check that a shape of this type is well formed
    fn validate(&self, shape: &Shape) -> Result<(), DocumentError>;

    /// Serialize a shape for export
    fn serialize(&self, shape: &Shape) -> Result<serde_json::Value, DocumentError> {
        Ok(serde_json::to_value(shape)?)
    }
}

/// Handler for the built-in types: accepts one geometry variant
pub struct GeometryHandler {
    shape_type: &'static str,
    accepts: fn(&Geometry) -> bool,
}

impl GeometryHandler {
    pub fn new(shape_type: &'static str, accepts: fn(&Geometry) -> bool) -> Self {
        Self {
            shape_type,
            accepts,
        }
    }
}

impl ShapeHandler for GeometryHandler {
    fn shape_type(&self) -> &str {
        self.shape_type
    }

    fn validate(&self, shape: &Shape) -> Result<(), DocumentError> {
        if (self.accepts)(&shape.geometry) {
            Ok(())
        } else {
            Err(DocumentError::InvalidGeometry {
                id: shape.id.clone(),
                shape_type: shape.shape_type.clone(),
            })
        }
    }
}

/// Registered shape handlers for one session
#[derive(Clone, Default)]
pub struct ShapeRegistry {
    handlers: HashMap<String, Arc<dyn ShapeHandler>>,
}

impl ShapeRegistry {
    /// Empty registry. Every shape type must be registered before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with rect, ellipse, path, text and the clear marker
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(GeometryHandler::new("rect", |g| matches!(g, Geometry::Rect { .. })));
        registry.register(GeometryHandler::new("ellipse", |g| {
            matches!(g, Geometry::Ellipse { .. })
        }));
        registry.register(GeometryHandler::new("path", |g| matches!(g, Geometry::Path { .. })));
        registry.register(GeometryHandler::new("text", |g| matches!(g, Geometry::Text { .. })));
        registry.register(GeometryHandler::new(CLEAR_SHAPE_TYPE, |g| {
            matches!(g, Geometry::Empty)
        }));
        registry
    }

    pub fn register(&mut self, handler: impl ShapeHandler + 'static) {
        self.handlers
            .insert(handler.shape_type().to_string(), Arc::new(handler));
    }

    pub fn contains(&self, shape_type: &str) -> bool {
        self.handlers.contains_key(shape_type)
    }

    /// Handler for a type; missing handlers are a configuration error
    pub fn handler(&self, shape_type: &str) -> Result<&Arc<dyn ShapeHandler>, DocumentError> {
        self.handlers
            .get(shape_type)
            .ok_or_else(|| DocumentError::UnknownShapeType(shape_type.to_string()))
    }

    /// Look up the handler for `shape` and validate it
    pub fn validate(&self, shape: &Shape) -> Result<(), DocumentError> {
        self.handler(&shape.shape_type)?.validate(shape)
    }

    pub fn serialize(&self, shape: &Shape) -> Result<serde_json::Value, DocumentError> {
        self.handler(&shape.shape_type)?.serialize(shape)
    }

    pub fn shape_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeRegistry")
            .field("shape_types", &self.shape_types())
            .finish()
    }
}
