//! # Shapes
//!
//! A shape is one drawable record of the document. Shapes are immutable once
//! they are part of a shared snapshot: editing a shape means building a new
//! value and swapping it into a new snapshot (see [`crate::Document`]).

use crate::layer::DEFAULT_LAYER_ID;
use serde::{Deserialize, Serialize};

/// Shape type of the marker inserted by "clear canvas".
pub const CLEAR_SHAPE_TYPE: &str = "clear";

/// A 2D point in document space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Type-tagged geometry payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Geometry {
    Rect { width: f64, height: f64 },
    Ellipse { rx: f64, ry: f64 },
    Path { points: Vec<Point>, closed: bool },
    #[serde(rename_all = "camelCase")]
    Text { content: String, font_size: f64 },
    #[default]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,

    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            opacity: default_opacity(),
        }
    }
}

/// Placement of a shape: translation, rotation (radians) and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Transform {
    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interactions {
    pub selectable: bool,
    pub locked: bool,
}

impl Default for Interactions {
    fn default() -> Self {
        Self {
            selectable: true,
            locked: false,
        }
    }
}

/// A drawable record in the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: String,

    /// Discriminator resolved through the shape registry
    #[serde(rename = "type")]
    pub shape_type: String,

    #[serde(default)]
    pub geometry: Geometry,

    #[serde(default)]
    pub style: Style,

    /// Fractional stacking key (see [`crate::z_index`])
    #[serde(default)]
    pub z_index: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<String>,

    #[serde(default)]
    pub transform: Transform,

    /// Document-wide insertion counter, used by clear markers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_order: Option<u64>,

    #[serde(default)]
    pub interactions: Interactions,
}

impl Shape {
    pub fn new(id: impl Into<String>, shape_type: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            shape_type: shape_type.into(),
            geometry,
            style: Style::default(),
            z_index: String::new(),
            layer_id: None,
            transform: Transform::default(),
            temporal_order: None,
            interactions: Interactions::default(),
        }
    }

    pub fn rect(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self::new(id, "rect", Geometry::Rect { width, height })
    }

    pub fn ellipse(id: impl Into<String>, rx: f64, ry: f64) -> Self {
        Self::new(id, "ellipse", Geometry::Ellipse { rx, ry })
    }

    /// Marker shape for "clear canvas"
    pub fn clear_marker(id: impl Into<String>) -> Self {
        let mut shape = Self::new(id, CLEAR_SHAPE_TYPE, Geometry::Empty);
        shape.interactions = Interactions {
            selectable: false,
            locked: true,
        };
        shape
    }

    pub fn with_z_index(mut self, key: impl Into<String>) -> Self {
        self.z_index = key.into();
        self
    }

    pub fn with_layer(mut self, layer_id: impl Into<String>) -> Self {
        self.layer_id = Some(layer_id.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Layer this shape belongs to; unset resolves to the default layer.
    pub fn resolved_layer_id(&self) -> &str {
        self.layer_id.as_deref().unwrap_or(DEFAULT_LAYER_ID)
    }

    pub fn is_clear_marker(&self) -> bool {
        self.shape_type == CLEAR_SHAPE_TYPE
    }
}
