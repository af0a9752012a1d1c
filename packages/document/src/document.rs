//! # Document Snapshots
//!
//! A [`Document`] is one immutable version of the drawing. It is handed
//! around as a [`Snapshot`] (`Arc<Document>`), and shapes are stored behind
//! `Arc<Shape>` so that two versions share every shape neither of them touched.
//!
//! ## Copy-on-write
//!
//! ```text
//! v1: { s1 → Arc#1, s2 → Arc#2 }
//!         update_shape("s2", ..)
//! v2: { s1 → Arc#1, s2 → Arc#3 }
//! ```
//!
//! Cloning a `Document` copies only the map of pointers. Every update
//! allocates a fresh `Arc<Shape>` for the touched entry, never mutating the
//! shared value, so "did this shape change" is a pointer comparison.

use crate::layer::Layer;
use crate::shape::Shape;
use crate::z_index::{key_between, ordered_by};
use crate::DocumentError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Shared handle to an immutable document version
pub type Snapshot = Arc<Document>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    #[serde(default)]
    pub show_grid: bool,
}

/// One version of the drawing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    shapes: BTreeMap<String, Arc<Shape>>,

    #[serde(default)]
    layers: BTreeMap<String, Arc<Layer>>,

    #[serde(default)]
    pub size: Size,

    #[serde(default)]
    pub presentation: Presentation,

    /// Last temporal order handed out
    #[serde(default)]
    temporal_order_counter: u64,

    /// Incremented by every commit
    #[serde(default)]
    pub version: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from loose shapes (fixtures, imports)
    pub fn from_shapes(shapes: impl IntoIterator<Item = Shape>) -> Self {
        let mut doc = Self::new();
        for shape in shapes {
            doc.insert_shape(Arc::new(shape));
        }
        doc
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Wrap into a shareable snapshot
    pub fn into_snapshot(self) -> Snapshot {
        Arc::new(self)
    }

    pub fn shapes(&self) -> &BTreeMap<String, Arc<Shape>> {
        &self.shapes
    }

    pub fn shape(&self, id: &str) -> Option<&Arc<Shape>> {
        self.shapes.get(id)
    }

    pub fn contains_shape(&self, id: &str) -> bool {
        self.shapes.contains_key(id)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Insert a shape, returning the one it replaced
    pub fn insert_shape(&mut self, shape: Arc<Shape>) -> Option<Arc<Shape>> {
        self.shapes.insert(shape.id.clone(), shape)
    }

    /// Copy-on-write update of one shape. Returns the freshly allocated shape,
    /// or `None` if `id` is not in the document.
    pub fn update_shape<F>(&mut self, id: &str, f: F) -> Option<Arc<Shape>>
    where
        F: FnOnce(&mut Shape),
    {
        let current = self.shapes.get(id)?;
        let mut next = Shape::clone(current);
        f(&mut next);
        next.id = id.to_string();

        let next = Arc::new(next);
        self.shapes.insert(id.to_string(), Arc::clone(&next));
        Some(next)
    }

    pub fn remove_shape(&mut self, id: &str) -> Option<Arc<Shape>> {
        self.shapes.remove(id)
    }

    pub fn temporal_order_counter(&self) -> u64 {
        self.temporal_order_counter
    }

    /// Hand out the next temporal order. Never reused, even across undo.
    pub fn next_temporal_order(&mut self) -> u64 {
        self.temporal_order_counter += 1;
        self.temporal_order_counter
    }

    pub fn layers(&self) -> &BTreeMap<String, Arc<Layer>> {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&Arc<Layer>> {
        self.layers.get(id)
    }

    pub fn insert_layer(&mut self, layer: Layer) -> Option<Arc<Layer>> {
        self.layers.insert(layer.id.clone(), Arc::new(layer))
    }

    pub fn remove_layer(&mut self, id: &str) -> Option<Arc<Layer>> {
        self.layers.remove(id)
    }

    /// Layers in stacking order (bottom first)
    pub fn ordered_layers(&self) -> Vec<&Arc<Layer>> {
        ordered_by(self.layers.values(), |layer| layer.key.as_str())
    }

    /// Distinct resolved layer ids referenced by at least one shape
    pub fn referenced_layer_ids(&self) -> BTreeSet<&str> {
        self.shapes
            .values()
            .map(|shape| shape.resolved_layer_id())
            .collect()
    }

    /// Shapes of one layer in stacking order
    pub fn shapes_in_layer(&self, layer_id: &str) -> Vec<&Arc<Shape>> {
        ordered_by(
            self.shapes
                .values()
                .filter(|shape| shape.resolved_layer_id() == layer_id),
            |shape| shape.z_index.as_str(),
        )
    }

    /// Highest z-index key in a layer, `None` for an empty or unknown layer
    pub fn top_key_in_layer(&self, layer_id: &str) -> Option<&str> {
        self.shapes
            .values()
            .filter(|shape| shape.resolved_layer_id() == layer_id && !shape.z_index.is_empty())
            .map(|shape| shape.z_index.as_str())
            .max()
    }

    /// Key that stacks above everything currently in `layer_id`
    pub fn next_top_key(&self, layer_id: &str) -> Result<String, DocumentError> {
        key_between(self.top_key_in_layer(layer_id), None)
    }

    /// Temporal order of the most recent clear marker, if any
    pub fn clear_horizon(&self) -> Option<u64> {
        clear_horizon(self.shapes.values())
    }

    /// Visible shapes in stacking order, with cleared shapes filtered out
    pub fn ordered_shapes(&self) -> Vec<&Arc<Shape>> {
        ordered_by(filter_shapes_after_clear(self.shapes.values()), |shape| {
            shape.z_index.as_str()
        })
    }
}

fn clear_horizon<'a>(shapes: impl IntoIterator<Item = &'a Arc<Shape>>) -> Option<u64> {
    shapes
        .into_iter()
        .filter(|shape| shape.is_clear_marker())
        .filter_map(|shape| shape.temporal_order)
        .max()
}

/// Drop clear markers and every shape stamped at or before the latest one.
///
/// Shapes without a temporal order predate any clear and are hidden once a
/// clear exists.
pub fn filter_shapes_after_clear<'a, I>(shapes: I) -> Vec<&'a Arc<Shape>>
where
    I: IntoIterator<Item = &'a Arc<Shape>>,
{
    let shapes: Vec<&Arc<Shape>> = shapes.into_iter().collect();
    let horizon = clear_horizon(shapes.iter().copied());

    shapes
        .into_iter()
        .filter(|shape| !shape.is_clear_marker())
        .filter(|shape| match horizon {
            Some(horizon) => shape.temporal_order.unwrap_or(0) > horizon,
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::DEFAULT_LAYER_ID;

    fn stamped(mut shape: Shape, order: u64) -> Shape {
        shape.temporal_order = Some(order);
        shape
    }

    #[test]
    fn test_update_allocates_new_shape_and_keeps_others() {
        let doc = Document::from_shapes([
            Shape::rect("s1", 1.0, 1.0).with_z_index("a0"),
            Shape::rect("s2", 1.0, 1.0).with_z_index("a1"),
        ]);

        let mut next = doc.clone();
        let updated = next.update_shape("s2", |s| s.style.opacity = 0.5).unwrap();

        assert!(Arc::ptr_eq(doc.shape("s1").unwrap(), next.shape("s1").unwrap()));
        assert!(!Arc::ptr_eq(doc.shape("s2").unwrap(), next.shape("s2").unwrap()));
        assert!(Arc::ptr_eq(&updated, next.shape("s2").unwrap()));
        assert_eq!(doc.shape("s2").unwrap().style.opacity, 1.0);
    }

    #[test]
    fn test_update_missing_shape_is_none() {
        let mut doc = Document::new();
        assert!(doc.update_shape("ghost", |_| {}).is_none());
    }

    #[test]
    fn test_layer_queries() {
        let doc = Document::from_shapes([
            Shape::rect("s1", 1.0, 1.0).with_z_index("a2"),
            Shape::rect("s2", 1.0, 1.0).with_z_index("a0"),
            Shape::rect("s3", 1.0, 1.0).with_z_index("a1").with_layer("stickers"),
        ]);

        let ids: Vec<_> = doc
            .shapes_in_layer(DEFAULT_LAYER_ID)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["s2", "s1"]);

        assert_eq!(doc.top_key_in_layer(DEFAULT_LAYER_ID), Some("a2"));
        assert_eq!(doc.top_key_in_layer("stickers"), Some("a1"));
        assert_eq!(doc.top_key_in_layer("nowhere"), None);
        assert_eq!(doc.next_top_key(DEFAULT_LAYER_ID).unwrap(), "a3");
        assert_eq!(doc.next_top_key("nowhere").unwrap(), "a0");
    }

    #[test]
    fn test_ordered_layers_by_key() {
        let mut doc = Document::new();
        doc.insert_layer(Layer::new("top", "a2"));
        doc.insert_layer(Layer::new("bottom", "a0"));
        doc.insert_layer(Layer::new("middle", "a1"));

        let ids: Vec<_> = doc.ordered_layers().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["bottom", "middle", "top"]);
    }

    #[test]
    fn test_clear_marker_hides_earlier_shapes() {
        let doc = Document::from_shapes([
            stamped(Shape::rect("before", 1.0, 1.0).with_z_index("a0"), 1),
            stamped(Shape::clear_marker("clear").with_z_index("a1"), 2),
            stamped(Shape::rect("after", 1.0, 1.0).with_z_index("a2"), 3),
        ]);

        let ids: Vec<_> = doc.ordered_shapes().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["after"]);
        assert_eq!(doc.clear_horizon(), Some(2));
    }

    #[test]
    fn test_no_marker_keeps_everything() {
        let doc = Document::from_shapes([
            Shape::rect("b", 1.0, 1.0).with_z_index("a1"),
            Shape::rect("a", 1.0, 1.0).with_z_index("a0"),
        ]);
        let ids: Vec<_> = doc.ordered_shapes().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_json_roundtrip_preserves_counter() {
        let mut doc = Document::from_shapes([Shape::rect("s1", 4.0, 2.0).with_z_index("a0")]);
        doc.next_temporal_order();
        doc.insert_layer(Layer::new("default", "a0"));

        let parsed = Document::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(parsed, doc);
        assert_eq!(parsed.temporal_order_counter(), 1);
    }
}
