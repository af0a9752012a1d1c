//! # Tessera Document
//!
//! Snapshot model of a multi-user vector drawing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: immutable snapshots               │
//! │  - Shapes / layers behind Arc               │
//! │  - Copy-on-write updates                    │
//! │  - Fractional z-index keys                  │
//! │  - Shape registry (per session)             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: actions, undo, diff, store          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are values**: once shared, a document never changes
//! 2. **Identity means unchanged**: untouched shapes keep their `Arc` across versions
//! 3. **Order is a key, not an index**: inserting never renumbers neighbours

mod document;
mod error;
mod id_generator;
mod layer;
mod registry;
mod shape;
pub mod z_index;

pub use document::{filter_shapes_after_clear, Document, Presentation, Size, Snapshot};
pub use error::DocumentError;
pub use id_generator::{get_session_id, IdGenerator};
pub use layer::{Layer, DEFAULT_LAYER_ID};
pub use registry::{GeometryHandler, ShapeHandler, ShapeRegistry};
pub use shape::{Geometry, Interactions, Point, Shape, Stroke, Style, Transform, CLEAR_SHAPE_TYPE};
pub use z_index::{key_between, keys_between, ordered_by, INITIAL_KEY};
