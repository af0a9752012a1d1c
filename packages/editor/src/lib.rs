//! # Tessera Editor
//!
//! Document-mutation core of the Tessera drawing editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: snapshots, shapes, z-index keys   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: reversible edits + derived state    │
//! │  - Actions with lazily captured undo state  │
//! │  - Linear undo/redo                         │
//! │  - Snapshot diffing by pointer identity     │
//! │  - Store: dirty ids, order cache, tools     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: replica engine, renderer, tools       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Actions are the only writers**: every edit runs inside one replica commit
//! 2. **Remote state is a snapshot**: no rebasing of local history
//! 3. **Stale undo is reported, not forced**: see [`StaleUndoPolicy`]
//! 4. **Derived state is consumed once**: dirty ids and document diffs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tessera_editor::{AddShape, Store, UpdateShapeTransform};
//! use tessera_document::{Document, Shape, Transform};
//!
//! let mut store = Store::new(Document::new());
//! store.mutate_document(Box::new(AddShape::new(Shape::rect("s1", 40.0, 30.0))))?;
//! store.mutate_document(Box::new(UpdateShapeTransform::new("s1", Transform::translate(10.0, 0.0))))?;
//!
//! let dirty = store.consume_dirty_state();
//! let order = store.ordered_shape_ids();
//!
//! store.undo()?;
//! ```

mod action;
mod actions;
mod config;
mod diff;
mod dirty;
mod errors;
mod render;
mod replica;
mod store;
mod tools;
mod undo_manager;

pub use action::{Action, ActionContext, ActionSummary, Capture};
pub use actions::{
    AddShape, ClearCanvas, CompositeAction, DeleteShape, FillField, GeometryField, OpacityField,
    ShapeField, StrokeField, TransformField, UpdateCapture, UpdateShape, UpdateShapeFill,
    UpdateShapeGeometry, UpdateShapeOpacity, UpdateShapeStroke, UpdateShapeTransform,
    UpdateShapeZIndex, ZIndexField,
};
pub use config::{EditorConfig, StaleUndoPolicy, DEFAULT_CONFIG_NAME};
pub use diff::{diff_documents, ApplyDocumentDiff, DocumentDiff};
pub use dirty::DirtyState;
pub use errors::{ActionError, EditorError, ErrorKind};
pub use render::{RenderCallback, RenderScheduler};
pub use replica::{LocalReplica, Mutator, Replica};
pub use store::{FailureCallback, Store};
pub use tools::{
    Modifiers, PointerPhase, SelectionFrame, ToolContext, ToolEvent, ToolFactory, ToolRegistry,
    ToolResponse, ToolRuntime, ToolState, UiState,
};
pub use undo_manager::{UndoManager, UndoOutcome};
