use crate::action::{ensure_absent, ensure_current, Action, ActionContext, Capture};
use crate::ActionError;
use std::sync::Arc;
use tessera_document::{z_index, Shape, Snapshot};

/// Insert a new shape.
///
/// An empty `z_index` is filled with the next top key of the shape's layer.
/// Every first application stamps a fresh temporal order.
#[derive(Debug)]
pub struct AddShape {
    shape: Shape,
    state: Capture<Arc<Shape>>,
}

impl AddShape {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            state: Capture::Unapplied,
        }
    }

    pub fn shape_id(&self) -> &str {
        &self.shape.id
    }

    /// The shape as inserted, once applied
    pub fn inserted(&self) -> Option<&Arc<Shape>> {
        match &self.state {
            Capture::Applied(shape) | Capture::Undone(shape) => Some(shape),
            Capture::Unapplied => None,
        }
    }

    fn apply(&mut self, name: &'static str, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        let policy = ctx.stale_policy();

        let (next, inserted) = match &self.state {
            Capture::Unapplied => {
                ctx.registry().validate(&self.shape)?;
                let template = &self.shape;

                ctx.commit(doc, |draft| {
                    if draft.contains_shape(&template.id) {
                        return Err(ActionError::DuplicateShape(template.id.clone()));
                    }

                    let mut shape = template.clone();
                    if shape.z_index.is_empty() {
                        shape.z_index = draft.next_top_key(shape.resolved_layer_id())?;
                    } else {
                        z_index::validate_key(&shape.z_index)?;
                    }
                    shape.temporal_order = Some(draft.next_temporal_order());

                    let shape = Arc::new(shape);
                    draft.insert_shape(Arc::clone(&shape));
                    Ok(shape)
                })?
            }
            Capture::Undone(shape) => ctx.commit(doc, |draft| {
                ensure_absent(draft, &shape.id, policy)?;
                draft.insert_shape(Arc::clone(shape));
                Ok(Arc::clone(shape))
            })?,
            Capture::Applied(_) => return Err(ActionError::AlreadyApplied(name)),
        };

        self.state = Capture::Applied(inserted);
        Ok(next)
    }

    fn revert(&mut self, name: &'static str, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        let inserted = Arc::clone(self.state.for_undo(name)?);
        let policy = ctx.stale_policy();

        let (next, ()) = ctx.commit(doc, |draft| {
            ensure_current(draft, &inserted.id, &inserted, policy)?;
            draft.remove_shape(&inserted.id);
            Ok(())
        })?;

        self.state = Capture::Undone(inserted);
        Ok(next)
    }
}

impl Action for AddShape {
    fn name(&self) -> &'static str {
        "add_shape"
    }

    fn redo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        self.apply(self.name(), doc, ctx)
    }

    fn undo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        self.revert(self.name(), doc, ctx)
    }

    fn affected_shape_ids(&self) -> Vec<String> {
        vec![self.shape.id.clone()]
    }

    fn affects_z_order(&self) -> bool {
        true
    }

    fn discard_capture(&mut self) {
        self.state = Capture::Unapplied;
    }
}

/// Hide everything drawn so far behind a clear marker.
///
/// Undo removes only the marker, so the cleared shapes come back untouched.
#[derive(Debug)]
pub struct ClearCanvas {
    inner: AddShape,
}

impl ClearCanvas {
    pub fn new(marker_id: impl Into<String>) -> Self {
        Self {
            inner: AddShape::new(Shape::clear_marker(marker_id)),
        }
    }

    pub fn marker_id(&self) -> &str {
        self.inner.shape_id()
    }

    /// Temporal order stamped on the marker, once applied
    pub fn horizon(&self) -> Option<u64> {
        self.inner.inserted().and_then(|marker| marker.temporal_order)
    }
}

impl Action for ClearCanvas {
    fn name(&self) -> &'static str {
        "clear_canvas"
    }

    fn redo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        self.inner.apply(self.name(), doc, ctx)
    }

    fn undo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        self.inner.revert(self.name(), doc, ctx)
    }

    fn affected_shape_ids(&self) -> Vec<String> {
        self.inner.affected_shape_ids()
    }

    fn affects_z_order(&self) -> bool {
        true
    }

    fn discard_capture(&mut self) {
        self.inner.discard_capture();
    }
}
