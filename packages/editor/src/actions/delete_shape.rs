use crate::action::{ensure_absent, ensure_current, Action, ActionContext, Capture};
use crate::ActionError;
use std::sync::Arc;
use tessera_document::{Shape, Snapshot};

/// Remove a shape, keeping the removed record so undo can put it back.
#[derive(Debug)]
pub struct DeleteShape {
    shape_id: String,
    state: Capture<Arc<Shape>>,
}

impl DeleteShape {
    pub fn new(shape_id: impl Into<String>) -> Self {
        Self {
            shape_id: shape_id.into(),
            state: Capture::Unapplied,
        }
    }

    pub fn shape_id(&self) -> &str {
        &self.shape_id
    }
}

impl Action for DeleteShape {
    fn name(&self) -> &'static str {
        "delete_shape"
    }

    fn redo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        let policy = ctx.stale_policy();
        let id = self.shape_id.as_str();

        let (next, removed) = match &self.state {
            Capture::Unapplied => ctx.commit(doc, |draft| {
                draft
                    .remove_shape(id)
                    .ok_or_else(|| ActionError::ShapeNotFound(id.to_string()))
            })?,
            Capture::Undone(restored) => ctx.commit(doc, |draft| {
                ensure_current(draft, id, restored, policy)?;
                draft
                    .remove_shape(id)
                    .ok_or_else(|| ActionError::stale(id, "shape no longer exists"))
            })?,
            Capture::Applied(_) => return Err(ActionError::AlreadyApplied(self.name())),
        };

        self.state = Capture::Applied(removed);
        Ok(next)
    }

    fn undo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        let removed = Arc::clone(self.state.for_undo(self.name())?);
        let policy = ctx.stale_policy();

        let (next, ()) = ctx.commit(doc, |draft| {
            ensure_absent(draft, &removed.id, policy)?;
            draft.insert_shape(Arc::clone(&removed));
            Ok(())
        })?;

        self.state = Capture::Undone(removed);
        Ok(next)
    }

    fn affected_shape_ids(&self) -> Vec<String> {
        vec![self.shape_id.clone()]
    }

    fn affects_z_order(&self) -> bool {
        true
    }

    fn discard_capture(&mut self) {
        self.state = Capture::Unapplied;
    }
}
