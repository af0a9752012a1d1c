use crate::action::{Action, ActionContext, Capture};
use crate::ActionError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tessera_document::Snapshot;
use tracing::warn;

/// Several actions applied and undone as one step.
///
/// Redo runs the children in order, undo runs them in reverse. The whole
/// group reaches the replica as a single commit; if a child fails, the
/// children that already ran are rolled back so every capture stays in step
/// with the document that is actually live. A failed first redo leaves every
/// child unapplied, since nothing it captured was ever committed.
#[derive(Debug, Default)]
pub struct CompositeAction {
    actions: Vec<Box<dyn Action>>,
    state: Capture<()>,
}

impl CompositeAction {
    pub fn new(actions: Vec<Box<dyn Action>>) -> Self {
        Self {
            actions,
            state: Capture::Unapplied,
        }
    }

    pub fn push(&mut self, action: impl Action + 'static) {
        self.actions.push(Box::new(action));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Run `step` on each index of `order`; on failure, run `rollback` over the
/// indices already done, most recent first.
fn run_all<S, R>(
    actions: &mut [Box<dyn Action>],
    order: &[usize],
    doc: &Snapshot,
    ctx: &mut ActionContext<'_>,
    step: S,
    rollback: R,
) -> Result<Snapshot, ActionError>
where
    S: Fn(&mut Box<dyn Action>, &Snapshot, &mut ActionContext<'_>) -> Result<Snapshot, ActionError>,
    R: Fn(&mut Box<dyn Action>, &Snapshot, &mut ActionContext<'_>) -> Result<Snapshot, ActionError>,
{
    let mut current = Arc::clone(doc);

    for (done, &index) in order.iter().enumerate() {
        match step(&mut actions[index], &current, ctx) {
            Ok(next) => current = next,
            Err(error) => {
                for &undo_index in order[..done].iter().rev() {
                    match rollback(&mut actions[undo_index], &current, ctx) {
                        Ok(next) => current = next,
                        Err(rollback_error) => {
                            warn!(
                                action = actions[undo_index].name(),
                                error = %rollback_error,
                                "composite rollback failed"
                            );
                        }
                    }
                }
                return Err(error);
            }
        }
    }

    Ok(current)
}

impl Action for CompositeAction {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn redo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        if self.state.is_applied() {
            return Err(ActionError::AlreadyApplied(self.name()));
        }

        let order: Vec<usize> = (0..self.actions.len()).collect();
        let actions = &mut self.actions;
        let result = ctx.transact(doc, |ctx| {
            run_all(
                actions,
                &order,
                doc,
                ctx,
                |action, doc, ctx| action.redo(doc, ctx),
                |action, doc, ctx| action.undo(doc, ctx),
            )
        });

        let next = match result {
            Ok(next) => next,
            Err(error) => {
                if matches!(self.state, Capture::Unapplied) {
                    self.discard_capture();
                }
                return Err(error);
            }
        };

        self.state = Capture::Applied(());
        Ok(next)
    }

    fn undo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        self.state.for_undo(self.name())?;

        let order: Vec<usize> = (0..self.actions.len()).rev().collect();
        let actions = &mut self.actions;
        let next = ctx.transact(doc, |ctx| {
            run_all(
                actions,
                &order,
                doc,
                ctx,
                |action, doc, ctx| action.undo(doc, ctx),
                |action, doc, ctx| action.redo(doc, ctx),
            )
        })?;

        self.state = Capture::Undone(());
        Ok(next)
    }

    fn affected_shape_ids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.actions
            .iter()
            .flat_map(|action| action.affected_shape_ids())
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    fn affects_z_order(&self) -> bool {
        self.actions.iter().any(|action| action.affects_z_order())
    }

    fn discard_capture(&mut self) {
        self.state = Capture::Unapplied;
        for action in &mut self.actions {
            action.discard_capture();
        }
    }
}

impl FromIterator<Box<dyn Action>> for CompositeAction {
    fn from_iter<I: IntoIterator<Item = Box<dyn Action>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
