//! # Reversible Actions
//!
//! An action is an instruction built with only the state it wants to reach.
//! The first `redo` captures whatever it needs to invert itself, because the
//! true previous value is unknown until the action runs.
//!
//! ## Lifecycle
//!
//! ```text
//! Unapplied ──redo──▶ Applied ──undo──▶ Undone
//!                        ▲                 │
//!                        └──────redo───────┘
//! ```
//!
//! `undo` on an `Unapplied` action is a contract error.
//!
//! ## Staleness
//!
//! Captures hold the exact `Arc<Shape>` an action produced. Undo and redo
//! require the live shape to still be that pointer; anything else means a
//! remote replacement (or some other writer) moved the shape, and the step
//! fails with [`ActionError::Stale`] unless the session runs with
//! [`StaleUndoPolicy::Overwrite`].

use crate::config::StaleUndoPolicy;
use crate::replica::Replica;
use crate::ActionError;
use std::fmt;
use std::sync::Arc;
use tessera_document::{Document, Shape, ShapeRegistry, Snapshot};

/// A reversible edit of the document
pub trait Action: fmt::Debug + Send {
    /// Debug name of this action
    fn name(&self) -> &'static str;

    /// Apply the edit, capturing previous state on the first call
    fn redo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError>;

    /// Invert the edit using the captured previous state
    fn undo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError>;

    /// Shapes touched by this action, for dirty tracking
    fn affected_shape_ids(&self) -> Vec<String>;

    /// Whether this action can change stacking order
    fn affects_z_order(&self) -> bool;

    /// Drop captures from a first apply whose result never reached the
    /// document, so the next `redo` starts over as a first apply.
    ///
    /// Actions that capture on their first `redo` must override this.
    fn discard_capture(&mut self) {}

    fn summary(&self) -> ActionSummary {
        ActionSummary {
            name: self.name(),
            affected_shape_ids: self.affected_shape_ids(),
            affects_z_order: self.affects_z_order(),
        }
    }
}

/// What an applied/undone action touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSummary {
    pub name: &'static str,
    pub affected_shape_ids: Vec<String>,
    pub affects_z_order: bool,
}

/// Capture state of an action
#[derive(Debug, Clone)]
pub enum Capture<T> {
    /// Never applied; nothing to invert
    Unapplied,
    Applied(T),
    Undone(T),
}

impl<T> Default for Capture<T> {
    fn default() -> Self {
        Capture::Unapplied
    }
}

impl<T> Capture<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Capture::Applied(_))
    }

    /// Captured state for an undo, or the contract error for calling undo now
    pub fn for_undo(&self, action: &'static str) -> Result<&T, ActionError> {
        match self {
            Capture::Applied(captured) => Ok(captured),
            Capture::Unapplied | Capture::Undone(_) => Err(ActionError::NotApplied(action)),
        }
    }
}

/// What an action may use while it runs
pub struct ActionContext<'a> {
    registry: &'a ShapeRegistry,
    replica: &'a mut dyn Replica,
    stale_policy: StaleUndoPolicy,
    in_transaction: bool,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        registry: &'a ShapeRegistry,
        replica: &'a mut dyn Replica,
        stale_policy: StaleUndoPolicy,
    ) -> Self {
        Self {
            registry,
            replica,
            stale_policy,
            in_transaction: false,
        }
    }

    pub fn registry(&self) -> &'a ShapeRegistry {
        self.registry
    }

    pub fn stale_policy(&self) -> StaleUndoPolicy {
        self.stale_policy
    }

    /// Run `mutator` atomically against `base`.
    ///
    /// Returns the new snapshot plus whatever the mutator produced. Inside a
    /// [`transact`](Self::transact) block the edit is staged locally and only
    /// reaches the replica when the block finishes.
    pub fn commit<T, F>(&mut self, base: &Snapshot, mutator: F) -> Result<(Snapshot, T), ActionError>
    where
        F: FnOnce(&mut Document) -> Result<T, ActionError>,
    {
        if self.in_transaction {
            let mut draft = Document::clone(base);
            let value = mutator(&mut draft)?;
            return Ok((Arc::new(draft), value));
        }

        let mut output = None;
        let snapshot = self.replica.commit(
            base,
            Box::new(|draft| {
                output = Some(mutator(draft)?);
                Ok(())
            }),
        )?;

        match output {
            Some(value) => Ok((snapshot, value)),
            None => Err(ActionError::MutatorNotRun),
        }
    }

    /// Group several commits into one replica commit.
    ///
    /// `f` receives this context and returns the staged snapshot. Nested
    /// calls join the outer transaction. If nothing changed, the replica is
    /// not touched and `base` is returned.
    pub fn transact<F>(&mut self, base: &Snapshot, f: F) -> Result<Snapshot, ActionError>
    where
        F: FnOnce(&mut Self) -> Result<Snapshot, ActionError>,
    {
        if self.in_transaction {
            return f(self);
        }

        self.in_transaction = true;
        let staged = f(self);
        self.in_transaction = false;
        let staged = staged?;

        if Arc::ptr_eq(&staged, base) {
            return Ok(Arc::clone(base));
        }

        let (snapshot, ()) = self.commit(base, |draft| {
            *draft = Document::clone(&staged);
            Ok(())
        })?;
        Ok(snapshot)
    }
}

impl fmt::Debug for ActionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("registry", &self.registry)
            .field("stale_policy", &self.stale_policy)
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

/// Live shape `id`, required to be the one this action last produced.
pub(crate) fn ensure_current(
    doc: &Document,
    id: &str,
    expected: &Arc<Shape>,
    policy: StaleUndoPolicy,
) -> Result<Arc<Shape>, ActionError> {
    let live = doc
        .shape(id)
        .ok_or_else(|| ActionError::stale(id, "shape no longer exists"))?;

    if policy == StaleUndoPolicy::Reject && !Arc::ptr_eq(live, expected) {
        return Err(ActionError::stale(id, "shape changed since the action captured it"));
    }
    Ok(Arc::clone(live))
}

/// Require that `id` is free before re-inserting a captured shape.
pub(crate) fn ensure_absent(doc: &Document, id: &str, policy: StaleUndoPolicy) -> Result<(), ActionError> {
    if policy == StaleUndoPolicy::Reject && doc.contains_shape(id) {
        return Err(ActionError::stale(id, "shape was re-created since the action captured it"));
    }
    Ok(())
}
