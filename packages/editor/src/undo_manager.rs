//! # Undo Manager
//!
//! Linear undo/redo history of applied actions.
//!
//! ## Design
//!
//! - Applying an action pushes it on the undo stack and clears redo
//! - Undo moves the action to the redo stack, redo moves it back
//! - A failed undo/redo puts the action back where it was
//! - Stale captures are reported as [`UndoOutcome::Failed`]; contract
//!   violations come back as `Err`
//! - The oldest entries are dropped past `max_levels` (0 = unlimited)
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = UndoManager::with_max_levels(50);
//! let (doc, _) = history.apply(Box::new(action), &doc, &mut ctx)?;
//!
//! match history.undo(&doc, &mut ctx)? {
//!     UndoOutcome::Applied { document, .. } => { /* new snapshot */ }
//!     UndoOutcome::Failed { error, .. } => { /* report, document unchanged */ }
//!     UndoOutcome::Nothing => {}
//! }
//! ```

use crate::action::{Action, ActionContext, ActionSummary};
use crate::ActionError;
use tessera_document::Snapshot;
use tracing::debug;

/// Result of an undo or redo attempt
#[derive(Debug)]
pub enum UndoOutcome {
    /// Stack was empty
    Nothing,

    Applied {
        document: Snapshot,
        action: ActionSummary,
    },

    /// The action could not be inverted against the live document. The
    /// action stays on its stack and the document is unchanged.
    Failed {
        error: ActionError,
        action: ActionSummary,
    },
}

impl UndoOutcome {
    /// New document, when the step went through
    pub fn document(&self) -> Option<&Snapshot> {
        match self {
            UndoOutcome::Applied { document, .. } => Some(document),
            UndoOutcome::Nothing | UndoOutcome::Failed { .. } => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, UndoOutcome::Applied { .. })
    }

    pub fn error(&self) -> Option<&ActionError> {
        match self {
            UndoOutcome::Failed { error, .. } => Some(error),
            UndoOutcome::Nothing | UndoOutcome::Applied { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct UndoManager {
    /// Applied actions (most recent last)
    undo_stack: Vec<Box<dyn Action>>,

    /// Undone actions (most recent last)
    redo_stack: Vec<Box<dyn Action>>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl UndoManager {
    /// Create an undo manager with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Apply an action and record it for undo.
    ///
    /// On failure the action is dropped and the history is untouched.
    pub fn apply(
        &mut self,
        mut action: Box<dyn Action>,
        doc: &Snapshot,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(Snapshot, ActionSummary), ActionError> {
        let next = action.redo(doc, ctx)?;
        let summary = action.summary();

        self.undo_stack.push(action);
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();

        Ok((next, summary))
    }

    /// Undo the most recent action
    pub fn undo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<UndoOutcome, ActionError> {
        let Some(mut action) = self.undo_stack.pop() else {
            return Ok(UndoOutcome::Nothing);
        };

        match action.undo(doc, ctx) {
            Ok(document) => {
                let summary = action.summary();
                self.redo_stack.push(action);
                Ok(UndoOutcome::Applied {
                    document,
                    action: summary,
                })
            }
            Err(error) => {
                let summary = action.summary();
                self.undo_stack.push(action);
                Self::failed(error, summary)
            }
        }
    }

    /// Redo the most recently undone action
    pub fn redo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<UndoOutcome, ActionError> {
        let Some(mut action) = self.redo_stack.pop() else {
            return Ok(UndoOutcome::Nothing);
        };

        match action.redo(doc, ctx) {
            Ok(document) => {
                let summary = action.summary();
                self.undo_stack.push(action);
                Ok(UndoOutcome::Applied {
                    document,
                    action: summary,
                })
            }
            Err(error) => {
                let summary = action.summary();
                self.redo_stack.push(action);
                Self::failed(error, summary)
            }
        }
    }

    fn failed(error: ActionError, action: ActionSummary) -> Result<UndoOutcome, ActionError> {
        if error.is_recoverable() {
            debug!(action = action.name, error = %error, "history step failed");
            Ok(UndoOutcome::Failed { error, action })
        } else {
            Err(error)
        }
    }

    /// Pop the next undo entry without applying it, for hosts that route the
    /// inverse through their own dispatcher
    pub fn take_undo(&mut self) -> Option<Box<dyn Action>> {
        self.undo_stack.pop()
    }

    /// Pop the next redo entry without applying it
    pub fn take_redo(&mut self) -> Option<Box<dyn Action>> {
        self.redo_stack.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Name of the action the next undo would invert
    pub fn undo_name(&self) -> Option<&'static str> {
        self.undo_stack.last().map(|action| action.name())
    }

    pub fn redo_name(&self) -> Option<&'static str> {
        self.redo_stack.last().map(|action| action.name())
    }

    /// Drop all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}
