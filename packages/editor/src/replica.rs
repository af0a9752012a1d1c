//! # Replica Seam
//!
//! The replicated document engine is an external collaborator. The editor
//! only needs one thing from it: run a mutator atomically against a base
//! snapshot and hand back the resulting snapshot.
//!
//! ## Key Principles
//!
//! 1. **Replica owns convergence**: merging concurrent writers happens elsewhere
//! 2. **One mutator, one commit**: a failing mutator publishes nothing
//! 3. **Remote state arrives as snapshots**: fed into `Store::apply_document`

use crate::ActionError;
use std::sync::Arc;
use tessera_document::{Document, Snapshot};
use tracing::debug;

/// Atomic edit run by a replica against a draft of the base snapshot
pub type Mutator<'a> = Box<dyn FnOnce(&mut Document) -> Result<(), ActionError> + 'a>;

/// Atomic-mutation boundary of the replicated document
pub trait Replica {
    /// Apply `mutator` to a copy of `base` and return the new snapshot.
    ///
    /// When the mutator fails nothing is published and the error is returned.
    fn commit(&mut self, base: &Snapshot, mutator: Mutator<'_>) -> Result<Snapshot, ActionError>;
}

/// In-process replica: copy-on-write commit with a version bump
#[derive(Debug, Default)]
pub struct LocalReplica {
    commits: u64,
}

impl LocalReplica {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful commits so far
    pub fn commits(&self) -> u64 {
        self.commits
    }
}

impl Replica for LocalReplica {
    fn commit(&mut self, base: &Snapshot, mutator: Mutator<'_>) -> Result<Snapshot, ActionError> {
        let mut draft = Document::clone(base);
        mutator(&mut draft)?;
        draft.version = base.version + 1;

        self.commits += 1;
        debug!(version = draft.version, shapes = draft.shape_count(), "committed snapshot");

        Ok(Arc::new(draft))
    }
}
