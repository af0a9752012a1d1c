//! # Snapshot Diffing
//!
//! Compares two document snapshots shape by shape. A shape counts as changed
//! when its `Arc` differs between the two sides; values are never compared,
//! which is sound only because snapshots are copy-on-write.
//!
//! ## Report
//!
//! - `added` / `removed` / `changed`: shape ids
//! - `z_order_changed_layers`: layers (resolved, both sides) of changed
//!   shapes whose z-index moved
//! - `layer_topology_changed`: the set of layers referenced by any shape
//!   differs; the renderer cannot patch this and must repaint
//! - `clear_filter_changed`: a changed shape moved in temporal order or
//!   became (or stopped being) a clear marker, so the visible set may differ

use std::collections::BTreeSet;
use std::sync::Arc;
use tessera_document::Snapshot;

/// Shape-level differences between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentDiff {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub changed: BTreeSet<String>,
    pub z_order_changed_layers: BTreeSet<String>,
    pub layer_topology_changed: bool,
    pub clear_filter_changed: bool,
    pub requires_full_invalidation: bool,
}

impl DocumentDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && self.z_order_changed_layers.is_empty()
            && !self.layer_topology_changed
            && !self.clear_filter_changed
            && !self.requires_full_invalidation
    }

    /// Whether a cached stacking order may be wrong after this diff
    pub fn affects_order(&self) -> bool {
        !self.added.is_empty()
            || !self.removed.is_empty()
            || !self.z_order_changed_layers.is_empty()
            || self.layer_topology_changed
            || self.clear_filter_changed
    }
}

/// Diff two snapshots. O(number of shapes).
pub fn diff_documents(prev: &Snapshot, next: &Snapshot) -> DocumentDiff {
    if Arc::ptr_eq(prev, next) {
        return DocumentDiff::default();
    }

    let prev_shapes = prev.shapes();
    let next_shapes = next.shapes();
    let mut diff = DocumentDiff::default();

    for (id, before) in prev_shapes {
        match next_shapes.get(id) {
            None => {
                diff.removed.insert(id.clone());
            }
            Some(after) if !Arc::ptr_eq(before, after) => {
                diff.changed.insert(id.clone());
                if before.z_index != after.z_index {
                    diff.z_order_changed_layers
                        .insert(before.resolved_layer_id().to_string());
                    diff.z_order_changed_layers
                        .insert(after.resolved_layer_id().to_string());
                }
                if before.temporal_order != after.temporal_order
                    || before.is_clear_marker() != after.is_clear_marker()
                {
                    diff.clear_filter_changed = true;
                }
            }
            Some(_) => {}
        }
    }

    diff.added.extend(
        next_shapes
            .keys()
            .filter(|id| !prev_shapes.contains_key(id.as_str()))
            .cloned(),
    );

    diff.layer_topology_changed = prev.referenced_layer_ids() != next.referenced_layer_ids();
    diff.requires_full_invalidation = diff.layer_topology_changed;
    diff
}

/// Pending diff handed to the renderer by `Store::consume_apply_document_diff`.
///
/// `prev_doc` is the oldest snapshot since the last consumption and
/// `next_doc` the newest; `diff` always spans the two.
#[derive(Debug, Clone)]
pub struct ApplyDocumentDiff {
    pub prev_doc: Snapshot,
    pub next_doc: Snapshot,
    pub diff: DocumentDiff,
    /// Survives `extend_to`: once a reset is in the interval, the whole
    /// interval needs a repaint
    full_invalidation_forced: bool,
}

impl ApplyDocumentDiff {
    pub fn between(prev_doc: Snapshot, next_doc: Snapshot) -> Self {
        let diff = diff_documents(&prev_doc, &next_doc);
        Self {
            prev_doc,
            next_doc,
            diff,
            full_invalidation_forced: false,
        }
    }

    /// Extend this diff so it ends at `next_doc`
    pub fn extend_to(&mut self, next_doc: Snapshot) {
        self.diff = diff_documents(&self.prev_doc, &next_doc);
        self.diff.requires_full_invalidation |= self.full_invalidation_forced;
        self.next_doc = next_doc;
    }

    /// Mark the interval as needing a full repaint regardless of content
    pub fn force_full_invalidation(&mut self) {
        self.full_invalidation_forced = true;
        self.diff.requires_full_invalidation = true;
    }

    pub fn requires_full_invalidation(&self) -> bool {
        self.diff.requires_full_invalidation
    }
}
