//! # Editor Store
//!
//! Owns the current document and its history, and hands derived state to the
//! renderer.
//!
//! ## Change sources
//!
//! ```text
//! local intent ──▶ mutate_document ──▶ UndoManager ──▶ Replica::commit
//!                        │
//!                        └──▶ dirty ids, order cache invalidation
//!
//! remote snapshot ──▶ apply_document ──▶ diff_documents
//!                        │
//!                        └──▶ dirty ids, pending ApplyDocumentDiff
//! ```
//!
//! ## Consume-once channels
//!
//! [`Store::consume_dirty_state`] and [`Store::consume_apply_document_diff`]
//! each hand over what accumulated since the last call and reset only their
//! own channel.

use crate::action::{Action, ActionContext, ActionSummary};
use crate::actions::{ClearCanvas, CompositeAction};
use crate::config::EditorConfig;
use crate::diff::{diff_documents, ApplyDocumentDiff};
use crate::dirty::DirtyState;
use crate::render::RenderScheduler;
use crate::replica::{LocalReplica, Replica};
use crate::tools::{ToolContext, ToolEvent, ToolRegistry, ToolRuntime, ToolState, UiState};
use crate::undo_manager::{UndoManager, UndoOutcome};
use crate::{ActionError, EditorError};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::Arc;
use tessera_document::{Document, IdGenerator, Shape, ShapeRegistry, Snapshot};
use tracing::{debug, info, instrument, warn};

/// Host hook for undo/redo steps that could not be applied
pub type FailureCallback = Box<dyn FnMut(&ActionError, &ActionSummary) + Send>;

pub struct Store {
    config: EditorConfig,
    registry: Arc<ShapeRegistry>,
    replica: Box<dyn Replica + Send>,
    document: Snapshot,
    history: UndoManager,

    dirty: DirtyState,
    pending_diff: Option<ApplyDocumentDiff>,
    /// Visible shape ids in stacking order; `None` until next read
    ordered_cache: Option<Arc<[String]>>,

    tools: ToolRegistry,
    runtimes: HashMap<String, Box<dyn ToolRuntime>>,
    tool_state: ToolState,
    ui: UiState,
    ids: IdGenerator,

    render: RenderScheduler,
    on_undo_failure: Option<FailureCallback>,
}

impl Store {
    /// Store with default config, the built-in shape types and a local replica
    pub fn new(document: Document) -> Self {
        Self::with_config(EditorConfig::default(), document)
    }

    pub fn with_config(config: EditorConfig, document: Document) -> Self {
        let history = UndoManager::with_max_levels(config.history_limit);
        let ids = IdGenerator::new(&config.session_seed);

        Self {
            config,
            registry: Arc::new(ShapeRegistry::with_builtin()),
            replica: Box::new(LocalReplica::new()),
            document: document.into_snapshot(),
            history,
            dirty: DirtyState::default(),
            pending_diff: None,
            ordered_cache: None,
            tools: ToolRegistry::new(),
            runtimes: HashMap::new(),
            tool_state: ToolState::Inactive,
            ui: UiState::default(),
            ids,
            render: RenderScheduler::new(),
            on_undo_failure: None,
        }
    }

    pub fn with_registry(mut self, registry: Arc<ShapeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_replica(mut self, replica: impl Replica + Send + 'static) -> Self {
        self.replica = Box::new(replica);
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn on_undo_failure(&mut self, callback: impl FnMut(&ActionError, &ActionSummary) + Send + 'static) {
        self.on_undo_failure = Some(Box::new(callback));
    }

    pub fn on_render(&mut self, callback: impl FnMut() + Send + 'static) {
        self.render.set_callback(Box::new(callback));
    }

    pub fn document(&self) -> &Snapshot {
        &self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ShapeRegistry> {
        &self.registry
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    /// Render signals fired so far
    pub fn render_signals(&self) -> u64 {
        self.render.signals()
    }

    // --- Local edits ---

    /// Apply an action and record it for undo
    #[instrument(skip_all, fields(action = action.name()))]
    pub fn mutate_document(&mut self, action: Box<dyn Action>) -> Result<ActionSummary, EditorError> {
        let (next, summary) = {
            let mut ctx = ActionContext::new(
                &self.registry,
                self.replica.as_mut(),
                self.config.stale_undo_policy,
            );
            self.history.apply(action, &self.document, &mut ctx)?
        };

        debug!(version = next.version, affected = summary.affected_shape_ids.len(), "applied action");
        self.settle_local(next, &summary);
        Ok(summary)
    }

    /// Apply several actions as one undo step and one commit
    pub fn mutate_batch(&mut self, actions: Vec<Box<dyn Action>>) -> Result<ActionSummary, EditorError> {
        self.mutate_document(Box::new(CompositeAction::new(actions)))
    }

    /// Hide everything currently drawn behind a fresh clear marker
    pub fn clear_canvas(&mut self) -> Result<ActionSummary, EditorError> {
        let marker_id = self.ids.new_id("clear");
        self.mutate_document(Box::new(ClearCanvas::new(marker_id)))
    }

    pub fn undo(&mut self) -> Result<UndoOutcome, EditorError> {
        let outcome = {
            let mut ctx = ActionContext::new(
                &self.registry,
                self.replica.as_mut(),
                self.config.stale_undo_policy,
            );
            self.history.undo(&self.document, &mut ctx)?
        };
        self.settle_outcome("undo", &outcome);
        Ok(outcome)
    }

    pub fn redo(&mut self) -> Result<UndoOutcome, EditorError> {
        let outcome = {
            let mut ctx = ActionContext::new(
                &self.registry,
                self.replica.as_mut(),
                self.config.stale_undo_policy,
            );
            self.history.redo(&self.document, &mut ctx)?
        };
        self.settle_outcome("redo", &outcome);
        Ok(outcome)
    }

    /// Pop the next undo entry for a host that applies it elsewhere
    pub fn take_undo(&mut self) -> Option<Box<dyn Action>> {
        self.history.take_undo()
    }

    pub fn take_redo(&mut self) -> Option<Box<dyn Action>> {
        self.history.take_redo()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn settle_local(&mut self, next: Snapshot, summary: &ActionSummary) {
        self.document = next;
        self.dirty.record(
            &self.document,
            summary.affected_shape_ids.iter().map(String::as_str),
        );
        if summary.affects_z_order {
            self.ordered_cache = None;
        }
        self.render.request();
    }

    fn settle_outcome(&mut self, step: &'static str, outcome: &UndoOutcome) {
        match outcome {
            UndoOutcome::Applied { document, action } => {
                debug!(step, action = action.name, "history step applied");
                self.settle_local(Arc::clone(document), action);
            }
            UndoOutcome::Failed { error, action } => {
                warn!(step, action = action.name, error = %error, "history step failed");
                if let Some(callback) = self.on_undo_failure.as_mut() {
                    callback(error, action);
                }
            }
            UndoOutcome::Nothing => {}
        }
    }

    // --- External replacement ---

    /// Replace the document with an externally produced snapshot
    #[instrument(skip_all, fields(version = next.version))]
    pub fn apply_document(&mut self, next: Snapshot) {
        self.replace_document(next);
        self.render.request();
    }

    /// Load an unrelated document: history, UI state and drafts are dropped
    /// and the renderer is told to repaint everything
    #[instrument(skip_all, fields(version = next.version))]
    pub fn reset_to_document(&mut self, next: Snapshot) {
        self.replace_document(next);
        if let Some(pending) = self.pending_diff.as_mut() {
            pending.force_full_invalidation();
        }

        self.history.clear();
        self.ui.reset();
        self.ordered_cache = None;

        info!(shapes = self.document.shape_count(), "document reset");
        self.render.request();
    }

    fn replace_document(&mut self, next: Snapshot) {
        let step = diff_documents(&self.document, &next);

        for id in step.added.iter().chain(&step.changed) {
            self.dirty.mark_dirty(id);
        }
        for id in &step.removed {
            self.dirty.mark_deleted(id);
        }
        if step.affects_order() {
            self.ordered_cache = None;
        }

        debug!(
            added = step.added.len(),
            removed = step.removed.len(),
            changed = step.changed.len(),
            topology = step.layer_topology_changed,
            "replacing document"
        );

        let prev = mem::replace(&mut self.document, next);
        match self.pending_diff.as_mut() {
            Some(pending) => pending.extend_to(Arc::clone(&self.document)),
            None => {
                self.pending_diff = Some(ApplyDocumentDiff::between(prev, Arc::clone(&self.document)));
            }
        }
    }

    // --- Consumers ---

    /// Ids touched since the last call; resets only the dirty channel
    pub fn consume_dirty_state(&mut self) -> DirtyState {
        mem::take(&mut self.dirty)
    }

    /// Diff spanning every replacement since the last call, if any
    pub fn consume_apply_document_diff(&mut self) -> Option<ApplyDocumentDiff> {
        self.pending_diff.take()
    }

    /// Visible shape ids in stacking order.
    ///
    /// The same `Arc` comes back until something that can reorder shapes
    /// happens, so callers can compare with `Arc::ptr_eq`.
    pub fn ordered_shape_ids(&mut self) -> Arc<[String]> {
        let document = &self.document;
        let ids = self.ordered_cache.get_or_insert_with(|| {
            document
                .ordered_shapes()
                .into_iter()
                .map(|shape| shape.id.clone())
                .collect()
        });
        Arc::clone(ids)
    }

    /// Visible shapes in stacking order, resolved against the live document
    pub fn ordered_shapes(&mut self) -> Vec<Arc<Shape>> {
        let ids = self.ordered_shape_ids();
        ids.iter()
            .filter_map(|id| self.document.shape(id).cloned())
            .collect()
    }

    /// Serialize the visible shapes through their registered handlers
    pub fn export_json(&self) -> Result<serde_json::Value, EditorError> {
        let shapes = self
            .document
            .ordered_shapes()
            .into_iter()
            .map(|shape| self.registry.serialize(shape))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(serde_json::json!({
            "size": self.document.size,
            "presentation": self.document.presentation,
            "shapes": shapes,
        }))
    }

    // --- Tools ---

    pub fn active_tool(&self) -> Option<&str> {
        self.tool_state.active_id()
    }

    /// Switch to tool `id`, creating its runtime on first use
    pub fn activate_tool(&mut self, id: &str) -> Result<(), EditorError> {
        if self.tool_state.active_id() == Some(id) {
            return Ok(());
        }
        if !self.runtimes.contains_key(id) && !self.tools.contains(id) {
            return Err(EditorError::UnknownTool(id.to_string()));
        }

        self.deactivate_tool();

        let runtime = match self.runtimes.entry(id.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!(tool = id, "creating tool runtime");
                entry.insert(self.tools.create(id)?)
            }
        };

        let mut cx = ToolContext {
            tool_id: id,
            document: &self.document,
            ui: &mut self.ui,
            ids: &mut self.ids,
        };
        runtime.activate(&mut cx);

        self.tool_state = ToolState::Active(id.to_string());
        info!(tool = id, "tool activated");
        self.render.request();
        Ok(())
    }

    /// Deactivate the current tool, clearing its draft and transient UI
    pub fn deactivate_tool(&mut self) {
        let ToolState::Active(id) = mem::take(&mut self.tool_state) else {
            return;
        };

        if let Some(runtime) = self.runtimes.get_mut(&id) {
            let mut cx = ToolContext {
                tool_id: &id,
                document: &self.document,
                ui: &mut self.ui,
                ids: &mut self.ids,
            };
            runtime.deactivate(&mut cx);
        }

        self.ui.clear_tool_state(&id);
        debug!(tool = %id, "tool deactivated");
        self.render.request();
    }

    /// Route one pointer event to the active tool.
    ///
    /// Returns the summary of the action the tool produced, if any.
    pub fn dispatch(&mut self, event: ToolEvent) -> Result<Option<ActionSummary>, EditorError> {
        self.batch(|store| store.dispatch_one(event))
    }

    /// Route a run of pointer events, firing at most one render signal
    pub fn dispatch_batch(
        &mut self,
        events: impl IntoIterator<Item = ToolEvent>,
    ) -> Result<Vec<ActionSummary>, EditorError> {
        self.batch(|store| {
            let mut applied = Vec::new();
            for event in events {
                if let Some(summary) = store.dispatch_one(event)? {
                    applied.push(summary);
                }
            }
            Ok(applied)
        })
    }

    fn dispatch_one(&mut self, event: ToolEvent) -> Result<Option<ActionSummary>, EditorError> {
        let response = {
            let Some(id) = self.tool_state.active_id() else {
                return Ok(None);
            };
            let Some(runtime) = self.runtimes.get_mut(id) else {
                return Ok(None);
            };

            let mut cx = ToolContext {
                tool_id: id,
                document: &self.document,
                ui: &mut self.ui,
                ids: &mut self.ids,
            };
            runtime.handle_event(&event, &mut cx)
        };

        if response.render {
            self.render.request();
        }
        match response.action {
            Some(action) => self.mutate_document(action).map(Some),
            None => Ok(None),
        }
    }

    /// Run `f` with render requests coalesced into at most one signal
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.render.begin();
        let result = f(self);
        self.render.end();
        result
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("version", &self.document.version)
            .field("shapes", &self.document.shape_count())
            .field("history", &self.history)
            .field("tool_state", &self.tool_state)
            .field("render", &self.render)
            .finish()
    }
}
