//! # Tools
//!
//! A tool turns pointer events into actions. Tools are registered as
//! factories; the store creates one runtime per tool id the first time it is
//! activated and keeps it, so whatever the runtime set up survives being
//! switched away from and back to.
//!
//! ```text
//! Inactive ──activate(a)──▶ Active(a) ──activate(b)──▶ Active(b)
//!                              │   ▲                      │
//!                              │   └──activate(a)─────────┘
//!                              └──deactivate──▶ Inactive
//! ```

use crate::action::Action;
use crate::EditorError;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tessera_document::{IdGenerator, Point, Shape, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

/// One pointer sample, in document coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolEvent {
    pub phase: PointerPhase,
    pub position: Point,
    pub modifiers: Modifiers,
}

impl ToolEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::new(PointerPhase::Down, x, y)
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerPhase::Move, x, y)
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(PointerPhase::Up, x, y)
    }

    fn new(phase: PointerPhase, x: f64, y: f64) -> Self {
        Self {
            phase,
            position: Point::new(x, y),
            modifiers: Modifiers::default(),
        }
    }
}

/// Axis-aligned rubber-band rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionFrame {
    pub origin: Point,
    pub corner: Point,
}

/// Transient, per-session UI state. Never part of the document.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub selection: BTreeSet<String>,
    /// Shape ids showing edit handles
    pub handles: BTreeSet<String>,
    pub hover: Option<String>,
    pub selection_frame: Option<SelectionFrame>,
    /// In-progress preview shape per tool id
    pub drafts: HashMap<String, Shape>,
}

impl UiState {
    /// Clear what a tool leaves behind when it is switched away from
    pub fn clear_tool_state(&mut self, tool_id: &str) {
        self.drafts.remove(tool_id);
        self.handles.clear();
        self.hover = None;
        self.selection_frame = None;
    }

    /// Clear everything, including the selection and every draft
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What a tool may touch while handling an event
pub struct ToolContext<'a> {
    pub tool_id: &'a str,
    pub document: &'a Snapshot,
    pub ui: &'a mut UiState,
    pub ids: &'a mut IdGenerator,
}

impl ToolContext<'_> {
    pub fn draft(&self) -> Option<&Shape> {
        self.ui.drafts.get(self.tool_id)
    }

    pub fn draft_mut(&mut self) -> Option<&mut Shape> {
        self.ui.drafts.get_mut(self.tool_id)
    }

    pub fn set_draft(&mut self, shape: Shape) {
        self.ui.drafts.insert(self.tool_id.to_string(), shape);
    }

    pub fn take_draft(&mut self) -> Option<Shape> {
        self.ui.drafts.remove(self.tool_id)
    }
}

/// Outcome of one tool event
#[derive(Debug, Default)]
pub struct ToolResponse {
    /// Edit to run through the store's history
    pub action: Option<Box<dyn Action>>,
    /// Visible UI state moved (draft, hover, frame)
    pub render: bool,
}

impl ToolResponse {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn render() -> Self {
        Self {
            action: None,
            render: true,
        }
    }

    pub fn action(action: impl Action + 'static) -> Self {
        Self {
            action: Some(Box::new(action)),
            render: true,
        }
    }
}

/// A live tool
pub trait ToolRuntime: Send {
    fn activate(&mut self, _cx: &mut ToolContext<'_>) {}

    /// Called before the store clears this tool's draft, handles, hover and
    /// selection frame
    fn deactivate(&mut self, _cx: &mut ToolContext<'_>) {}

    fn handle_event(&mut self, event: &ToolEvent, cx: &mut ToolContext<'_>) -> ToolResponse;
}

pub type ToolFactory = Box<dyn Fn() -> Box<dyn ToolRuntime> + Send + Sync>;

/// Tool factories by id
#[derive(Default)]
pub struct ToolRegistry {
    factories: HashMap<String, ToolFactory>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, T>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: ToolRuntime + 'static,
    {
        self.factories
            .insert(id.into(), Box::new(move || Box::new(factory()) as Box<dyn ToolRuntime>));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Build a fresh runtime for `id`
    pub fn create(&self, id: &str) -> Result<Box<dyn ToolRuntime>, EditorError> {
        self.factories
            .get(id)
            .map(|factory| factory())
            .ok_or_else(|| EditorError::UnknownTool(id.to_string()))
    }

    pub fn tool_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_ids())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolState {
    #[default]
    Inactive,
    Active(String),
}

impl ToolState {
    pub fn active_id(&self) -> Option<&str> {
        match self {
            ToolState::Active(id) => Some(id),
            ToolState::Inactive => None,
        }
    }
}
