//! Render-request coalescing.
//!
//! Store operations request a render whenever visible state moves. Inside a
//! batch (`begin`/`end`, re-entrant) requests are only remembered, and the
//! outermost `end` fires at most one signal.

use std::fmt;

pub type RenderCallback = Box<dyn FnMut() + Send>;

#[derive(Default)]
pub struct RenderScheduler {
    depth: usize,
    pending: bool,
    signals: u64,
    on_render: Option<RenderCallback>,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_callback(&mut self, callback: RenderCallback) {
        self.on_render = Some(callback);
    }

    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Close one batch level. Returns whether a signal fired.
    pub fn end(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 && self.pending {
            self.fire();
            true
        } else {
            false
        }
    }

    pub fn request(&mut self) {
        if self.depth > 0 {
            self.pending = true;
        } else {
            self.fire();
        }
    }

    pub fn in_batch(&self) -> bool {
        self.depth > 0
    }

    /// Signals fired so far
    pub fn signals(&self) -> u64 {
        self.signals
    }

    fn fire(&mut self) {
        self.pending = false;
        self.signals += 1;
        if let Some(callback) = self.on_render.as_mut() {
            callback();
        }
    }
}

impl fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("depth", &self.depth)
            .field("pending", &self.pending)
            .field("signals", &self.signals)
            .finish()
    }
}
