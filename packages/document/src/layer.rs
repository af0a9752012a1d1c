use serde::{Deserialize, Serialize};

/// Layer every shape without an explicit `layer_id` belongs to
pub const DEFAULT_LAYER_ID: &str = "default";

/// A stacking group of shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub name: String,

    /// Fractional key ordering layers against each other
    pub key: String,

    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Layer {
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            key: key.into(),
            visible: true,
        }
    }
}
