//! Single-field shape edits.
//!
//! One generic action, [`UpdateShape<F>`], covers every property edit. The
//! [`ShapeField`] selector says which field it reads and writes, how a new
//! value is validated, and whether changing it can reorder the canvas.

use crate::action::{ensure_current, Action, ActionContext, Capture};
use crate::config::StaleUndoPolicy;
use crate::ActionError;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tessera_document::{z_index, Document, Geometry, Shape, Snapshot, Stroke, Transform};

/// Selects one editable field of a shape
pub trait ShapeField: fmt::Debug + Send + 'static {
    type Value: Clone + fmt::Debug + PartialEq + Send;

    const NAME: &'static str;

    /// Editing this field can change stacking order
    const AFFECTS_Z_ORDER: bool = false;

    fn get(shape: &Shape) -> Self::Value;

    fn set(shape: &mut Shape, value: Self::Value);

    fn validate(_value: &Self::Value) -> Result<(), ActionError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransformField;

impl ShapeField for TransformField {
    type Value = Transform;
    const NAME: &'static str = "update_shape_transform";

    fn get(shape: &Shape) -> Transform {
        shape.transform
    }

    fn set(shape: &mut Shape, value: Transform) {
        shape.transform = value;
    }

    fn validate(value: &Transform) -> Result<(), ActionError> {
        let finite = [value.x, value.y, value.rotation, value.scale_x, value.scale_y]
            .iter()
            .all(|v| v.is_finite());
        if finite {
            Ok(())
        } else {
            Err(ActionError::InvalidValue {
                field: "transform",
                reason: "components must be finite".to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GeometryField;

impl ShapeField for GeometryField {
    type Value = Geometry;
    const NAME: &'static str = "update_shape_geometry";

    fn get(shape: &Shape) -> Geometry {
        shape.geometry.clone()
    }

    fn set(shape: &mut Shape, value: Geometry) {
        shape.geometry = value;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FillField;

impl ShapeField for FillField {
    type Value = Option<String>;
    const NAME: &'static str = "update_shape_fill";

    fn get(shape: &Shape) -> Option<String> {
        shape.style.fill.clone()
    }

    fn set(shape: &mut Shape, value: Option<String>) {
        shape.style.fill = value;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StrokeField;

impl ShapeField for StrokeField {
    type Value = Option<Stroke>;
    const NAME: &'static str = "update_shape_stroke";

    fn get(shape: &Shape) -> Option<Stroke> {
        shape.style.stroke.clone()
    }

    fn set(shape: &mut Shape, value: Option<Stroke>) {
        shape.style.stroke = value;
    }

    fn validate(value: &Option<Stroke>) -> Result<(), ActionError> {
        match value {
            Some(stroke) if !(stroke.width >= 0.0) => Err(ActionError::InvalidValue {
                field: "stroke",
                reason: format!("width must be non-negative, got {}", stroke.width),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OpacityField;

impl ShapeField for OpacityField {
    type Value = f64;
    const NAME: &'static str = "update_shape_opacity";

    fn get(shape: &Shape) -> f64 {
        shape.style.opacity
    }

    fn set(shape: &mut Shape, value: f64) {
        shape.style.opacity = value;
    }

    fn validate(value: &f64) -> Result<(), ActionError> {
        if (0.0..=1.0).contains(value) {
            Ok(())
        } else {
            Err(ActionError::InvalidValue {
                field: "opacity",
                reason: format!("expected 0..=1, got {}", value),
            })
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ZIndexField;

impl ShapeField for ZIndexField {
    type Value = String;
    const NAME: &'static str = "update_shape_z_index";
    const AFFECTS_Z_ORDER: bool = true;

    fn get(shape: &Shape) -> String {
        shape.z_index.clone()
    }

    fn set(shape: &mut Shape, value: String) {
        shape.z_index = value;
    }

    fn validate(value: &String) -> Result<(), ActionError> {
        Ok(z_index::validate_key(value)?)
    }
}

pub type UpdateShapeTransform = UpdateShape<TransformField>;
pub type UpdateShapeGeometry = UpdateShape<GeometryField>;
pub type UpdateShapeFill = UpdateShape<FillField>;
pub type UpdateShapeStroke = UpdateShape<StrokeField>;
pub type UpdateShapeOpacity = UpdateShape<OpacityField>;
pub type UpdateShapeZIndex = UpdateShape<ZIndexField>;

/// What an applied update remembers
#[derive(Debug, Clone)]
pub struct UpdateCapture<V> {
    /// Field value before the edit
    pub previous: V,
    /// Shape record the edit replaced
    pub before: Arc<Shape>,
    /// Shape record the edit produced
    pub after: Arc<Shape>,
}

/// Set one field of one shape
#[derive(Debug)]
pub struct UpdateShape<F: ShapeField> {
    shape_id: String,
    next: F::Value,
    state: Capture<UpdateCapture<F::Value>>,
    field: PhantomData<F>,
}

impl<F: ShapeField> UpdateShape<F> {
    pub fn new(shape_id: impl Into<String>, next: F::Value) -> Self {
        Self {
            shape_id: shape_id.into(),
            next,
            state: Capture::Unapplied,
            field: PhantomData,
        }
    }

    pub fn shape_id(&self) -> &str {
        &self.shape_id
    }

    /// Value this update writes
    pub fn next_value(&self) -> &F::Value {
        &self.next
    }

    /// Value the field held before the first application
    pub fn previous_value(&self) -> Option<&F::Value> {
        match &self.state {
            Capture::Applied(captured) | Capture::Undone(captured) => Some(&captured.previous),
            Capture::Unapplied => None,
        }
    }
}

/// Write `value` over the live shape, or put back a captured record when the
/// live shape is exactly the one expected.
fn swap_in<F: ShapeField>(
    draft: &mut Document,
    id: &str,
    expected: &Arc<Shape>,
    replacement: &Arc<Shape>,
    value: &F::Value,
    policy: StaleUndoPolicy,
) -> Result<Arc<Shape>, ActionError> {
    ensure_current(draft, id, expected, policy)?;

    match policy {
        StaleUndoPolicy::Reject => {
            draft.insert_shape(Arc::clone(replacement));
            Ok(Arc::clone(replacement))
        }
        StaleUndoPolicy::Overwrite => draft
            .update_shape(id, |shape| F::set(shape, value.clone()))
            .ok_or_else(|| ActionError::stale(id, "shape no longer exists")),
    }
}

impl<F: ShapeField> Action for UpdateShape<F> {
    fn name(&self) -> &'static str {
        F::NAME
    }

    fn redo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        let policy = ctx.stale_policy();
        let registry = ctx.registry();
        let id = self.shape_id.as_str();
        let next_value = &self.next;

        let (next, captured) = match &self.state {
            Capture::Unapplied => {
                F::validate(next_value)?;

                ctx.commit(doc, |draft| {
                    let before = draft
                        .shape(id)
                        .cloned()
                        .ok_or_else(|| ActionError::ShapeNotFound(id.to_string()))?;

                    let mut edited = Shape::clone(&before);
                    F::set(&mut edited, next_value.clone());
                    registry.validate(&edited)?;

                    let after = Arc::new(edited);
                    draft.insert_shape(Arc::clone(&after));

                    Ok(UpdateCapture {
                        previous: F::get(&before),
                        before,
                        after,
                    })
                })?
            }
            Capture::Undone(captured) => ctx.commit(doc, |draft| {
                let after = swap_in::<F>(draft, id, &captured.before, &captured.after, next_value, policy)?;
                Ok(UpdateCapture {
                    after,
                    ..captured.clone()
                })
            })?,
            Capture::Applied(_) => return Err(ActionError::AlreadyApplied(F::NAME)),
        };

        self.state = Capture::Applied(captured);
        Ok(next)
    }

    fn undo(&mut self, doc: &Snapshot, ctx: &mut ActionContext<'_>) -> Result<Snapshot, ActionError> {
        let captured = self.state.for_undo(F::NAME)?.clone();
        let policy = ctx.stale_policy();
        let id = self.shape_id.as_str();

        let (next, before) = ctx.commit(doc, |draft| {
            swap_in::<F>(draft, id, &captured.after, &captured.before, &captured.previous, policy)
        })?;

        self.state = Capture::Undone(UpdateCapture { before, ..captured });
        Ok(next)
    }

    fn affected_shape_ids(&self) -> Vec<String> {
        vec![self.shape_id.clone()]
    }

    fn affects_z_order(&self) -> bool {
        F::AFFECTS_Z_ORDER
    }

    fn discard_capture(&mut self) {
        self.state = Capture::Unapplied;
    }
}
