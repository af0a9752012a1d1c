//! Concrete actions.

mod add_shape;
mod composite;
mod delete_shape;
mod update_shape;

pub use add_shape::{AddShape, ClearCanvas};
pub use composite::CompositeAction;
pub use delete_shape::DeleteShape;
pub use update_shape::{
    FillField, GeometryField, OpacityField, ShapeField, StrokeField, TransformField, UpdateCapture,
    UpdateShape, UpdateShapeFill, UpdateShapeGeometry, UpdateShapeOpacity, UpdateShapeStroke,
    UpdateShapeTransform, UpdateShapeZIndex, ZIndexField,
};
