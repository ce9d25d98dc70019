pub mod document;
pub mod element;

// Re-export commonly used types at the model level.
pub use document::{CanvasSettings, Document, Layer};
pub use element::{
    BoxShadow, Element, ElementBase, EllipseElement, Fill, Gradient, GradientStop, GroupElement,
    ImageElement, LineElement, PathElement, RectElement, TextAlign, TextElement, TextShadow,
};

/// Generate a fresh layer/element/document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
