use crate::error::AppError;
use crate::model::{Document, Element, Layer};
use crate::registry::validation::{validate_finite, validate_opacity, validate_positive_finite};

pub fn layer_mut<'a>(doc: &'a mut Document, layer_id: &str) -> Result<&'a mut Layer, AppError> {
    doc.layer_mut(layer_id)
        .ok_or_else(|| AppError::layer_not_found(layer_id))
}

pub fn element_mut<'a>(doc: &'a mut Document, element_id: &str) -> Result<&'a mut Element, AppError> {
    doc.element_mut(element_id)
        .ok_or_else(|| AppError::element_not_found(element_id))
}

/// Append `element` to the first unlocked layer, returning its id.
pub fn add_element(doc: &mut Document, element: Element) -> Result<String, AppError> {
    let layer = doc.first_unlocked_layer_mut().ok_or(AppError::NoUnlockedLayer)?;
    let id = element.id().to_string();
    layer.elements.push(element);
    Ok(id)
}

/// Position of a new element: finite, defaulting to the origin.
pub fn position(x: Option<f64>, y: Option<f64>) -> Result<(f64, f64), AppError> {
    let (x, y) = (x.unwrap_or(0.0), y.unwrap_or(0.0));
    validate_finite(x, "x")?;
    validate_finite(y, "y")?;
    Ok((x, y))
}

/// Size of a new element: positive and finite, with a per-kind default.
pub fn size(width: Option<f64>, height: Option<f64>, default: (f64, f64)) -> Result<(f64, f64), AppError> {
    let (w, h) = (width.unwrap_or(default.0), height.unwrap_or(default.1));
    validate_positive_finite(w, "Width")?;
    validate_positive_finite(h, "Height")?;
    Ok((w, h))
}

pub fn stroke_width(value: Option<f64>, default: f64) -> Result<f64, AppError> {
    let w = value.unwrap_or(default);
    validate_finite(w, "Stroke width")?;
    if w < 0.0 {
        return Err(AppError::invalid("Stroke width must not be negative"));
    }
    Ok(w)
}

pub fn opacity(value: f64) -> Result<f64, AppError> {
    validate_opacity(value)?;
    Ok(value)
}
