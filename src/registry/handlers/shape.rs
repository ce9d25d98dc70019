#![allow(clippy::needless_pass_by_value)]

use crate::error::AppError;
use crate::model::{Element, ElementBase, EllipseElement, LineElement, RectElement};
use crate::registry::params::{EllipseParams, LineParams, RectangleParams};
use crate::registry::validation::validate_finite;
use crate::registry::{CommandData, CommandOutput};
use crate::store::DocumentStore;

use super::common;

const SHAPE_SIZE: (f64, f64) = (100.0, 100.0);
const RECT_FILL: &str = "#3b82f6";
const RECT_STROKE: &str = "#1e40af";
const ELLIPSE_FILL: &str = "#10b981";
const ELLIPSE_STROKE: &str = "#047857";
const LINE_STROKE: &str = "#000000";
const LINE_STROKE_WIDTH: f64 = 2.0;

fn added(kind: &str, element_id: String) -> CommandOutput {
    CommandOutput::data(format!("Added {kind}."), CommandData::Element { element_id })
}

pub fn rectangle(store: &mut DocumentStore, p: RectangleParams) -> Result<CommandOutput, AppError> {
    let (x, y) = common::position(p.x, p.y)?;
    let (width, height) = common::size(p.width, p.height, SHAPE_SIZE)?;
    let corner_radius = p.corner_radius.unwrap_or(0.0);
    validate_finite(corner_radius, "Corner radius")?;
    let element = Element::Rect(RectElement {
        base: ElementBase::new(x, y, width, height),
        fill: p.fill.unwrap_or_else(|| RECT_FILL.into()),
        stroke: p.stroke.unwrap_or_else(|| RECT_STROKE.to_string()),
        stroke_width: common::stroke_width(p.stroke_width, 0.0)?,
        corner_radius,
        box_shadow: p.box_shadow,
    });
    let id = store.mutate(|doc| common::add_element(doc, element))?;
    Ok(added("rectangle", id))
}

pub fn ellipse(store: &mut DocumentStore, p: EllipseParams) -> Result<CommandOutput, AppError> {
    let (x, y) = common::position(p.x, p.y)?;
    let (width, height) = common::size(p.width, p.height, SHAPE_SIZE)?;
    let element = Element::Ellipse(EllipseElement {
        base: ElementBase::new(x, y, width, height),
        fill: p.fill.unwrap_or_else(|| ELLIPSE_FILL.into()),
        stroke: p.stroke.unwrap_or_else(|| ELLIPSE_STROKE.to_string()),
        stroke_width: common::stroke_width(p.stroke_width, 0.0)?,
        box_shadow: p.box_shadow,
    });
    let id = store.mutate(|doc| common::add_element(doc, element))?;
    Ok(added("ellipse", id))
}

/// The element box is the bounding box of the two endpoints.
pub fn line(store: &mut DocumentStore, p: LineParams) -> Result<CommandOutput, AppError> {
    for (value, name) in [(p.x1, "x1"), (p.y1, "y1"), (p.x2, "x2"), (p.y2, "y2")] {
        validate_finite(value, name)?;
    }
    let element = Element::Line(LineElement {
        base: ElementBase::new(
            p.x1.min(p.x2),
            p.y1.min(p.y2),
            (p.x2 - p.x1).abs(),
            (p.y2 - p.y1).abs(),
        ),
        x1: p.x1,
        y1: p.y1,
        x2: p.x2,
        y2: p.y2,
        stroke: p.stroke.unwrap_or_else(|| LINE_STROKE.to_string()),
        stroke_width: common::stroke_width(p.stroke_width, LINE_STROKE_WIDTH)?,
    });
    let id = store.mutate(|doc| common::add_element(doc, element))?;
    Ok(added("line", id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::model::{Fill, Layer};

    #[test]
    fn rectangle_defaults() {
        let mut store = DocumentStore::default();
        rectangle(&mut store, RectangleParams { x: Some(5.0), y: Some(6.0), ..Default::default() }).unwrap();
        let Element::Rect(rect) = &store.document().layers[0].elements[0] else {
            panic!("expected rect");
        };
        assert_eq!((rect.base.x, rect.base.y), (5.0, 6.0));
        assert_eq!((rect.base.width, rect.base.height), (100.0, 100.0));
        assert_eq!(rect.fill, Fill::Solid("#3b82f6".into()));
        assert_eq!(rect.stroke, "#1e40af");
        assert_eq!(rect.stroke_width, 0.0);
        assert_eq!(rect.base.opacity, 100.0);
    }

    #[test]
    fn ellipse_defaults() {
        let mut store = DocumentStore::default();
        ellipse(&mut store, EllipseParams::default()).unwrap();
        let Element::Ellipse(e) = &store.document().layers[0].elements[0] else {
            panic!("expected ellipse");
        };
        assert_eq!(e.fill, Fill::Solid("#10b981".into()));
        assert_eq!(e.stroke, "#047857");
    }

    #[test]
    fn line_box_spans_endpoints() {
        let mut store = DocumentStore::default();
        line(&mut store, LineParams { x1: 50.0, y1: 10.0, x2: 10.0, y2: 40.0, stroke: None, stroke_width: None }).unwrap();
        let Element::Line(l) = &store.document().layers[0].elements[0] else {
            panic!("expected line");
        };
        assert_eq!((l.base.x, l.base.y, l.base.width, l.base.height), (10.0, 10.0, 40.0, 30.0));
        assert_eq!(l.stroke_width, 2.0);
    }

    #[test]
    fn shapes_land_on_first_unlocked_layer() {
        let mut store = DocumentStore::default();
        store
            .mutate(|doc| {
                let mut top = Layer::new("Top");
                top.locked = true;
                doc.layers.insert(0, top);
                Ok(())
            })
            .unwrap();
        rectangle(&mut store, RectangleParams::default()).unwrap();
        assert!(store.document().layers[0].elements.is_empty());
        assert_eq!(store.document().layers[1].elements.len(), 1);
    }

    #[test]
    fn all_layers_locked_fails_without_history() {
        let mut store = DocumentStore::default();
        store
            .mutate(|doc| {
                doc.layers[0].locked = true;
                Ok(())
            })
            .unwrap();
        let before = store.history().past_len();
        let err = rectangle(&mut store, RectangleParams::default()).unwrap_err();
        assert_eq!(err.to_string(), "No unlocked layer available");
        assert_eq!(store.history().past_len(), before);
    }

    #[test]
    fn invalid_size_rejected() {
        let mut store = DocumentStore::default();
        let err = rectangle(&mut store, RectangleParams { width: Some(-1.0), ..Default::default() }).unwrap_err();
        assert_eq!(err.to_string(), "Width must be positive");
    }
}
