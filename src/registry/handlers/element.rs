#![allow(clippy::needless_pass_by_value)]

use crate::error::AppError;
use crate::model::{Element, Fill};
use crate::registry::params::{ElementRef, StyleParams, TransformParams};
use crate::registry::validation::{validate_finite, validate_positive_finite};
use crate::registry::{CommandData, CommandOutput};
use crate::store::DocumentStore;

use super::common;
use super::text::parse_align;

/// Offset applied to a duplicate so it does not sit exactly on the original.
const DUPLICATE_OFFSET: f64 = 20.0;

/// Shift an element, keeping a line's endpoints in step with its box.
fn translate(element: &mut Element, dx: f64, dy: f64) {
    let base = element.base_mut();
    base.x += dx;
    base.y += dy;
    if let Element::Line(line) = element {
        line.x1 += dx;
        line.y1 += dy;
        line.x2 += dx;
        line.y2 += dy;
    }
}

pub fn transform(store: &mut DocumentStore, p: TransformParams) -> Result<CommandOutput, AppError> {
    for (value, name) in [(p.x, "x"), (p.y, "y"), (p.rotation, "Rotation")] {
        if let Some(v) = value {
            validate_finite(v, name)?;
        }
    }
    for (value, name) in [(p.width, "Width"), (p.height, "Height")] {
        if let Some(v) = value {
            validate_positive_finite(v, name)?;
        }
    }
    let opacity = p.opacity.map(common::opacity).transpose()?;

    store.mutate(|doc| {
        let element = common::element_mut(doc, &p.element_id)?;
        let base = element.base();
        let dx = p.x.map_or(0.0, |x| x - base.x);
        let dy = p.y.map_or(0.0, |y| y - base.y);
        translate(element, dx, dy);
        let base = element.base_mut();
        if let Some(w) = p.width {
            base.width = w;
        }
        if let Some(h) = p.height {
            base.height = h;
        }
        if let Some(r) = p.rotation {
            base.rotation = r;
        }
        if let Some(o) = opacity {
            base.opacity = o;
        }
        Ok(())
    })?;
    Ok(CommandOutput::unit("Transformed element."))
}

/// Style fields each element variant accepts.
fn style_fields(element: &Element) -> &'static [&'static str] {
    match element {
        Element::Rect(_) => &["fill", "stroke", "strokeWidth", "cornerRadius", "opacity", "boxShadow"],
        Element::Ellipse(_) => &["fill", "stroke", "strokeWidth", "opacity", "boxShadow"],
        Element::Text(_) => &[
            "fill", "opacity", "fontSize", "fontFamily", "fontWeight", "align", "lineHeight", "shadow",
        ],
        Element::Image(_) => &["cornerRadius", "opacity"],
        Element::Line(_) => &["stroke", "strokeWidth", "opacity"],
        Element::Path(_) => &["fill", "stroke", "strokeWidth", "opacity"],
        Element::Group(_) => &["opacity"],
    }
}

fn present_fields(p: &StyleParams) -> impl Iterator<Item = &'static str> {
    [
        ("fill", p.fill.is_some()),
        ("stroke", p.stroke.is_some()),
        ("strokeWidth", p.stroke_width.is_some()),
        ("cornerRadius", p.corner_radius.is_some()),
        ("opacity", p.opacity.is_some()),
        ("boxShadow", p.box_shadow.is_some()),
        ("fontSize", p.font_size.is_some()),
        ("fontFamily", p.font_family.is_some()),
        ("fontWeight", p.font_weight.is_some()),
        ("align", p.align.is_some()),
        ("lineHeight", p.line_height.is_some()),
        ("shadow", p.shadow.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, set)| set.then_some(name))
}

fn solid(fill: &Fill, kind: &str) -> Result<String, AppError> {
    match fill {
        Fill::Solid(color) => Ok(color.clone()),
        Fill::Gradient(_) => Err(AppError::invalid(format!(
            "{kind} elements only accept a solid fill"
        ))),
    }
}

fn apply_style(element: &mut Element, p: &StyleParams) -> Result<(), AppError> {
    let kind = element.kind();
    let allowed = style_fields(element);
    if let Some(field) = present_fields(p).find(|f| !allowed.contains(f)) {
        return Err(AppError::invalid(format!(
            "{field} does not apply to {kind} elements"
        )));
    }

    let stroke_width = p.stroke_width.map(|w| common::stroke_width(Some(w), 0.0)).transpose()?;
    if let Some(r) = p.corner_radius {
        validate_finite(r, "Corner radius")?;
    }
    if let Some(size) = p.font_size {
        validate_positive_finite(size, "Font size")?;
    }
    if let Some(lh) = p.line_height {
        validate_positive_finite(lh, "Line height")?;
    }
    let align = p.align.as_deref().map(parse_align).transpose()?;
    if let Some(o) = p.opacity {
        element.base_mut().opacity = common::opacity(o)?;
    }

    match element {
        Element::Rect(rect) => {
            if let Some(fill) = &p.fill {
                rect.fill = fill.clone();
            }
            if let Some(stroke) = &p.stroke {
                rect.stroke.clone_from(stroke);
            }
            if let Some(w) = stroke_width {
                rect.stroke_width = w;
            }
            if let Some(r) = p.corner_radius {
                rect.corner_radius = r;
            }
            if let Some(shadow) = &p.box_shadow {
                rect.box_shadow = Some(shadow.clone());
            }
        }
        Element::Ellipse(ellipse) => {
            if let Some(fill) = &p.fill {
                ellipse.fill = fill.clone();
            }
            if let Some(stroke) = &p.stroke {
                ellipse.stroke.clone_from(stroke);
            }
            if let Some(w) = stroke_width {
                ellipse.stroke_width = w;
            }
            if let Some(shadow) = &p.box_shadow {
                ellipse.box_shadow = Some(shadow.clone());
            }
        }
        Element::Text(text) => {
            if let Some(fill) = &p.fill {
                text.fill = solid(fill, kind)?;
            }
            if let Some(size) = p.font_size {
                text.font_size = size;
            }
            if let Some(family) = &p.font_family {
                text.font_family.clone_from(family);
            }
            if let Some(weight) = &p.font_weight {
                text.font_weight.clone_from(weight);
            }
            if let Some(align) = align {
                text.align = align;
            }
            if let Some(lh) = p.line_height {
                text.line_height = lh;
            }
            if let Some(shadow) = &p.shadow {
                text.shadow = Some(shadow.clone());
            }
        }
        Element::Image(image) => {
            if let Some(r) = p.corner_radius {
                image.corner_radius = Some(r);
            }
        }
        Element::Line(line) => {
            if let Some(stroke) = &p.stroke {
                line.stroke.clone_from(stroke);
            }
            if let Some(w) = stroke_width {
                line.stroke_width = w;
            }
        }
        Element::Path(path) => {
            if let Some(fill) = &p.fill {
                path.fill = solid(fill, kind)?;
            }
            if let Some(stroke) = &p.stroke {
                path.stroke.clone_from(stroke);
            }
            if let Some(w) = stroke_width {
                path.stroke_width = w;
            }
        }
        Element::Group(_) => {}
    }
    Ok(())
}

pub fn style(store: &mut DocumentStore, p: StyleParams) -> Result<CommandOutput, AppError> {
    store.mutate(|doc| apply_style(common::element_mut(doc, &p.element_id)?, &p))?;
    Ok(CommandOutput::unit("Styled element."))
}

pub fn delete(store: &mut DocumentStore, p: ElementRef) -> Result<CommandOutput, AppError> {
    let kind = store.mutate(|doc| {
        let (siblings, index) = doc
            .element_slot_mut(&p.element_id)
            .ok_or_else(|| AppError::element_not_found(&p.element_id))?;
        Ok(siblings.remove(index).kind())
    })?;
    Ok(CommandOutput::unit(format!("Deleted {kind}.")))
}

/// Copies next to the original (same layer or group), on top of its siblings.
pub fn duplicate(store: &mut DocumentStore, p: ElementRef) -> Result<CommandOutput, AppError> {
    let element_id = store.mutate(|doc| {
        let not_found = || AppError::element_not_found(&p.element_id);
        let (siblings, index) = doc.element_slot_mut(&p.element_id).ok_or_else(not_found)?;
        let mut copy = siblings.get(index).cloned().ok_or_else(not_found)?;
        copy.reassign_ids();
        translate(&mut copy, DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        let id = copy.id().to_string();
        siblings.push(copy);
        Ok(id)
    })?;
    Ok(CommandOutput::data("Duplicated element.", CommandData::Element { element_id }))
}
