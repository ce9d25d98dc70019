#![allow(clippy::needless_pass_by_value)]

use crate::error::AppError;
use crate::model::{Element, ElementBase, TextAlign, TextElement};
use crate::registry::params::{TextCreateParams, TextUpdateParams};
use crate::registry::validation::validate_positive_finite;
use crate::registry::{CommandData, CommandOutput};
use crate::store::DocumentStore;

use super::common;

const TEXT_SIZE: (f64, f64) = (400.0, 100.0);
const TEXT_CONTENT: &str = "Text";
const FONT_SIZE: f64 = 24.0;
const FONT_FAMILY: &str = "system-ui";
const FONT_WEIGHT: &str = "normal";
const TEXT_FILL: &str = "#000000";
const LINE_HEIGHT: f64 = 1.2;

pub(crate) fn parse_align(value: &str) -> Result<TextAlign, AppError> {
    TextAlign::parse(value).ok_or_else(|| AppError::invalid(format!("unknown align value \"{value}\"")))
}

pub fn create(store: &mut DocumentStore, p: TextCreateParams) -> Result<CommandOutput, AppError> {
    let (x, y) = common::position(p.x, p.y)?;
    let (width, height) = common::size(p.width, p.height, TEXT_SIZE)?;
    let font_size = p.font_size.unwrap_or(FONT_SIZE);
    validate_positive_finite(font_size, "Font size")?;
    let align = p.align.as_deref().map_or(Ok(TextAlign::Left), parse_align)?;
    let element = Element::Text(TextElement {
        base: ElementBase::new(x, y, width, height),
        content: p.content.unwrap_or_else(|| TEXT_CONTENT.to_string()),
        font_size,
        font_family: p.font_family.unwrap_or_else(|| FONT_FAMILY.to_string()),
        font_weight: p.font_weight.unwrap_or_else(|| FONT_WEIGHT.to_string()),
        fill: p.fill.unwrap_or_else(|| TEXT_FILL.to_string()),
        align,
        line_height: LINE_HEIGHT,
        shadow: p.shadow,
    });
    let element_id = store.mutate(|doc| common::add_element(doc, element))?;
    Ok(CommandOutput::data("Added text.", CommandData::Element { element_id }))
}

/// Text-only fields. Fails on elements that are not text.
pub fn update(store: &mut DocumentStore, p: TextUpdateParams) -> Result<CommandOutput, AppError> {
    let align = p.align.as_deref().map(parse_align).transpose()?;
    if let Some(size) = p.font_size {
        validate_positive_finite(size, "Font size")?;
    }
    if let Some(lh) = p.line_height {
        validate_positive_finite(lh, "Line height")?;
    }
    store.mutate(|doc| {
        let element = common::element_mut(doc, &p.element_id)?;
        let kind = element.kind();
        let Element::Text(text) = element else {
            return Err(AppError::invalid(format!(
                "element \"{}\" is a {kind}, not text",
                p.element_id
            )));
        };
        if let Some(content) = p.content.clone() {
            text.content = content;
        }
        if let Some(size) = p.font_size {
            text.font_size = size;
        }
        if let Some(family) = p.font_family.clone() {
            text.font_family = family;
        }
        if let Some(weight) = p.font_weight.clone() {
            text.font_weight = weight;
        }
        if let Some(fill) = p.fill.clone() {
            text.fill = fill;
        }
        if let Some(align) = align {
            text.align = align;
        }
        if let Some(lh) = p.line_height {
            text.line_height = lh;
        }
        if let Some(shadow) = p.shadow.clone() {
            text.shadow = Some(shadow);
        }
        Ok(())
    })?;
    Ok(CommandOutput::unit("Updated text."))
}
