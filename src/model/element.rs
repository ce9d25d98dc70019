use serde::{Deserialize, Serialize};

use super::new_id;

/// Positional and transform attributes shared by every element variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct ElementBase {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    /// 0-100.
    pub opacity: f64,
}

impl ElementBase {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: new_id(),
            x,
            y,
            width,
            height,
            rotation: 0.0,
            opacity: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct GradientStop {
    pub color: String,
    /// 0-100.
    pub position: f64,
}

/// A solid color string, or a linear/radial gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub enum Fill {
    Solid(String),
    Gradient(Gradient),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub enum Gradient {
    /// `angle` in degrees, 0 = left-to-right, 90 = top-to-bottom.
    Linear { angle: f64, stops: Vec<GradientStop> },
    /// Center in percent of the element box.
    Radial {
        cx: f64,
        cy: f64,
        stops: Vec<GradientStop>,
    },
}

impl From<&str> for Fill {
    fn from(s: &str) -> Self {
        Fill::Solid(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct TextShadow {
    pub x: f64,
    pub y: f64,
    pub blur: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct BoxShadow {
    pub x: f64,
    pub y: f64,
    pub blur: f64,
    pub spread: f64,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inset: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Parse a wire value, rejecting anything outside left/center/right.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct RectElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub fill: Fill,
    pub stroke: String,
    pub stroke_width: f64,
    pub corner_radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_shadow: Option<BoxShadow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct EllipseElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub fill: Fill,
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_shadow: Option<BoxShadow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct TextElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub content: String,
    pub font_size: f64,
    pub font_family: String,
    pub font_weight: String,
    pub fill: String,
    pub align: TextAlign,
    pub line_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<TextShadow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct ImageElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub src: String,
    /// Original file path, kept so state reports stay readable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    pub natural_width: f64,
    pub natural_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct LineElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke: String,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct GroupElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub children: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct PathElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub d: String,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

/// A drawable element. The `type` tag is part of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub enum Element {
    Rect(RectElement),
    Ellipse(EllipseElement),
    Text(TextElement),
    Image(ImageElement),
    Line(LineElement),
    Group(GroupElement),
    Path(PathElement),
}

impl Element {
    pub fn base(&self) -> &ElementBase {
        match self {
            Element::Rect(e) => &e.base,
            Element::Ellipse(e) => &e.base,
            Element::Text(e) => &e.base,
            Element::Image(e) => &e.base,
            Element::Line(e) => &e.base,
            Element::Group(e) => &e.base,
            Element::Path(e) => &e.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ElementBase {
        match self {
            Element::Rect(e) => &mut e.base,
            Element::Ellipse(e) => &mut e.base,
            Element::Text(e) => &mut e.base,
            Element::Image(e) => &mut e.base,
            Element::Line(e) => &mut e.base,
            Element::Group(e) => &mut e.base,
            Element::Path(e) => &mut e.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Element::Rect(_) => "rect",
            Element::Ellipse(_) => "ellipse",
            Element::Text(_) => "text",
            Element::Image(_) => "image",
            Element::Line(_) => "line",
            Element::Group(_) => "group",
            Element::Path(_) => "path",
        }
    }

    /// Give this element, and every descendant of a group, a fresh id.
    pub fn reassign_ids(&mut self) {
        self.base_mut().id = new_id();
        if let Element::Group(group) = self {
            for child in &mut group.children {
                child.reassign_ids();
            }
        }
    }
}
