use serde::{Deserialize, Serialize};

use super::element::Element;
use super::new_id;

pub const DEFAULT_CANVAS_WIDTH: f64 = 1920.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 1080.0;
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct CanvasSettings {
    pub width: f64,
    pub height: f64,
    pub background: String,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

/// A paint-ordered list of elements with visibility/lock/opacity flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// 0-100.
    pub opacity: f64,
    pub elements: Vec<Element>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            visible: true,
            locked: false,
            opacity: 100.0,
            elements: Vec::new(),
        }
    }
}

/// The root aggregate mutated by commands. Owned by the host; clients only
/// ever see serialized copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct Document {
    pub id: String,
    pub name: String,
    pub canvas: CanvasSettings,
    pub layers: Vec<Layer>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(CanvasSettings::default())
    }
}

impl Document {
    /// A fresh untitled document with a single empty layer.
    pub fn new(canvas: CanvasSettings) -> Self {
        Self {
            id: new_id(),
            name: "Untitled".to_string(),
            canvas,
            layers: vec![Layer::new("Layer 1")],
        }
    }

    /// The first layer, by current order, that is not locked. New elements go here.
    pub fn first_unlocked_layer_mut(&mut self) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| !l.locked)
    }

    pub fn layer_mut(&mut self, layer_id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == layer_id)
    }

    /// Find an element by id at any depth, including inside groups.
    pub fn element(&self, element_id: &str) -> Option<&Element> {
        self.layers.iter().find_map(|l| find_in(&l.elements, element_id))
    }

    pub fn element_mut(&mut self, element_id: &str) -> Option<&mut Element> {
        self.layers
            .iter_mut()
            .find_map(|l| find_in_mut(&mut l.elements, element_id))
    }

    /// The list that directly holds `element_id` (a layer's elements or a
    /// group's children) and the element's index in it.
    pub fn element_slot_mut(&mut self, element_id: &str) -> Option<(&mut Vec<Element>, usize)> {
        self.layers
            .iter_mut()
            .find_map(|l| slot_in(&mut l.elements, element_id))
    }

    /// Top-level elements across all layers; group children are not counted.
    pub fn element_count(&self) -> usize {
        self.layers.iter().map(|l| l.elements.len()).sum()
    }
}

fn find_in<'a>(elements: &'a [Element], id: &str) -> Option<&'a Element> {
    elements.iter().find_map(|e| match e {
        _ if e.id() == id => Some(e),
        Element::Group(group) => find_in(&group.children, id),
        _ => None,
    })
}

fn find_in_mut<'a>(elements: &'a mut [Element], id: &str) -> Option<&'a mut Element> {
    elements.iter_mut().find_map(|e| {
        if e.id() == id {
            Some(e)
        } else if let Element::Group(group) = e {
            find_in_mut(&mut group.children, id)
        } else {
            None
        }
    })
}

fn slot_in<'a>(elements: &'a mut Vec<Element>, id: &str) -> Option<(&'a mut Vec<Element>, usize)> {
    let found = elements.iter().position(|e| e.id() == id);
    match found {
        Some(index) => Some((elements, index)),
        None => elements.iter_mut().find_map(|e| match e {
            Element::Group(group) => slot_in(&mut group.children, id),
            _ => None,
        }),
    }
}
