#![allow(clippy::needless_pass_by_value)]

use crate::error::AppError;
use crate::model::document::DEFAULT_BACKGROUND;
use crate::model::{CanvasSettings, Document};
use crate::registry::params::CreateCanvasParams;
use crate::registry::{CanvasState, CommandData, CommandOutput};
use crate::store::DocumentStore;

use super::common;

/// Start over with a fresh document. History does not survive a new canvas.
pub fn create(store: &mut DocumentStore, p: CreateCanvasParams) -> Result<CommandOutput, AppError> {
    let defaults = CanvasSettings::default();
    let (width, height) = common::size(p.width, p.height, (defaults.width, defaults.height))?;
    let canvas = CanvasSettings {
        width,
        height,
        background: p.background.unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
    };
    store.replace(Document::new(canvas));
    Ok(CommandOutput::unit(format!("Created {width}x{height} canvas.")))
}

pub fn get_state(store: &mut DocumentStore) -> Result<CommandOutput, AppError> {
    let state = CanvasState {
        project: store.document().clone(),
        history: store.undo_state(),
    };
    Ok(CommandOutput::data(
        format!(
            "{} layer(s), {} element(s).",
            state.project.layers.len(),
            state.project.element_count()
        ),
        CommandData::State(Box::new(state)),
    ))
}

pub fn clear(store: &mut DocumentStore) -> Result<CommandOutput, AppError> {
    let removed = store.mutate(|doc| {
        let n = doc.element_count();
        for layer in &mut doc.layers {
            layer.elements.clear();
        }
        Ok(n)
    })?;
    Ok(CommandOutput::unit(format!("Cleared {removed} element(s).")))
}

pub fn export(store: &mut DocumentStore) -> Result<CommandOutput, AppError> {
    Ok(CommandOutput::data(
        "Exported document.",
        CommandData::Document(Box::new(store.document().clone())),
    ))
}
