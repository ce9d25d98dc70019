#![allow(clippy::needless_pass_by_value)]

use crate::error::AppError;
use crate::model::Layer;
use crate::registry::params::{
    CreateLayerParams, LayerLockParams, LayerOpacityParams, LayerRef, LayerVisibilityParams,
    ReorderLayerParams,
};
use crate::registry::{CommandData, CommandOutput};
use crate::store::DocumentStore;

use super::common;

/// New layers go on top, which is the front of the list.
pub fn create(store: &mut DocumentStore, p: CreateLayerParams) -> Result<CommandOutput, AppError> {
    let layer_id = store.mutate(|doc| {
        let layer = Layer::new(p.name.clone());
        let id = layer.id.clone();
        doc.layers.insert(0, layer);
        Ok(id)
    })?;
    Ok(CommandOutput::data(
        format!("Created layer \"{}\".", p.name),
        CommandData::Layer { layer_id },
    ))
}

pub fn delete(store: &mut DocumentStore, p: LayerRef) -> Result<CommandOutput, AppError> {
    let name = store.mutate(|doc| {
        let index = doc
            .layers
            .iter()
            .position(|l| l.id == p.layer_id)
            .ok_or_else(|| AppError::layer_not_found(&p.layer_id))?;
        if doc.layers.len() <= 1 {
            return Err(AppError::invalid("Cannot delete the last layer"));
        }
        Ok(doc.layers.remove(index).name)
    })?;
    Ok(CommandOutput::unit(format!("Deleted layer \"{name}\".")))
}

/// Out-of-range indices clamp to the ends of the stack.
pub fn reorder(store: &mut DocumentStore, p: ReorderLayerParams) -> Result<CommandOutput, AppError> {
    let index = store.mutate(|doc| {
        let current = doc
            .layers
            .iter()
            .position(|l| l.id == p.layer_id)
            .ok_or_else(|| AppError::layer_not_found(&p.layer_id))?;
        let layer = doc.layers.remove(current);
        let index = p.new_index.min(doc.layers.len());
        doc.layers.insert(index, layer);
        Ok(index)
    })?;
    Ok(CommandOutput::unit(format!("Moved layer to index {index}.")))
}

pub fn set_visibility(
    store: &mut DocumentStore,
    p: LayerVisibilityParams,
) -> Result<CommandOutput, AppError> {
    store.mutate(|doc| {
        common::layer_mut(doc, &p.layer_id)?.visible = p.visible;
        Ok(())
    })?;
    let state = if p.visible { "visible" } else { "hidden" };
    Ok(CommandOutput::unit(format!("Layer is now {state}.")))
}

pub fn set_opacity(store: &mut DocumentStore, p: LayerOpacityParams) -> Result<CommandOutput, AppError> {
    let opacity = common::opacity(p.opacity)?;
    store.mutate(|doc| {
        common::layer_mut(doc, &p.layer_id)?.opacity = opacity;
        Ok(())
    })?;
    Ok(CommandOutput::unit(format!("Set layer opacity to {opacity}.")))
}

pub fn lock(store: &mut DocumentStore, p: LayerLockParams) -> Result<CommandOutput, AppError> {
    store.mutate(|doc| {
        common::layer_mut(doc, &p.layer_id)?.locked = p.locked;
        Ok(())
    })?;
    let state = if p.locked { "locked" } else { "unlocked" };
    Ok(CommandOutput::unit(format!("Layer is now {state}.")))
}
