//! Commands that call out to the rendering and asset collaborators.

use crate::error::AppError;
use crate::model::{Element, ElementBase, ImageElement};
use crate::registry::params::{ExportPngParams, ImportImageParams};
use crate::registry::validation::validate_positive_finite;
use crate::registry::{CommandData, CommandOutput};
use crate::services::Asset;
use crate::state::HostState;

use super::common;

/// Box used when an asset has no readable natural size.
const FALLBACK_IMAGE_SIZE: f64 = 100.0;

async fn capture(state: &mut HostState, scale: Option<f64>) -> Result<CommandOutput, AppError> {
    let scale = scale.unwrap_or(1.0);
    validate_positive_finite(scale, "Scale")?;
    let services = state.services.clone();
    let path = services.capture_visual(state.store.document(), scale).await?;
    Ok(CommandOutput::data(
        format!("Captured canvas to {path}."),
        CommandData::File { path: Some(path) },
    ))
}

pub async fn screenshot(state: &mut HostState, p: ExportPngParams) -> Result<CommandOutput, AppError> {
    capture(state, p.scale).await
}

pub async fn export_png(state: &mut HostState, p: ExportPngParams) -> Result<CommandOutput, AppError> {
    capture(state, p.scale).await
}

/// Resolve the displayed size: explicit values win, a single explicit side
/// keeps the natural aspect ratio, otherwise the natural size is used.
fn image_size(p: &ImportImageParams, asset: &Asset) -> (f64, f64) {
    let natural_w = asset.width.unwrap_or(FALLBACK_IMAGE_SIZE);
    let natural_h = asset.height.unwrap_or(FALLBACK_IMAGE_SIZE);
    match (p.width, p.height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * natural_h / natural_w),
        (None, Some(h)) => (h * natural_w / natural_h, h),
        (None, None) => (natural_w, natural_h),
    }
}

pub async fn import_image(state: &mut HostState, p: ImportImageParams) -> Result<CommandOutput, AppError> {
    let (x, y) = common::position(p.x, p.y)?;
    let services = state.services.clone();
    let asset = services.load_asset(&p.path).await?;
    let (width, height) = image_size(&p, &asset);
    validate_positive_finite(width, "Width")?;
    validate_positive_finite(height, "Height")?;

    let element = Element::Image(ImageElement {
        base: ElementBase::new(x, y, width, height),
        src: asset.data_url,
        source_path: Some(p.path.clone()),
        natural_width: asset.width.unwrap_or(width),
        natural_height: asset.height.unwrap_or(height),
        corner_radius: None,
    });
    let element_id = state.store.mutate(|doc| common::add_element(doc, element))?;
    Ok(CommandOutput::data(
        format!("Imported image {}.", p.path),
        CommandData::Element { element_id },
    ))
}
