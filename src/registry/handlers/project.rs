use tracing::info;

use crate::error::AppError;
use crate::project::parse_document;
use crate::registry::params::ProjectFileParams;
use crate::registry::{CommandData, CommandOutput};
use crate::state::HostState;

pub async fn save(state: &mut HostState, p: ProjectFileParams) -> Result<CommandOutput, AppError> {
    let services = state.services.clone();
    let path = services
        .persist(state.store.document(), p.file_path.as_deref())
        .await?;
    let message = match &path {
        Some(path) => format!("Saved document to {path}."),
        None => "Save cancelled.".to_string(),
    };
    Ok(CommandOutput::data(message, CommandData::File { path }))
}

/// Replace the live document with a stored one. History starts over.
pub async fn load(state: &mut HostState, p: ProjectFileParams) -> Result<CommandOutput, AppError> {
    let services = state.services.clone();
    let retrieved = services.retrieve(p.file_path.as_deref()).await?;
    let document = parse_document(&retrieved.content)?;
    info!(event = "document_loaded", path = %retrieved.path, layers = document.layers.len());
    state.store.replace(document);
    Ok(CommandOutput::data(
        format!("Loaded document from {}.", retrieved.path),
        CommandData::File {
            path: Some(retrieved.path),
        },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::registry::handlers::shape;
    use crate::registry::params::RectangleParams;
    use crate::services::fake::FakeServices;

    #[tokio::test]
    async fn save_then_load_restores_document_and_clears_history() {
        let mut state = HostState::new(Arc::new(FakeServices::default()), 50);
        shape::rectangle(&mut state.store, RectangleParams::default()).unwrap();
        let saved = state.store.document().clone();
        let out = save(&mut state, ProjectFileParams::default()).await.unwrap();
        assert_eq!(out.data, CommandData::File { path: Some("document.json".into()) });

        shape::rectangle(&mut state.store, RectangleParams::default()).unwrap();
        assert_eq!(state.store.document().element_count(), 2);

        load(&mut state, ProjectFileParams::default()).await.unwrap();
        assert_eq!(state.store.document(), &saved);
        assert!(!state.store.undo_state().can_undo);
    }

    #[tokio::test]
    async fn cancelled_save_returns_null_path() {
        let mut state = HostState::new(Arc::new(FakeServices { cancel_save: true, ..Default::default() }), 50);
        let out = save(&mut state, ProjectFileParams::default()).await.unwrap();
        assert_eq!(out.into_value().unwrap(), serde_json::json!({ "path": null }));
    }

    #[tokio::test]
    async fn load_missing_document_fails() {
        let mut state = HostState::new(Arc::new(FakeServices::default()), 50);
        let err = load(&mut state, ProjectFileParams { file_path: Some("x.json".into()) }).await.unwrap_err();
        assert!(matches!(err, AppError::Persistence { .. }));
    }

    #[tokio::test]
    async fn load_rejects_duplicate_ids_and_keeps_current_document() {
        let mut on_disk = crate::model::Document::default();
        let mut twin = crate::model::Layer::new("Twin");
        twin.id.clone_from(&on_disk.layers[0].id);
        on_disk.layers.push(twin);
        let content = crate::project::serialize_document(&on_disk).unwrap();
        let services = FakeServices {
            saved: parking_lot::Mutex::new(vec![("dup.json".into(), content)]),
            ..Default::default()
        };
        let mut state = HostState::new(Arc::new(services), 50);
        shape::rectangle(&mut state.store, RectangleParams::default()).unwrap();
        let current = state.store.document().clone();

        let err = load(&mut state, ProjectFileParams { file_path: Some("dup.json".into()) }).await.unwrap_err();
        assert!(err.to_string().contains("duplicate layer id"));
        assert_eq!(state.store.document(), &current);
        assert!(state.store.undo_state().can_undo);
    }
}
