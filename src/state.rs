use std::sync::Arc;

use crate::model::Document;
use crate::services::HostServices;
use crate::store::DocumentStore;

// ── Host State ─────────────────────────────────────────────────────

/// Everything a command can touch. Owned exclusively by the host's dispatch
/// actor, so handlers take `&mut` and never lock.
pub struct HostState {
    pub store: DocumentStore,
    pub services: Arc<dyn HostServices>,
}

impl HostState {
    pub fn new(services: Arc<dyn HostServices>, history_limit: usize) -> Self {
        Self {
            store: DocumentStore::new(Document::default(), history_limit),
            services,
        }
    }
}

impl std::fmt::Debug for HostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostState")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
