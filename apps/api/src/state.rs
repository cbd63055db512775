use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::generation::settings::GenerationSettings;
use crate::llm_client::ChatModel;
use crate::places::PlacesClient;
use crate::storage::ImageStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Production: `LlmClient`. Tests swap in a scripted model.
    pub llm: Arc<dyn ChatModel>,
    /// `None` when no places API key is configured.
    pub places: Option<PlacesClient>,
    pub images: ImageStore,
    pub settings: GenerationSettings,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
