use std::sync::Arc;

use crate::config::Config;
use crate::db::Db;
use crate::llm_client::LanguageModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    /// Chat and embedding backend. `OpenAiClient` in production.
    pub llm: Arc<dyn LanguageModel>,
    pub config: Config,
}
