use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::extraction::ProfileExtractor;
use crate::llm_client::LlmClient;
use crate::screening::repository::ResumeArchive;

/// Shared application state injected into all route handlers via Axum extractors.
/// Storage collaborators are optional; `None` means the feature is disabled.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Option<PgPool>,
    /// Used here only for health checks; the extraction cache holds its own client.
    pub redis: Option<RedisClient>,
    pub archive: Option<ResumeArchive>,
    /// Present when the LLM extraction backend is active.
    pub llm: Option<LlmClient>,
    /// Profile extraction backend, possibly wrapped in the Redis cache.
    pub extractor: Arc<dyn ProfileExtractor>,
}
