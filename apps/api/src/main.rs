mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod screening;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, ExtractionBackend, S3Settings};
use crate::db::create_pool;
use crate::extraction::{CachedExtractor, LlmProfileExtractor, ProfileExtractor, RuleBasedExtractor};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::repository::ResumeArchive;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on invalid values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (optional)
    let db = match &config.database_url {
        Some(url) => Some(create_pool(url).await?),
        None => {
            warn!("DATABASE_URL not set, screenings will not be persisted");
            None
        }
    };

    // Initialize Redis (optional)
    let redis = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Redis client initialized (profile cache TTL {}s)", config.cache_ttl_secs);
            Some(client)
        }
        None => None,
    };

    // Initialize S3 / MinIO (optional)
    let archive = match &config.s3 {
        Some(settings) => {
            let client = build_s3_client(settings).await;
            info!("S3 client initialized (bucket: {})", settings.bucket);
            Some(ResumeArchive::new(client, settings.bucket.clone()))
        }
        None => None,
    };

    // Initialize LLM client when the LLM backend is selected
    let llm = match (config.extraction_backend, &config.anthropic_api_key) {
        (ExtractionBackend::Llm, Some(key)) => {
            let llm = LlmClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(llm)
        }
        _ => None,
    };

    let extractor = build_extractor(&config, llm.clone(), redis.clone());
    info!("Profile extraction backend: {}", extractor.backend());

    let state = AppState {
        config: config.clone(),
        db,
        redis,
        archive,
        llm,
        extractor,
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Picks the extraction backend and wraps it in the Redis cache when one is configured.
fn build_extractor(
    config: &Config,
    llm: Option<LlmClient>,
    redis: Option<redis::Client>,
) -> Arc<dyn ProfileExtractor> {
    let ttl = config.cache_ttl_secs;
    match (llm, redis) {
        (Some(llm), Some(redis)) => Arc::new(CachedExtractor::new(LlmProfileExtractor::new(llm), redis, ttl)),
        (Some(llm), None) => Arc::new(LlmProfileExtractor::new(llm)),
        (None, Some(redis)) => Arc::new(CachedExtractor::new(RuleBasedExtractor, redis, ttl)),
        (None, None) => Arc::new(RuleBasedExtractor),
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(settings: &S3Settings) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &settings.access_key_id,
        &settings.secret_access_key,
        None,
        None,
        "screener-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&settings.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
