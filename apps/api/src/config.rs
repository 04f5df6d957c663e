use anyhow::{bail, Context, Result};
use std::str::FromStr;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which `ProfileExtractor` implementation the service runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionBackend {
    Llm,
    Rules,
}

impl ExtractionBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionBackend::Llm => "llm",
            ExtractionBackend::Rules => "rules",
        }
    }
}

impl FromStr for ExtractionBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(ExtractionBackend::Llm),
            "rules" => Ok(ExtractionBackend::Rules),
            other => bail!("unknown extraction backend '{other}' (expected 'llm' or 'rules')"),
        }
    }
}

/// Object storage settings. Present only when `S3_BUCKET` is set.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Storage collaborators are optional; missing ones are reported as disabled.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub extraction_backend: ExtractionBackend,
    pub anthropic_api_key: Option<String>,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub cache_ttl_secs: u64,
    pub s3: Option<S3Settings>,
    pub max_upload_bytes: usize,
    pub batch_max_files: usize,
    pub batch_concurrency: usize,
    pub batch_deadline_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parses configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let anthropic_api_key = get("ANTHROPIC_API_KEY");
        let extraction_backend = match get("EXTRACTION_BACKEND") {
            Some(raw) => raw.parse::<ExtractionBackend>()?,
            None if anthropic_api_key.is_some() => ExtractionBackend::Llm,
            None => ExtractionBackend::Rules,
        };
        if extraction_backend == ExtractionBackend::Llm && anthropic_api_key.is_none() {
            bail!("EXTRACTION_BACKEND=llm requires ANTHROPIC_API_KEY to be set");
        }

        let s3 = match get("S3_BUCKET") {
            Some(bucket) => Some(S3Settings {
                bucket,
                endpoint: require(&get, "S3_ENDPOINT")?,
                access_key_id: require(&get, "AWS_ACCESS_KEY_ID")?,
                secret_access_key: require(&get, "AWS_SECRET_ACCESS_KEY")?,
            }),
            None => None,
        };

        let config = Config {
            port: parse_or(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            extraction_backend,
            anthropic_api_key,
            database_url: get("DATABASE_URL"),
            redis_url: get("REDIS_URL"),
            cache_ttl_secs: parse_or(&get, "CACHE_TTL_SECS", 300)?,
            s3,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            batch_max_files: parse_or(&get, "BATCH_MAX_FILES", 20)?,
            batch_concurrency: parse_or(&get, "BATCH_CONCURRENCY", 4)?,
            batch_deadline_secs: parse_or(&get, "BATCH_DEADLINE_SECS", 120)?,
        };

        if config.batch_max_files == 0 {
            bail!("BATCH_MAX_FILES must be at least 1");
        }
        if config.batch_concurrency == 0 {
            bail!("BATCH_CONCURRENCY must be at least 1");
        }

        Ok(config)
    }
}

fn require<G>(get: &G, key: &str) -> Result<String>
where
    G: Fn(&str) -> Option<String>,
{
    get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> Result<T>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
