//! Redis-backed cache in front of any `ProfileExtractor`.
//!
//! Extraction is the only expensive step of an evaluation, and the same job description is
//! typically screened against many resumes. Keys hash the document text, so identical uploads
//! share one extraction regardless of filename.

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::future::Future;

use crate::errors::AppError;
use crate::extraction::ProfileExtractor;
use crate::screening::models::{CandidateProfile, JobProfile};

const KEY_PREFIX: &str = "screener:profile";

#[derive(Debug, thiserror::Error)]
enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct CachedExtractor<E> {
    inner: E,
    client: Client,
    ttl_secs: u64,
}

impl<E: ProfileExtractor> CachedExtractor<E> {
    pub fn new(inner: E, client: Client, ttl_secs: u64) -> Self {
        Self {
            inner,
            client,
            ttl_secs,
        }
    }

    async fn cached<T, F, Fut>(&self, kind: &str, text: &str, extract: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let key = cache_key(kind, self.inner.backend(), text);

        match self.get::<T>(&key).await {
            Ok(Some(profile)) => {
                tracing::debug!(kind, "Profile cache hit");
                return Ok(profile);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(kind, error = %e, "Profile cache read failed, bypassing"),
        }

        // Failed extractions are never cached.
        let profile = extract().await?;

        if let Err(e) = self.set(&key, &profile).await {
            tracing::warn!(kind, error = %e, "Profile cache write failed");
        }
        Ok(profile)
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let data: Option<String> = conn.get(key).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize>(&self, key: &str, data: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string(data)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, json, self.ttl_secs).await?;
        tracing::debug!(key, ttl = self.ttl_secs, "Cached profile");
        Ok(())
    }
}

#[async_trait]
impl<E: ProfileExtractor> ProfileExtractor for CachedExtractor<E> {
    async fn extract_candidate(&self, text: &str) -> Result<CandidateProfile, AppError> {
        self.cached("candidate", text, || self.inner.extract_candidate(text))
            .await
    }

    async fn extract_job(&self, text: &str) -> Result<JobProfile, AppError> {
        self.cached("job", text, || self.inner.extract_job(text)).await
    }

    fn backend(&self) -> &'static str {
        self.inner.backend()
    }
}

/// `screener:profile:{kind}:{backend}:{sha256(text) hex}`
pub fn cache_key(kind: &str, backend: &str, text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{KEY_PREFIX}:{kind}:{backend}:{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::RuleBasedExtractor;

    #[test]
    fn test_cache_key_shape() {
        let key = cache_key("job", "rules", "abc");
        assert_eq!(
            key,
            "screener:profile:job:rules:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_cache_key_separates_kind_and_backend() {
        let text = "Senior Rust engineer";
        assert_ne!(cache_key("job", "rules", text), cache_key("candidate", "rules", text));
        assert_ne!(cache_key("job", "rules", text), cache_key("job", "llm", text));
        assert_eq!(cache_key("job", "llm", text), cache_key("job", "llm", text));
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_bypassed() {
        // Nothing listens on port 1; every cache call fails and extraction still succeeds.
        let client = Client::open("redis://127.0.0.1:1/").unwrap();
        let cached = CachedExtractor::new(RuleBasedExtractor, client, 60);
        let jd = "Requirements: 3+ years of experience with Rust and PostgreSQL. \
                  Responsibilities: build backend services.";
        let profile = cached.extract_job(jd).await.unwrap();
        assert!(!profile.mandatory_skills.is_empty());
        assert_eq!(cached.backend(), "rules");
    }
}
