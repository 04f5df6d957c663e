use std::future::Future;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::db;
use crate::state::AppState;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// GET /health
/// Liveness only. Never touches a collaborator.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "screener-api"
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Ok,
    Unreachable,
    Disabled,
}

#[derive(Debug, Serialize)]
pub struct Components {
    pub extraction: ComponentStatus,
    pub database: ComponentStatus,
    pub cache: ComponentStatus,
    pub object_storage: ComponentStatus,
}

impl Components {
    fn degraded(&self) -> bool {
        [self.extraction, self.database, self.cache, self.object_storage]
            .contains(&ComponentStatus::Unreachable)
    }
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    pub version: &'static str,
    pub extraction_backend: &'static str,
    pub components: Components,
}

/// GET /api/v1/health
/// 503 when any configured collaborator is unreachable.
pub async fn components_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<ComponentHealth>) {
    let (extraction, database, cache, object_storage) = tokio::join!(
        check("extraction", state.llm.as_ref().map(|llm| llm.ping())),
        check("database", state.db.as_ref().map(db::ping)),
        check("cache", state.redis.as_ref().map(redis_ping)),
        check("object_storage", state.archive.as_ref().map(|a| a.ping())),
    );

    // The rule-based backend is in-process and always available.
    let extraction = match extraction {
        ComponentStatus::Disabled => ComponentStatus::Ok,
        other => other,
    };

    let components = Components {
        extraction,
        database,
        cache,
        object_storage,
    };
    let degraded = components.degraded();
    let body = ComponentHealth {
        status: if degraded { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        extraction_backend: state.extractor.backend(),
        components,
    };
    let code = if degraded {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(body))
}

async fn check<F, T, E>(name: &str, probe: Option<F>) -> ComponentStatus
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let Some(probe) = probe else {
        return ComponentStatus::Disabled;
    };
    match tokio::time::timeout(CHECK_TIMEOUT, probe).await {
        Ok(Ok(_)) => ComponentStatus::Ok,
        Ok(Err(e)) => {
            warn!(component = name, error = %e, "Health check failed");
            ComponentStatus::Unreachable
        }
        Err(_) => {
            warn!(component = name, "Health check timed out");
            ComponentStatus::Unreachable
        }
    }
}

async fn redis_ping(client: &redis::Client) -> redis::RedisResult<String> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    redis::cmd("PING").query_async(&mut conn).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_probe_is_disabled() {
        let status = check::<std::future::Ready<Result<(), String>>, (), String>("x", None).await;
        assert_eq!(status, ComponentStatus::Disabled);
    }

    #[tokio::test]
    async fn test_failing_probe_is_unreachable() {
        let probe = async { Err::<(), _>("connection refused") };
        assert_eq!(check("db", Some(probe)).await, ComponentStatus::Unreachable);
        let probe = async { Ok::<_, String>(()) };
        assert_eq!(check("db", Some(probe)).await, ComponentStatus::Ok);
    }

    #[test]
    fn test_degraded_only_on_unreachable() {
        let mut components = Components {
            extraction: ComponentStatus::Ok,
            database: ComponentStatus::Disabled,
            cache: ComponentStatus::Disabled,
            object_storage: ComponentStatus::Disabled,
        };
        assert!(!components.degraded());
        components.cache = ComponentStatus::Unreachable;
        assert!(components.degraded());
        assert_eq!(serde_json::to_value(ComponentStatus::Unreachable).unwrap(), "unreachable");
    }
}
