//! API Handlers
//!
//! HTTP request handlers for each cache endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{MetricsSnapshot, TieredCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
};

/// Application state shared across all handlers.
///
/// `TieredCache` is already a shared handle, so no extra locking is needed.
#[derive(Clone)]
pub struct AppState {
    pub cache: TieredCache,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: TieredCache) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration, connecting the
    /// distributed tier if one is configured.
    pub async fn from_config(config: Config) -> Self {
        Self::new(TieredCache::connect(config).await)
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value in both tiers with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl();
    let stored = state.cache.set_value(&req.key, req.value, ttl).await;

    Ok(Json(SetResponse::new(req.key, stored)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get_value(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Responds 404 when neither tier held the key.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.delete(&key).await {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse::new(state.cache.clear().await))
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.cache.metrics())
}

/// Handler for GET /health
///
/// Round-trips a probe value through the cache.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.cache.health_check().await.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::HealthStatus;
    use serde_json::json;

    fn state() -> AppState {
        AppState::new(TieredCache::local_only(Config::default()))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: json!({"name": "Ada", "score": 91}),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.unwrap().stored);

        let response = get_handler(State(state.clone()), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!({"name": "Ada", "score": 91}));
    }

    #[tokio::test]
    async fn test_state_from_config_without_redis() {
        let state = AppState::from_config(Config::default()).await;

        assert!(!state.cache.is_distributed_enabled());
        assert_eq!(state.cache.config().server_port, Config::default().server_port);
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let result = get_handler(State(state()), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = state();

        let req = SetRequest {
            key: "to_delete".to_string(),
            value: json!("value"),
            ttl: None,
        };
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = get_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_err());

        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clear_handler() {
        let state = state();
        state.cache.set("a", &1, None).await;

        let response = clear_handler(State(state.clone())).await;
        assert!(response.cleared);
        assert!(state.cache.local().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_handler() {
        let state = state();
        state.cache.get_value("missing").await;

        let response = metrics_handler(State(state)).await;
        assert_eq!(response.l1.misses, 1);
        assert!(!response.l2.enabled);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(state())).await;
        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.l1_entries, 0);
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let req = SetRequest {
            key: "".to_string(),
            value: json!("value"),
            ttl: None,
        };
        let result = set_handler(State(state()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
