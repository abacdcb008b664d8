//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::MemoryCache;
use crate::coalesce::CoalescingCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
    StatsResponse,
};
use crate::origin::Origin;

/// Coalescing cache served by the HTTP surface.
pub type ServerCache = CoalescingCache<MemoryCache<String, String>, Origin>;

/// Application state shared across all handlers.
///
/// The cache is internally reference counted and synchronized, so cloning
/// the state is cheap and every handler sees the same in-flight table.
#[derive(Clone)]
pub struct AppState {
    /// Coalescing cache in front of the origin
    pub cache: ServerCache,
}

impl AppState {
    /// Creates a new AppState fetching from the given origin.
    pub fn new(origin: Origin) -> Self {
        Self {
            cache: CoalescingCache::new(MemoryCache::new(), origin),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Origin::from_config(config))
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair directly in the backing cache.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set(req.key.clone(), req.value)?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Serves the key from the cache, fetching it from the origin on a miss.
/// Concurrent requests for the same missing key wait on one origin call.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let value = state.cache.get(key.clone())?.await?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Expires a key so that the next lookup fetches it again.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.delete(&key)? {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /stats
///
/// Returns lookup statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    Ok(Json(StatsResponse::new(
        state.cache.stats(),
        state.cache.backend().len()?,
        state.cache.fetcher().calls(),
    )))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
