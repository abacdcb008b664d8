//! Error types for the coalescing cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Fetch Error Enum ==
/// Failure produced by an origin fetch.
///
/// Cloneable because a single failed fetch is delivered to every caller
/// that shared the in-flight lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The upstream refused or failed to produce a value
    #[error("Upstream error for key '{key}': {reason}")]
    Upstream { key: String, reason: String },
}

// == Cache Error Enum ==
/// Unified error type for the cache backend and HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The origin fetch behind a lookup failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Fetch(_) => StatusCode::BAD_GATEWAY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_converts_into_cache_error() {
        let err: CacheError = FetchError::Upstream {
            key: "k".to_string(),
            reason: "boom".to_string(),
        }
        .into();

        assert!(matches!(err, CacheError::Fetch(_)));
        assert_eq!(err.to_string(), "Upstream error for key 'k': boom");
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (CacheError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (CacheError::Internal("oops".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                CacheError::Fetch(FetchError::Upstream {
                    key: "k".into(),
                    reason: "down".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
