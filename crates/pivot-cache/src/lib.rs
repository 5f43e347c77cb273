//! Cache layer for per-source lookup results
//!
//! Content-addressed, bounded by entry count and TTL. The backend is
//! pluggable behind the [`Cache`] trait; the in-process default is an LRU
//! map. Backend failures are recoverable: the orchestrator treats a failed
//! `get` as a miss and a failed `set` as a no-op.

/// Content-addressed cache keys
pub mod key;
/// In-memory LRU backend
pub mod memory;

pub use key::CacheKey;
pub use memory::MemoryCache;

use async_trait::async_trait;
use pivot_core::PivotError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The cache backend is unreachable or misbehaving
#[derive(Debug, Error)]
#[error("cache backend: {0}")]
pub struct CacheBackendError(pub String);

impl From<CacheBackendError> for PivotError {
    fn from(err: CacheBackendError) -> Self {
        PivotError::CacheBackend(err.0)
    }
}

/// Pluggable store for per-source lookup results
///
/// `get` never returns an expired payload; expiry is enforced on read.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Look up a live entry; expired entries report absent
    async fn get(&self, key: &CacheKey) -> Result<Option<Arc<Value>>, CacheBackendError>;

    /// Store a payload; `ttl` of `None` uses the backend's default
    async fn set(
        &self,
        key: CacheKey,
        payload: Arc<Value>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheBackendError>;

    /// Drop an entry if present
    async fn invalidate(&self, key: &CacheKey) -> Result<(), CacheBackendError>;
}
