use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ContentCacheEntry, ContentKey};

/// Any failure talking to the cache store. The pipeline degrades on these
/// rather than failing the request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Key-value store for generated content.
#[async_trait]
pub trait ContentCache: Send + Sync {
    /// Fetch the stored entry for `key`, expired or not. Callers decide
    /// liveness with [`ContentCacheEntry::is_live`].
    async fn get(
        &self,
        key: &ContentKey,
    ) -> Result<Option<ContentCacheEntry>, CacheError>;

    /// Store `entry`, replacing whatever was stored under the same key.
    async fn put(
        &self,
        entry: &ContentCacheEntry,
    ) -> Result<(), CacheError>;
}
