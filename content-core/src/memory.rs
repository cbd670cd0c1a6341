//! Process-local cache, for tests and for running without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheError, ContentCache};
use crate::factory::{CacheConfig, CacheFactory};
use crate::models::{ContentCacheEntry, ContentKey};

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<ContentKey, ContentCacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ContentCache for MemoryCache {
    async fn get(
        &self,
        key: &ContentKey,
    ) -> Result<Option<ContentCacheEntry>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(
        &self,
        entry: &ContentCacheEntry,
    ) -> Result<(), CacheError> {
        self.entries
            .write()
            .await
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }
}

/// [`CacheFactory`] for the `"memory"` backend. The connection string is
/// ignored.
pub struct MemoryCacheFactory;

#[async_trait]
impl CacheFactory for MemoryCacheFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &CacheConfig,
    ) -> Result<Box<dyn ContentCache>, CacheError> {
        Ok(Box::new(MemoryCache::new()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::ContentType;

    fn entry(content: &str) -> ContentCacheEntry {
        ContentCacheEntry {
            key: ContentKey::new("Leeds", "Audit", ContentType::MetaTitle),
            content: content.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 4, 6, 0, 0, 0).unwrap(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let cache = MemoryCache::new();
        let key = ContentKey::new("Leeds", "Audit", ContentType::MetaTitle);

        assert_eq!(cache.get(&key).await, Ok(None));
    }

    #[tokio::test]
    async fn put_then_get_returns_entry() {
        let cache = MemoryCache::new();
        cache.put(&entry("first")).await.unwrap();

        let found = cache.get(&entry("").key).await.unwrap();

        assert_eq!(found.map(|e| e.content), Some("first".to_string()));
    }

    #[tokio::test]
    async fn put_replaces_existing_entry() {
        let cache = MemoryCache::new();
        cache.put(&entry("first")).await.unwrap();
        cache.put(&entry("second")).await.unwrap();

        assert_eq!(cache.len().await, 1);
        let found = cache.get(&entry("").key).await.unwrap();
        assert_eq!(found.map(|e| e.content), Some("second".to_string()));
    }

    #[tokio::test]
    async fn keys_are_case_sensitive() {
        let cache = MemoryCache::new();
        cache.put(&entry("first")).await.unwrap();

        let other = ContentKey::new("leeds", "Audit", ContentType::MetaTitle);

        assert_eq!(cache.get(&other).await, Ok(None));
    }

    #[tokio::test]
    async fn factory_creates_empty_cache() {
        let cache = MemoryCacheFactory
            .create(&CacheConfig::memory())
            .await
            .unwrap();

        let key = ContentKey::new("Hull", "Payroll", ContentType::MainContent);
        assert_eq!(cache.get(&key).await, Ok(None));
    }
}
