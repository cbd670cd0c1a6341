use async_trait::async_trait;
use content_core::{CacheConfig, CacheError, CacheFactory, ContentCache};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

use crate::repository::SqliteContentCache;

/// Turn a configured connection string into a sqlx URL.
///
/// * `":memory:"` → `sqlite::memory:`
/// * a `sqlite:` URL is used as is
/// * anything else is a file path, created if missing
///
/// ```
/// use content_db_sqlite::connection_url;
///
/// assert_eq!(connection_url(":memory:"), "sqlite::memory:");
/// assert_eq!(connection_url("cache.db"), "sqlite:cache.db?mode=rwc");
/// assert_eq!(connection_url("sqlite:x.db"), "sqlite:x.db");
/// ```
pub fn connection_url(connection_string: &str) -> String {
    match connection_string {
        ":memory:" => "sqlite::memory:".to_string(),
        url if url.starts_with("sqlite:") => url.to_string(),
        path => format!("sqlite:{}?mode=rwc", path),
    }
}

/// [`CacheFactory`] for SQLite.
///
/// ```rust,no_run
/// use content_core::CacheRegistry;
/// use content_db_sqlite::SqliteCacheFactory;
///
/// let mut registry = CacheRegistry::new();
/// registry.register(Box::new(SqliteCacheFactory));
/// ```
pub struct SqliteCacheFactory;

#[async_trait]
impl CacheFactory for SqliteCacheFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database and run migrations. An in-memory database is held
    /// on a single connection that is never recycled, since every new
    /// connection would see an empty database.
    async fn create(
        &self,
        config: &CacheConfig,
    ) -> Result<Box<dyn ContentCache>, CacheError> {
        let url = connection_url(&config.connection_string);

        let cache = if url == "sqlite::memory:" {
            let pool = SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(&url)
                .await
                .map_err(|e| CacheError::Connection(e.to_string()))?;
            SqliteContentCache::new_with_pool(pool).await
        } else {
            SqliteContentCache::new(&url)
                .await
                .map_err(|e| CacheError::Connection(format!("{e:#}")))?
        };

        cache
            .run_migrations()
            .await
            .map_err(|e| CacheError::Database(format!("{e:#}")))?;

        info!(url = %url, "Opened SQLite content cache");
        Ok(Box::new(cache))
    }
}

#[cfg(test)]
mod tests {
    use content_core::{ContentCacheEntry, ContentKey, ContentType};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteCacheFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_working_in_memory_cache() {
        let config = CacheConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        };

        let cache = SqliteCacheFactory
            .create(&config)
            .await
            .expect("failed to create in-memory cache");

        let entry = ContentCacheEntry {
            key: ContentKey::new("Leeds", "Audit", ContentType::MetaTitle),
            content: "Audit in Leeds".to_string(),
            created_at: chrono::Utc::now(),
            expires_at: None,
        };
        cache.put(&entry).await.unwrap();

        let found = cache.get(&entry.key).await.unwrap();
        assert_eq!(found.map(|e| e.content), Some("Audit in Leeds".to_string()));
    }

    #[tokio::test]
    async fn unreachable_path_is_connection_error() {
        let config = CacheConfig {
            backend: "sqlite".to_string(),
            connection_string: "/nonexistent-dir/for/sure/cache.db".to_string(),
        };

        let result = SqliteCacheFactory.create(&config).await;

        assert!(matches!(result, Err(CacheError::Connection(_))));
    }
}
