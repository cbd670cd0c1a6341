use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use content_core::{CacheError, ContentCache, ContentCacheEntry, ContentKey, ContentType};
use sqlx::{Row, sqlite::SqlitePool};
use tracing::debug;

pub struct SqliteContentCache {
    pool: SqlitePool,
}

impl SqliteContentCache {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Delete every entry whose expiry is at or before `now`. Returns the
    /// number of rows removed.
    pub async fn purge_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, CacheError> {
        let result = sqlx::query(
            "DELETE FROM content_cache
             WHERE expires_at IS NOT NULL AND julianday(expires_at) <= julianday(?)",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::Database(e.to_string()))?;

        debug!(purged = result.rows_affected(), "Purged expired content");
        Ok(result.rows_affected())
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<ContentCacheEntry, CacheError> {
    let type_str: String = row
        .try_get("type")
        .map_err(|e| CacheError::Database(e.to_string()))?;
    let content_type = ContentType::parse(&type_str)
        .ok_or_else(|| CacheError::Database(format!("Invalid content type: {}", type_str)))?;

    Ok(ContentCacheEntry {
        key: ContentKey {
            city: row
                .try_get("city")
                .map_err(|e| CacheError::Database(e.to_string()))?,
            service: row
                .try_get("service")
                .map_err(|e| CacheError::Database(e.to_string()))?,
            content_type,
        },
        content: row
            .try_get("content")
            .map_err(|e| CacheError::Database(e.to_string()))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| CacheError::Database(format!("Failed to get created_at: {}", e)))?,
        expires_at: row
            .try_get::<Option<DateTime<Utc>>, _>("expires_at")
            .map_err(|e| CacheError::Database(format!("Failed to get expires_at: {}", e)))?,
    })
}

#[async_trait]
impl ContentCache for SqliteContentCache {
    async fn get(
        &self,
        key: &ContentKey,
    ) -> Result<Option<ContentCacheEntry>, CacheError> {
        let row = sqlx::query(
            "SELECT city, service, type, content, created_at, expires_at
             FROM content_cache WHERE city = ? AND service = ? AND type = ?",
        )
        .bind(&key.city)
        .bind(&key.service)
        .bind(key.content_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CacheError::Database(e.to_string()))?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn put(
        &self,
        entry: &ContentCacheEntry,
    ) -> Result<(), CacheError> {
        sqlx::query(
            "INSERT INTO content_cache (city, service, type, content, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (city, service, type) DO UPDATE SET
                 content = excluded.content,
                 created_at = excluded.created_at,
                 expires_at = excluded.expires_at",
        )
        .bind(&entry.key.city)
        .bind(&entry.key.service)
        .bind(entry.key.content_type.as_str())
        .bind(&entry.content)
        .bind(entry.created_at)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_cache() -> SqliteContentCache {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        let cache = SqliteContentCache::new_with_pool(pool).await;
        cache
            .run_migrations()
            .await
            .expect("Failed to run migrations");
        cache
    }

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn entry(
        city: &str,
        content_type: ContentType,
        content: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> ContentCacheEntry {
        ContentCacheEntry {
            key: ContentKey::new(city, "Payroll", content_type),
            content: content.to_string(),
            created_at: created(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let cache = setup_test_cache().await;
        let key = ContentKey::new("Leeds", "Payroll", ContentType::MetaTitle);

        assert_eq!(cache.get(&key).await, Ok(None));
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips_all_fields() {
        let cache = setup_test_cache().await;
        let stored = entry(
            "Leeds",
            ContentType::MainContent,
            "Body text",
            Some(created() + TimeDelta::days(7)),
        );

        cache.put(&stored).await.expect("Failed to put");
        let found = cache.get(&stored.key).await.expect("Failed to get");

        assert_eq!(found, Some(stored));
    }

    #[tokio::test]
    async fn test_put_same_key_overwrites() {
        let cache = setup_test_cache().await;
        cache
            .put(&entry("Leeds", ContentType::MetaTitle, "old", None))
            .await
            .unwrap();
        cache
            .put(&entry("Leeds", ContentType::MetaTitle, "new", None))
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_cache")
            .fetch_one(cache.pool())
            .await
            .unwrap();
        let found = cache
            .get(&ContentKey::new("Leeds", "Payroll", ContentType::MetaTitle))
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(found.map(|e| e.content), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_keys_differ_by_type_and_case() {
        let cache = setup_test_cache().await;
        cache
            .put(&entry("Leeds", ContentType::MetaTitle, "title", None))
            .await
            .unwrap();

        let other_type = ContentKey::new("Leeds", "Payroll", ContentType::MetaDescription);
        let other_case = ContentKey::new("LEEDS", "Payroll", ContentType::MetaTitle);

        assert_eq!(cache.get(&other_type).await, Ok(None));
        assert_eq!(cache.get(&other_case).await, Ok(None));
    }

    #[tokio::test]
    async fn test_purge_expired_removes_only_stale_rows() {
        let cache = setup_test_cache().await;
        let now = created() + TimeDelta::hours(2);
        cache
            .put(&entry("Leeds", ContentType::MetaTitle, "stale", Some(created() + TimeDelta::hours(1))))
            .await
            .unwrap();
        cache
            .put(&entry("York", ContentType::MetaTitle, "fresh", Some(created() + TimeDelta::hours(3))))
            .await
            .unwrap();
        cache
            .put(&entry("Hull", ContentType::MetaTitle, "forever", None))
            .await
            .unwrap();

        let purged = cache.purge_expired(now).await.expect("Failed to purge");

        assert_eq!(purged, 1);
        let stale = ContentKey::new("Leeds", "Payroll", ContentType::MetaTitle);
        assert_eq!(cache.get(&stale).await, Ok(None));
        let fresh = ContentKey::new("York", "Payroll", ContentType::MetaTitle);
        assert!(cache.get(&fresh).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_returns_expired_row_for_caller_to_judge() {
        let cache = setup_test_cache().await;
        let stored = entry("Leeds", ContentType::MetaTitle, "old", Some(created()));
        cache.put(&stored).await.unwrap();

        let found = cache.get(&stored.key).await.unwrap().expect("row should exist");

        assert!(!found.is_live(created()));
    }
}
