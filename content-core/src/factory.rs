//! Choosing a content cache backend by name.
//!
//! The site binary registers the SQLite and in-memory caches at startup and
//! opens whichever one `cache.backend` in the config names.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{CacheError, ContentCache};

/// Which cache to open and where its rows live.
///
/// For `sqlite` the connection string is a file path or `:memory:`; the
/// `memory` backend ignores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub backend: String,
    pub connection_string: String,
}

impl CacheConfig {
    /// A process-local cache that forgets everything on exit.
    pub fn memory() -> Self {
        Self {
            backend: "memory".to_string(),
            connection_string: String::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Opens one kind of [`ContentCache`].
#[async_trait]
pub trait CacheFactory: Send + Sync {
    /// The `cache.backend` value that selects this factory.
    fn backend_name(&self) -> &'static str;

    /// Open the store, creating its schema if needed.
    async fn create(
        &self,
        config: &CacheConfig,
    ) -> Result<Box<dyn ContentCache>, CacheError>;
}

/// The cache backends this build knows how to open.
#[derive(Default)]
pub struct CacheRegistry {
    backends: BTreeMap<&'static str, Box<dyn CacheFactory>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations win over earlier ones with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn CacheFactory>,
    ) {
        self.backends.insert(factory.backend_name(), factory);
    }

    /// Backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        self.backends.keys().copied().collect()
    }

    /// Open the cache named by `config.backend`.
    ///
    /// An unregistered name is a [`CacheError::Configuration`] listing the
    /// names that would have worked.
    pub async fn create(
        &self,
        config: &CacheConfig,
    ) -> Result<Box<dyn ContentCache>, CacheError> {
        let Some(factory) = self.backends.get(config.backend.as_str()) else {
            return Err(CacheError::Configuration(format!(
                "no content cache backend called '{}' (choose one of: {})",
                config.backend,
                self.available_backends().join(", ")
            )));
        };

        debug!(backend = %config.backend, "opening content cache");
        factory.create(config).await
    }
}
