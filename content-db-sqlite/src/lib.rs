mod factory;
mod repository;

pub use factory::{SqliteCacheFactory, connection_url};
pub use repository::SqliteContentCache;
