//! Cache-first content generation for service/city landing pages.
//!
//! The pipeline looks up `(city, service, type)` in a [`ContentCache`],
//! falls back to a [`TextGenerator`] wrapped in rate-limit aware retries,
//! and writes the result back. Every collaborator is injected so tests can
//! drive the whole flow without a database, network or wall clock.

pub mod cache;
pub mod clock;
pub mod factory;
pub mod fallback;
pub mod generator;
pub mod memory;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod retry;

pub use cache::{CacheError, ContentCache};
pub use clock::{Clock, SystemClock};
pub use factory::{CacheConfig, CacheFactory, CacheRegistry};
pub use generator::{GenerationError, GenerationPrompt, TextGenerator};
pub use memory::{MemoryCache, MemoryCacheFactory};
pub use models::*;
pub use pipeline::{ContentPipeline, PipelineError};
pub use retry::{Jitter, RandJitter, Retry, RetryError, RetryPolicy, Sleeper, TokioSleeper};
