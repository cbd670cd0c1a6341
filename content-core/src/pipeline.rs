//! Cache-first generation of page content.
//!
//! Each part of a page moves through:
//!
//! ```text
//! CacheLookup ──hit (live)──────────────────────────▶ Done(cached)
//!      │ miss, expired, read error or force refresh
//!      ▼
//!  Generate (with retries) ──ok──▶ CacheWrite ──────▶ Done(generated)
//!      │ error
//!      ▼
//!   Failed
//! ```
//!
//! A failed cache read counts as a miss and a failed cache write is only
//! logged; neither fails the request.

use std::sync::Arc;

use chrono::TimeDelta;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::ContentCache;
use crate::clock::{Clock, SystemClock};
use crate::fallback::{fallback_content, fallback_response};
use crate::generator::{GenerationError, TextGenerator};
use crate::models::{
    ContentCacheEntry, ContentKey, ContentType, ErrorResponse, GenerationRequest,
    GenerationResponse, PageContent, RequestedContent,
};
use crate::prompt::{build_prompt, clean_generated_text};
use crate::retry::{Jitter, RandJitter, Retry, RetryError, RetryPolicy, Sleeper, TokioSleeper};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Content generation failed after {attempts} attempt(s): {source}")]
    GenerationFailed {
        attempts: u32,
        #[source]
        source: GenerationError,
    },
}

impl PipelineError {
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
        }
    }
}

impl From<RetryError<GenerationError>> for PipelineError {
    fn from(err: RetryError<GenerationError>) -> Self {
        Self::GenerationFailed {
            attempts: err.attempts,
            source: err.source,
        }
    }
}

enum Stage {
    CacheLookup,
    Generate,
    CacheWrite(String),
}

pub struct ContentPipeline {
    cache: Arc<dyn ContentCache>,
    generator: Arc<dyn TextGenerator>,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn Jitter>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    ttl: Option<TimeDelta>,
}

impl ContentPipeline {
    /// A pipeline with the default retry policy, real sleeps, random
    /// jitter, the system clock and entries that never expire.
    pub fn new(
        cache: Arc<dyn ContentCache>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            cache,
            generator,
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandJitter),
            clock: Arc::new(SystemClock),
            policy: RetryPolicy::default(),
            ttl: None,
        }
    }

    pub fn with_retry_policy(
        mut self,
        policy: RetryPolicy,
    ) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(
        mut self,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_jitter(
        mut self,
        jitter: Arc<dyn Jitter>,
    ) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_clock(
        mut self,
        clock: Arc<dyn Clock>,
    ) -> Self {
        self.clock = clock;
        self
    }

    /// Written entries expire `ttl` after they are created.
    pub fn with_ttl(
        mut self,
        ttl: Option<TimeDelta>,
    ) -> Self {
        self.ttl = ttl;
        self
    }

    /// Serve a content request.
    ///
    /// # Errors
    /// * [`PipelineError::InvalidRequest`] for a blank city or service or
    ///   an unknown type.
    /// * [`PipelineError::GenerationFailed`] when generation fails for any
    ///   part that is not cached.
    pub async fn handle(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, PipelineError> {
        let requested = validate(request)?;
        let (city, service) = (request.city.as_str(), request.service.as_str());

        match requested {
            RequestedContent::Part(content_type) => {
                let key = ContentKey::new(city, service, content_type);
                let content = self.content_for(&key, request.force_refresh).await?;
                Ok(GenerationResponse::Single { content })
            }
            RequestedContent::All => {
                let key = |content_type| ContentKey::new(city, service, content_type);
                let force_refresh = request.force_refresh;
                Ok(GenerationResponse::Page(PageContent {
                    title: self
                        .content_for(&key(ContentType::MetaTitle), force_refresh)
                        .await?,
                    description: self
                        .content_for(&key(ContentType::MetaDescription), force_refresh)
                        .await?,
                    main_content: self
                        .content_for(&key(ContentType::MainContent), force_refresh)
                        .await?,
                }))
            }
        }
    }

    /// Serve a content request, substituting deterministic fallback text
    /// for anything that cannot be generated. Never fails.
    pub async fn content_or_fallback(
        &self,
        request: &GenerationRequest,
    ) -> GenerationResponse {
        let (city, service) = (request.city.as_str(), request.service.as_str());
        let requested = match validate(request) {
            Ok(requested) => requested,
            Err(err) => {
                warn!(error = %err, "Serving fallback page for invalid request");
                return fallback_response(RequestedContent::All, city, service);
            }
        };

        match requested {
            RequestedContent::Part(content_type) => GenerationResponse::Single {
                content: self
                    .part_or_fallback(content_type, city, service, request.force_refresh)
                    .await,
            },
            RequestedContent::All => GenerationResponse::Page(PageContent {
                title: self
                    .part_or_fallback(ContentType::MetaTitle, city, service, request.force_refresh)
                    .await,
                description: self
                    .part_or_fallback(ContentType::MetaDescription, city, service, request.force_refresh)
                    .await,
                main_content: self
                    .part_or_fallback(ContentType::MainContent, city, service, request.force_refresh)
                    .await,
            }),
        }
    }

    /// Resolve one part of a page through the cache.
    pub async fn content_for(
        &self,
        key: &ContentKey,
        force_refresh: bool,
    ) -> Result<String, PipelineError> {
        let mut stage = if force_refresh {
            debug!(%key, "Force refresh, skipping cache");
            Stage::Generate
        } else {
            Stage::CacheLookup
        };

        loop {
            stage = match stage {
                Stage::CacheLookup => match self.lookup(key).await {
                    Some(content) => return Ok(content),
                    None => Stage::Generate,
                },
                Stage::Generate => Stage::CacheWrite(self.generate(key).await?),
                Stage::CacheWrite(content) => {
                    self.store(key, &content).await;
                    return Ok(content);
                }
            };
        }
    }

    async fn part_or_fallback(
        &self,
        content_type: ContentType,
        city: &str,
        service: &str,
        force_refresh: bool,
    ) -> String {
        let key = ContentKey::new(city, service, content_type);
        match self.content_for(&key, force_refresh).await {
            Ok(content) => content,
            Err(err) => {
                warn!(%key, error = %err, "Serving fallback content");
                fallback_content(content_type, city, service)
            }
        }
    }

    async fn lookup(
        &self,
        key: &ContentKey,
    ) -> Option<String> {
        match self.cache.get(key).await {
            Ok(Some(entry)) if entry.is_live(self.clock.now()) => {
                debug!(%key, "Cache hit");
                Some(entry.content)
            }
            Ok(Some(_)) => {
                debug!(%key, "Cached entry expired");
                None
            }
            Ok(None) => {
                debug!(%key, "Cache miss");
                None
            }
            Err(err) => {
                warn!(%key, error = %err, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn generate(
        &self,
        key: &ContentKey,
    ) -> Result<String, PipelineError> {
        let prompt = build_prompt(key.content_type, &key.city, &key.service);
        let prompt = &prompt;
        let content_type = key.content_type;
        let generator = self.generator.as_ref();

        info!(%key, max_tokens = prompt.max_tokens, "Generating content");

        let content = Retry::new(&self.policy, self.sleeper.as_ref(), self.jitter.as_ref())
            .run("generate content", move || async move {
                let content = clean_generated_text(content_type, &generator.generate(prompt).await?);
                if content.is_empty() {
                    return Err(GenerationError::EmptyResponse);
                }
                Ok(content)
            })
            .await?;

        Ok(content)
    }

    async fn store(
        &self,
        key: &ContentKey,
        content: &str,
    ) {
        let created_at = self.clock.now();
        let entry = ContentCacheEntry {
            key: key.clone(),
            content: content.to_string(),
            created_at,
            expires_at: self.ttl.and_then(|ttl| created_at.checked_add_signed(ttl)),
        };

        if let Err(err) = self.cache.put(&entry).await {
            warn!(%key, error = %err, "Cache write failed, returning generated content anyway");
        }
    }
}

fn validate(request: &GenerationRequest) -> Result<RequestedContent, PipelineError> {
    if request.city.trim().is_empty() {
        return Err(PipelineError::InvalidRequest("city is required".to_string()));
    }
    if request.service.trim().is_empty() {
        return Err(PipelineError::InvalidRequest("service is required".to_string()));
    }
    RequestedContent::parse(&request.content_type).ok_or_else(|| {
        PipelineError::InvalidRequest(format!("unknown content type '{}'", request.content_type))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cache::CacheError;
    use crate::generator::GenerationPrompt;
    use crate::memory::MemoryCache;

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn at(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        fn advance(
            &self,
            by: TimeDelta,
        ) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    struct NoSleep;

    #[async_trait]
    impl Sleeper for NoSleep {
        async fn sleep(
            &self,
            _duration: Duration,
        ) {
        }
    }

    /// Answers with a per-type canned reply and counts calls.
    #[derive(Default)]
    struct CannedGenerator {
        calls: AtomicU32,
        prompts: Mutex<Vec<GenerationPrompt>>,
    }

    impl CannedGenerator {
        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(
            &self,
            prompt: &GenerationPrompt,
        ) -> Result<String, GenerationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.prompts.lock().unwrap().push(prompt.clone());
            Ok(format!("  \"generated #{call} ({} tokens)\" ", prompt.max_tokens))
        }
    }

    struct FailingGenerator(GenerationError);

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(
            &self,
            _prompt: &GenerationPrompt,
        ) -> Result<String, GenerationError> {
            Err(self.0.clone())
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl ContentCache for BrokenCache {
        async fn get(
            &self,
            _key: &ContentKey,
        ) -> Result<Option<ContentCacheEntry>, CacheError> {
            Err(CacheError::Connection("down".to_string()))
        }

        async fn put(
            &self,
            _entry: &ContentCacheEntry,
        ) -> Result<(), CacheError> {
            Err(CacheError::Connection("down".to_string()))
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn request(content_type: &str) -> GenerationRequest {
        GenerationRequest {
            city: "Leeds".to_string(),
            service: "Bookkeeping".to_string(),
            content_type: content_type.to_string(),
            force_refresh: false,
        }
    }

    fn pipeline(
        cache: Arc<dyn ContentCache>,
        generator: Arc<dyn TextGenerator>,
        clock: Arc<FixedClock>,
    ) -> ContentPipeline {
        ContentPipeline::new(cache, generator)
            .with_sleeper(Arc::new(NoSleep))
            .with_clock(clock)
    }

    fn single(response: GenerationResponse) -> String {
        match response {
            GenerationResponse::Single { content } => content,
            other => panic!("expected single content, got {other:?}"),
        }
    }

    // =========================================================================
    // cache behaviour
    // =========================================================================

    #[tokio::test]
    async fn miss_generates_cleans_and_caches() {
        let cache = Arc::new(MemoryCache::new());
        let generator = Arc::new(CannedGenerator::default());
        let clock = Arc::new(FixedClock::at(start()));
        let pipeline = pipeline(cache.clone(), generator.clone(), clock);

        let content = single(pipeline.handle(&request("meta_title")).await.unwrap());

        assert_eq!(content, "generated #1 (60 tokens)");
        let key = ContentKey::new("Leeds", "Bookkeeping", ContentType::MetaTitle);
        let stored = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(stored.content, content);
        assert_eq!(stored.created_at, start());
        assert_eq!(stored.expires_at, None);
    }

    #[tokio::test]
    async fn second_identical_request_is_served_from_cache() {
        let cache = Arc::new(MemoryCache::new());
        let generator = Arc::new(CannedGenerator::default());
        let clock = Arc::new(FixedClock::at(start()));
        let pipeline = pipeline(cache, generator.clone(), clock);

        let first = single(pipeline.handle(&request("meta_description")).await.unwrap());
        let second = single(pipeline.handle(&request("meta_description")).await.unwrap());

        assert_eq!(first, second);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn force_refresh_regenerates_and_overwrites() {
        let cache = Arc::new(MemoryCache::new());
        let generator = Arc::new(CannedGenerator::default());
        let clock = Arc::new(FixedClock::at(start()));
        let pipeline = pipeline(cache.clone(), generator.clone(), clock);

        pipeline.handle(&request("main_content")).await.unwrap();
        let refreshed = single(
            pipeline
                .handle(&GenerationRequest {
                    force_refresh: true,
                    ..request("main_content")
                })
                .await
                .unwrap(),
        );

        assert_eq!(generator.calls(), 2);
        assert_eq!(refreshed, "generated #2 (1500 tokens)");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_treated_as_absent() {
        let cache = Arc::new(MemoryCache::new());
        let generator = Arc::new(CannedGenerator::default());
        let clock = Arc::new(FixedClock::at(start()));
        let pipeline = pipeline(cache.clone(), generator.clone(), clock.clone())
            .with_ttl(Some(TimeDelta::hours(1)));

        pipeline.handle(&request("meta_title")).await.unwrap();
        let key = ContentKey::new("Leeds", "Bookkeeping", ContentType::MetaTitle);
        let stored = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, Some(start() + TimeDelta::hours(1)));

        clock.advance(TimeDelta::minutes(59));
        pipeline.handle(&request("meta_title")).await.unwrap();
        assert_eq!(generator.calls(), 1);

        clock.advance(TimeDelta::minutes(1));
        pipeline.handle(&request("meta_title")).await.unwrap();
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn broken_cache_degrades_to_generation() {
        let generator = Arc::new(CannedGenerator::default());
        let clock = Arc::new(FixedClock::at(start()));
        let pipeline = pipeline(Arc::new(BrokenCache), generator.clone(), clock);

        let content = single(pipeline.handle(&request("meta_title")).await.unwrap());

        assert_eq!(content, "generated #1 (60 tokens)");
        assert_eq!(generator.calls(), 1);
    }

    // =========================================================================
    // aggregate and validation
    // =========================================================================

    #[tokio::test]
    async fn all_assembles_three_parts_with_distinct_budgets() {
        let generator = Arc::new(CannedGenerator::default());
        let clock = Arc::new(FixedClock::at(start()));
        let pipeline = pipeline(Arc::new(MemoryCache::new()), generator.clone(), clock);

        let response = pipeline.handle(&request("all")).await.unwrap();

        assert_eq!(
            response,
            GenerationResponse::Page(PageContent {
                title: "generated #1 (60 tokens)".to_string(),
                description: "generated #2 (160 tokens)".to_string(),
                main_content: "generated #3 (1500 tokens)".to_string(),
            })
        );
        assert_eq!(generator.prompts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_type_and_blank_fields_are_invalid() {
        let generator = Arc::new(CannedGenerator::default());
        let clock = Arc::new(FixedClock::at(start()));
        let pipeline = pipeline(Arc::new(MemoryCache::new()), generator.clone(), clock);

        let unknown = pipeline.handle(&request("sidebar")).await;
        let blank_city = pipeline
            .handle(&GenerationRequest {
                city: "  ".to_string(),
                ..request("meta_title")
            })
            .await;

        assert!(matches!(unknown, Err(PipelineError::InvalidRequest(_))));
        assert!(matches!(blank_city, Err(PipelineError::InvalidRequest(_))));
        assert_eq!(generator.calls(), 0);
    }

    // =========================================================================
    // failures
    // =========================================================================

    #[tokio::test]
    async fn non_retryable_failure_is_structured_error_and_not_cached() {
        let cache = Arc::new(MemoryCache::new());
        let clock = Arc::new(FixedClock::at(start()));
        let generator = Arc::new(FailingGenerator(GenerationError::Api {
            status: 401,
            message: "bad key".to_string(),
        }));
        let pipeline = pipeline(cache.clone(), generator, clock);

        let err = pipeline.handle(&request("meta_title")).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::GenerationFailed { attempts: 1, .. }
        ));
        assert!(err.to_error_response().error.contains("bad key"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn persistent_rate_limit_fails_after_all_attempts() {
        let clock = Arc::new(FixedClock::at(start()));
        let generator = Arc::new(FailingGenerator(GenerationError::RateLimited {
            status: 429,
            remaining: None,
            reset: None,
        }));
        let pipeline = pipeline(Arc::new(MemoryCache::new()), generator, clock);

        let err = pipeline.handle(&request("meta_title")).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::GenerationFailed {
                attempts: 5,
                source: GenerationError::RateLimited { .. }
            }
        ));
    }

    #[tokio::test]
    async fn blank_generation_is_a_failure() {
        struct BlankGenerator;

        #[async_trait]
        impl TextGenerator for BlankGenerator {
            async fn generate(
                &self,
                _prompt: &GenerationPrompt,
            ) -> Result<String, GenerationError> {
                Ok("  \"\"  ".to_string())
            }
        }

        let clock = Arc::new(FixedClock::at(start()));
        let pipeline = pipeline(Arc::new(MemoryCache::new()), Arc::new(BlankGenerator), clock);

        let err = pipeline.handle(&request("meta_title")).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::GenerationFailed {
                source: GenerationError::EmptyResponse,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn fallback_replaces_failed_parts() {
        let clock = Arc::new(FixedClock::at(start()));
        let generator = Arc::new(FailingGenerator(GenerationError::Transport(
            "connection refused".to_string(),
        )));
        let pipeline = pipeline(Arc::new(MemoryCache::new()), generator, clock);

        let title = single(pipeline.content_or_fallback(&request("meta_title")).await);

        assert_eq!(title, "Bookkeeping Services in Leeds | Professional Accountants");
    }

    #[tokio::test]
    async fn fallback_keeps_cached_parts() {
        let cache = Arc::new(MemoryCache::new());
        let clock = Arc::new(FixedClock::at(start()));
        cache
            .put(&ContentCacheEntry {
                key: ContentKey::new("Leeds", "Bookkeeping", ContentType::MetaTitle),
                content: "Cached title".to_string(),
                created_at: start(),
                expires_at: None,
            })
            .await
            .unwrap();
        let generator = Arc::new(FailingGenerator(GenerationError::EmptyResponse));
        let pipeline = pipeline(cache, generator, clock);

        match pipeline.content_or_fallback(&request("all")).await {
            GenerationResponse::Page(page) => {
                assert_eq!(page.title, "Cached title");
                assert_eq!(
                    page.description,
                    fallback_content(ContentType::MetaDescription, "Leeds", "Bookkeeping")
                );
            }
            other => panic!("expected a page, got {other:?}"),
        }
    }
}
