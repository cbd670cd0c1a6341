use async_trait::async_trait;
use thiserror::Error;

/// Status code that marks a rate-limited generation call.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// One call to the text-generation backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPrompt {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Transient; the only variant that is retried.
    #[error("Rate limited (HTTP {status}, remaining: {remaining:?}, reset: {reset:?})")]
    RateLimited {
        status: u16,
        remaining: Option<u32>,
        reset: Option<String>,
    },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Generation returned no text")]
    EmptyResponse,
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Capability interface for the external text generator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &GenerationPrompt,
    ) -> Result<String, GenerationError>;
}
