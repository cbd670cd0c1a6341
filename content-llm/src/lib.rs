//! OpenAI-compatible chat-completions client implementing
//! [`TextGenerator`].
//!
//! | response                    | result                                   |
//! |-----------------------------|------------------------------------------|
//! | 2xx with non-blank content  | `Ok(text)`                               |
//! | 2xx, no choices or blank    | `GenerationError::EmptyResponse`         |
//! | 429                         | `GenerationError::RateLimited` with quota headers |
//! | other non-2xx               | `GenerationError::Api`                   |
//! | connect/timeout/decode      | `GenerationError::Transport`             |

use std::time::Duration;

use async_trait::async_trait;
use content_core::generator::TOO_MANY_REQUESTS;
use content_core::{GenerationError, GenerationPrompt, TextGenerator};
use serde::{Deserialize, Serialize};

const USER_AGENT: &str = concat!("accounts-site/", env!("CARGO_PKG_VERSION"));
const REMAINING_HEADER: &str = "x-ratelimit-remaining-requests";
const RESET_HEADER: &str = "x-ratelimit-reset-requests";
const SYSTEM_PROMPT: &str = "You write clear, accurate marketing copy for a firm of UK chartered \
                             accountants. Use British English and never invent prices or \
                             guarantees.";

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiConfig {
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct OpenAiGenerator {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model,
            api_key: config.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(
        &self,
        prompt: &GenerationPrompt,
    ) -> Result<String, GenerationError> {
        let body = build_request(&self.model, prompt);

        tracing::debug!(
            model = %self.model,
            max_tokens = prompt.max_tokens,
            "Requesting chat completion"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers();
            let remaining = header_str(headers, REMAINING_HEADER);
            let reset = header_str(headers, RESET_HEADER);
            let text = response.text().await.unwrap_or_default();
            return Err(error_for_status(
                status.as_u16(),
                remaining.as_deref(),
                reset.as_deref(),
                &text,
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        parse_completion(&text)
    }
}

fn build_request<'a>(
    model: &'a str,
    prompt: &'a GenerationPrompt,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: &prompt.prompt,
            },
        ],
        max_tokens: prompt.max_tokens,
        temperature: prompt.temperature,
    }
}

fn header_str(
    headers: &reqwest::header::HeaderMap,
    name: &str,
) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Map a non-2xx status and its quota headers to a [`GenerationError`].
fn error_for_status(
    status: u16,
    remaining: Option<&str>,
    reset: Option<&str>,
    body: &str,
) -> GenerationError {
    if status == TOO_MANY_REQUESTS {
        tracing::warn!(status, ?remaining, ?reset, "Generation API rate limited");
        return GenerationError::RateLimited {
            status,
            remaining: remaining.and_then(|r| r.trim().parse().ok()),
            reset: reset.map(str::to_string),
        };
    }

    GenerationError::Api {
        status,
        message: error_message(body),
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.trim().chars().take(200).collect(),
    }
}

fn parse_completion(body: &str) -> Result<String, GenerationError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Transport(format!("invalid completion body: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)
}
