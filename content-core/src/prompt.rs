//! Per-type prompts and cleanup of generated text.

use std::sync::OnceLock;

use regex::Regex;

use crate::generator::GenerationPrompt;
use crate::models::ContentType;

pub const TEMPERATURE: f32 = 0.7;

/// Output budgets. Titles and descriptions are short; the page body is long.
pub fn max_tokens(content_type: ContentType) -> u32 {
    match content_type {
        ContentType::MetaTitle => 60,
        ContentType::MetaDescription => 160,
        ContentType::MainContent => 1500,
    }
}

pub fn build_prompt(
    content_type: ContentType,
    city: &str,
    service: &str,
) -> GenerationPrompt {
    let prompt = match content_type {
        ContentType::MetaTitle => format!(
            "Write an SEO meta title for a UK accountancy firm's {service} page aimed at \
             businesses and individuals in {city}. Keep it under 60 characters, include both \
             \"{service}\" and \"{city}\", and return only the title text."
        ),
        ContentType::MetaDescription => format!(
            "Write an SEO meta description for a UK accountancy firm offering {service} in \
             {city}. Keep it under 155 characters, mention {city} once, end with a call to \
             action, and return only the description text."
        ),
        ContentType::MainContent => format!(
            "Write the main body copy for a landing page about {service} services in {city}, \
             for a firm of qualified UK accountants. Cover who the service is for, what is \
             included, relevant HMRC deadlines or obligations, and why a local accountant in \
             {city} helps. Use a professional, friendly tone, short paragraphs and plain \
             British English. Around 500 words. Do not include a title."
        ),
    };

    GenerationPrompt {
        prompt,
        max_tokens: max_tokens(content_type),
        temperature: TEMPERATURE,
    }
}

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(meta\s+)?(title|description)\s*:\s*").expect("label pattern is valid")
    })
}

/// Trim the model's answer and drop wrapping quotes. Meta titles and
/// descriptions also lose a leading `Title:`-style label; page bodies keep
/// their first line as written.
pub fn clean_generated_text(
    content_type: ContentType,
    raw: &str,
) -> String {
    let trimmed = raw.trim();
    let unlabelled = match content_type {
        ContentType::MetaTitle | ContentType::MetaDescription => {
            label_pattern().replace(trimmed, "")
        }
        ContentType::MainContent => trimmed.into(),
    };
    let mut text = unlabelled.trim();

    for (open, close) in [('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}')] {
        if text.len() > 1 {
            if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
                text = inner.trim();
            }
        }
    }

    text.to_string()
}
