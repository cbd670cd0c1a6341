use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single cacheable piece of page content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    MetaTitle,
    MetaDescription,
    MainContent,
}

impl ContentType {
    /// Every part of a page, in the order a page is assembled.
    pub const ALL: [ContentType; 3] = [Self::MetaTitle, Self::MetaDescription, Self::MainContent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetaTitle => "meta_title",
            Self::MetaDescription => "meta_description",
            Self::MainContent => "main_content",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "meta_title" => Some(Self::MetaTitle),
            "meta_description" => Some(Self::MetaDescription),
            "main_content" => Some(Self::MainContent),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller asked for: one part, or the whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedContent {
    Part(ContentType),
    All,
}

impl RequestedContent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Part(content_type) => content_type.as_str(),
            Self::All => "all",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            other => ContentType::parse(other).map(Self::Part),
        }
    }
}

/// Cache key. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    pub city: String,
    pub service: String,
    pub content_type: ContentType,
}

impl ContentKey {
    pub fn new(
        city: impl Into<String>,
        service: impl Into<String>,
        content_type: ContentType,
    ) -> Self {
        Self {
            city: city.into(),
            service: service.into(),
            content_type,
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}/{}", self.city, self.service, self.content_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCacheEntry {
    pub key: ContentKey,
    pub content: String,
    pub created_at: DateTime<Utc>,

    /// `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl ContentCacheEntry {
    /// An entry is live until `expires_at`; at that instant it is expired.
    pub fn is_live(
        &self,
        now: DateTime<Utc>,
    ) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}
