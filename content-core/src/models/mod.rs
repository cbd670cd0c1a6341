mod content;
mod wire;

pub use content::{ContentCacheEntry, ContentKey, ContentType, RequestedContent};
pub use wire::{ErrorResponse, GenerationRequest, GenerationResponse, PageContent};
