use serde::{Deserialize, Serialize};

/// Incoming content request.
///
/// `type` stays a string here so an unknown value is reported as an
/// invalid request instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub city: String,
    pub service: String,

    #[serde(rename = "type")]
    pub content_type: String,

    #[serde(default)]
    pub force_refresh: bool,
}

/// The three parts of a page, returned together for `type = "all"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub title: String,
    pub description: String,
    pub main_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationResponse {
    Single { content: String },
    Page(PageContent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
