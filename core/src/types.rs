//! Wire DTOs for the DAIMS card API.
//!
//! # Design
//! Field names follow the API's JSON spelling through serde attributes so the
//! Rust side can use snake_case. Optional request fields are `Option`s that
//! are skipped when `None`: the API sees a missing key, never `null`.
//! The mock-server crate defines its own copies of these shapes; the
//! integration tests catch drift between the two.

use serde::{Deserialize, Serialize};

/// Base URL card images are served from.
pub const ASSET_BASE_URL: &str = "https://asset.daims.ai/images";

/// URL of the image stored under `key`.
pub fn asset_url(key: &str) -> String {
    format!("{ASSET_BASE_URL}/{key}")
}

/// Card category to search in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Create,
    Edit,
}

/// How the search `value` is interpreted.
///
/// `Keyword` expects text; `Style` and `Object` expect a base64-encoded
/// image. The client forwards the value untouched either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Keyword,
    Style,
    Object,
}

impl SearchType {
    pub fn expects_image(&self) -> bool {
        !matches!(self, SearchType::Keyword)
    }
}

/// Request payload for `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub card_type: CardType,
    pub search_type: SearchType,
    pub value: String,
    /// Reference URL the API may use for context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(rename = "isPhoto", default, skip_serializing_if = "Option::is_none")]
    pub is_photo: Option<bool>,
}

impl SearchRequest {
    pub fn new(card_type: CardType, search_type: SearchType, value: impl Into<String>) -> Self {
        Self {
            card_type,
            search_type,
            value: value.into(),
            link: None,
            is_photo: None,
        }
    }

    pub fn keyword(card_type: CardType, keyword: impl Into<String>) -> Self {
        Self::new(card_type, SearchType::Keyword, keyword)
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_photo(mut self, is_photo: bool) -> Self {
        self.is_photo = Some(is_photo);
        self
    }
}

/// Response from `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub data: SearchPage,
}

/// One page of search results, in server order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Total number of matches across all pages.
    pub count: u64,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    pub limit: u64,
    pub offset: u64,
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    pub id: String,
    pub metadata: ItemMetadata,
    pub references: Vec<String>,
}

impl SearchItem {
    /// Storage key to pass to `DaimsClient::get_prompt`.
    pub fn skey(&self) -> &str {
        &self.metadata.key
    }

    pub fn image_url(&self) -> String {
        asset_url(&self.metadata.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub key: String,
    pub provider: String,
    pub directory: String,
    pub model: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub maker: String,
    pub refs: String,
    pub uid: String,
}

/// Response from `POST /api/card`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub success: bool,
    pub prompt: String,
}

/// Request payload for `POST /api/card`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PromptRequest<'a> {
    pub skey: &'a str,
}
