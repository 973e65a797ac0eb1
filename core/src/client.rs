//! Typed facade over the request executor.
//!
//! # Design
//! `DaimsClient` holds only an immutable `ClientConfig` behind an `Arc`, so
//! clones are cheap and concurrent calls share nothing mutable. Each
//! operation shapes its request body, delegates to `request::execute`, then
//! decodes the returned JSON into its response type.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{DaimsError, ErrorCode, Result};
use crate::request;
use crate::types::{PromptRequest, PromptResponse, SearchRequest, SearchResponse};

pub const SEARCH_PATH: &str = "/api/search";
pub const CARD_PATH: &str = "/api/card";

#[derive(Debug, Clone)]
pub struct DaimsClient {
    config: Arc<ClientConfig>,
}

impl DaimsClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Client that always authenticates; an empty key is a `CONFIG_ERROR`.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        let config = ClientConfig::builder()
            .api_key(api_key)
            .require_api_key(true)
            .build()?;
        Ok(Self::new(config))
    }

    pub fn from_env() -> Result<Self> {
        ClientConfig::from_env().map(Self::new)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `POST /api/search`.
    ///
    /// `value` is sent as given; an empty value is left for the API to
    /// reject.
    pub async fn search(&self, params: &SearchRequest) -> Result<SearchResponse> {
        let body = request::execute(&self.config, SEARCH_PATH, Some(params)).await?;
        decode(SEARCH_PATH, body)
    }

    /// `POST /api/card` for the card stored under `skey`.
    ///
    /// An empty or whitespace-only `skey` fails with `VALIDATION_ERROR`
    /// without sending anything.
    pub async fn get_prompt(&self, skey: &str) -> Result<PromptResponse> {
        if skey.trim().is_empty() {
            return Err(DaimsError::validation("skey is required."));
        }
        let body = request::execute(&self.config, CARD_PATH, Some(&PromptRequest { skey })).await?;
        decode(CARD_PATH, body)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: Option<Value>) -> Result<T> {
    serde_json::from_value(body.unwrap_or(Value::Null)).map_err(|e| {
        tracing::debug!(path, error = %e, "unexpected response shape");
        DaimsError::new(
            ErrorCode::DecodeError,
            format!("Unexpected response shape from {path}: {e}"),
        )
        .with_cause(e)
    })
}
