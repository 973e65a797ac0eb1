//! Async client for the DAIMS card API.
//!
//! # Overview
//! Two operations against `https://api.daims.ai`: `search` over prompt cards
//! and `get_prompt` for one card's prompt text. Every failure surfaces as a
//! `DaimsError` with a machine-readable `ErrorCode`.
//!
//! # Design
//! - `DaimsClient` is the facade; it holds only an immutable `ClientConfig`.
//! - `request` performs exactly one POST per call: bearer auth when a key is
//!   configured, a deadline-bounded exchange, and uniform error mapping. No
//!   retries, caching or pooling.
//! - The network is reached only through the `Transport` trait. The default
//!   `UreqTransport` (feature `ureq-transport`) can be swapped for any other
//!   implementation, which is how the tests run without a network.
//!
//! ```no_run
//! use daims_core::{CardType, DaimsClient, SearchRequest};
//!
//! # async fn run() -> daims_core::Result<()> {
//! let client = DaimsClient::with_api_key("your-api-key")?;
//! let results = client
//!     .search(&SearchRequest::keyword(CardType::Create, "cinematic portrait"))
//!     .await?;
//! for item in &results.data.items {
//!     let prompt = client.get_prompt(item.skey()).await?;
//!     println!("{} {}", item.image_url(), prompt.prompt);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod types;

pub use client::DaimsClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{DaimsError, ErrorCode, Result};
pub use http::{Deadline, HttpRequest, HttpResponse, Transport, TransportError, TransportFuture};
#[cfg(feature = "ureq-transport")]
pub use http::UreqTransport;
pub use types::{
    asset_url, CardType, ItemMetadata, PromptResponse, SearchItem, SearchPage, SearchRequest,
    SearchResponse, SearchType, ASSET_BASE_URL,
};
