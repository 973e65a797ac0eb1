//! In-memory stand-in for the DAIMS card API.
//!
//! Serves `POST /api/search` and `POST /api/card` over a fixed catalog of
//! cards. Bearer auth is enforced when the server is configured with a key,
//! and an optional latency makes client timeouts reproducible.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;

pub const DEFAULT_PAGE_LIMIT: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
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

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub metadata: Metadata,
    pub references: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page {
    pub count: usize,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    pub limit: usize,
    pub offset: usize,
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub data: Page,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptResponse {
    pub success: bool,
    pub prompt: String,
}

#[derive(Deserialize)]
pub struct SearchInput {
    pub card_type: String,
    pub search_type: String,
    #[serde(default)]
    pub value: String,
    pub link: Option<String>,
    #[serde(rename = "isPhoto")]
    pub is_photo: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CardInput {
    #[serde(default)]
    pub skey: String,
}

/// A catalog entry: the searchable item plus its prompt and tags.
#[derive(Clone, Debug)]
pub struct Card {
    pub item: Item,
    pub card_type: String,
    pub tags: Vec<String>,
    pub prompt: String,
}

#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// When set, every request must carry `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
    /// Delay before each handler answers.
    pub latency: Duration,
}

#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
    catalog: Arc<Vec<Card>>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("card not found")]
    NotFound,
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(json!({ "success": false, "message": self.to_string() }))).into_response()
    }
}

pub fn app() -> Router {
    app_with(ServerConfig::default())
}

pub fn app_with(config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        catalog: Arc::new(catalog()),
    };
    Router::new()
        .route("/api/search", post(search))
        .route("/api/card", post(card))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: ServerConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn authorize(config: &ServerConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = config.api_key.as_deref() else {
        return Ok(());
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented == Some(expected) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

// Bodies are parsed by hand so that auth is checked before the payload.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SearchResponse>, ApiError> {
    tokio::time::sleep(state.config.latency).await;
    authorize(&state.config, &headers)?;
    let input: SearchInput = parse_body(&body)?;

    if input.value.trim().is_empty() {
        return Err(ApiError::BadRequest("value is required"));
    }
    tracing::debug!(
        card_type = %input.card_type,
        search_type = %input.search_type,
        has_link = input.link.is_some(),
        is_photo = ?input.is_photo,
        "search"
    );

    let needle = input.value.to_lowercase();
    let matches: Vec<Item> = state
        .catalog
        .iter()
        .filter(|card| card.card_type == input.card_type)
        .filter(|card| {
            input.search_type != "keyword"
                || card.tags.iter().any(|t| t.contains(&needle))
                || card.prompt.to_lowercase().contains(&needle)
        })
        .map(|card| card.item.clone())
        .collect();

    let count = matches.len();
    let items: Vec<Item> = matches.into_iter().take(DEFAULT_PAGE_LIMIT).collect();
    Ok(Json(SearchResponse {
        success: true,
        data: Page {
            count,
            has_next: count > items.len(),
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
            items,
        },
    }))
}

async fn card(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PromptResponse>, ApiError> {
    tokio::time::sleep(state.config.latency).await;
    authorize(&state.config, &headers)?;
    let input: CardInput = parse_body(&body)?;

    if input.skey.is_empty() {
        return Err(ApiError::BadRequest("skey is required"));
    }
    let card = state
        .catalog
        .iter()
        .find(|card| card.item.metadata.key == input.skey)
        .ok_or(ApiError::NotFound)?;

    Ok(Json(PromptResponse {
        success: true,
        prompt: card.prompt.clone(),
    }))
}

/// The fixed card catalog, in the order search returns it.
pub fn catalog() -> Vec<Card> {
    let card = |n: u32, card_type: &str, model: &str, tags: &[&str], prompt: &str| Card {
        item: Item {
            id: format!("card-{n}"),
            metadata: Metadata {
                key: format!("{card_type}/{n:04}.png"),
                provider: "openai".to_string(),
                directory: card_type.to_string(),
                model: model.to_string(),
                kind: card_type.to_string(),
                maker: "daims".to_string(),
                refs: String::new(),
                uid: format!("uid-{n:04}"),
            },
            references: vec![format!("https://asset.daims.ai/images/ref/{n:04}.png")],
        },
        card_type: card_type.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        prompt: prompt.to_string(),
    };

    vec![
        card(
            1,
            "create",
            "gpt-image-1",
            &["cinematic", "portrait"],
            "A cinematic portrait of an old sailor, rim light, 85mm, shallow depth of field",
        ),
        card(
            2,
            "create",
            "gpt-image-1",
            &["cinematic", "landscape"],
            "Wide cinematic shot of a desert highway at dusk, anamorphic flare",
        ),
        card(
            3,
            "create",
            "dall-e-3",
            &["watercolor", "portrait"],
            "Soft watercolor portrait of a child reading under a tree",
        ),
        card(
            4,
            "edit",
            "gpt-image-1",
            &["warm tone", "color grade"],
            "Regrade the photo with warm golden-hour tones and lifted shadows",
        ),
        card(
            5,
            "edit",
            "gpt-image-1",
            &["background", "lamp"],
            "Replace the background with a cozy study lit by a brass desk lamp",
        ),
    ]
}
