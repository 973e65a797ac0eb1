//! Client contract tests against an in-process transport.
//!
//! # Design
//! `FakeTransport` records every request it receives and answers with a
//! scripted reply, so each test can assert both what went over the wire and
//! how the client classified the outcome, without a network.

use std::error::Error as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use daims_core::{
    CardType, ClientConfig, DaimsClient, Deadline, ErrorCode, HttpRequest, HttpResponse,
    SearchRequest, SearchResponse, SearchType, Transport, TransportError, TransportFuture,
};
use serde_json::{json, Value};

#[derive(Clone)]
enum Reply {
    Respond(HttpResponse),
    Hang,
    Abort,
    Fail(&'static str),
}

struct FakeTransport {
    reply: Reply,
    calls: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn json(status: u16, body: Value) -> Arc<Self> {
        Self::new(Reply::Respond(HttpResponse {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }))
    }

    fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: HttpRequest, _deadline: Deadline) -> TransportFuture<'_> {
        self.calls.lock().unwrap().push(request);
        let reply = self.reply.clone();
        Box::pin(async move {
            match reply {
                Reply::Respond(response) => Ok(response),
                Reply::Hang => std::future::pending().await,
                Reply::Abort => Err(TransportError::Aborted),
                Reply::Fail(msg) => Err(TransportError::failed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    msg,
                ))),
            }
        })
    }
}

fn client_with(transport: Arc<FakeTransport>, api_key: Option<&str>) -> DaimsClient {
    let mut builder = ClientConfig::builder().transport(transport);
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    DaimsClient::new(builder.build().unwrap())
}

fn empty_page() -> Value {
    json!({
        "success": true,
        "data": {"count": 0, "hasNext": false, "limit": 20, "offset": 0, "items": []}
    })
}

fn item(n: u32) -> Value {
    json!({
        "id": format!("card-{n}"),
        "metadata": {
            "key": format!("create/{n:04}.png"),
            "provider": "openai",
            "directory": "create",
            "model": "gpt-image-1",
            "type": "create",
            "maker": "daims",
            "refs": "",
            "uid": format!("uid-{n}")
        },
        "references": [format!("https://example.com/{n}.png")]
    })
}

fn body_of(request: &HttpRequest) -> Value {
    serde_json::from_str(&request.body).unwrap()
}

// ---------------------------------------------------------------------------
// Request shaping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_sends_auth_header_and_optional_fields() {
    let transport = FakeTransport::json(200, empty_page());
    let client = client_with(transport.clone(), Some("test-key"));

    let params = SearchRequest::new(CardType::Create, SearchType::Keyword, "cinematic")
        .with_link("https://example.com/image.png")
        .with_photo(false);
    client.search(&params).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    let req = &calls[0];
    assert_eq!(req.url, "https://api.daims.ai/api/search");
    assert_eq!(req.header("Authorization"), Some("Bearer test-key"));
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(
        body_of(req),
        json!({
            "card_type": "create",
            "search_type": "keyword",
            "value": "cinematic",
            "link": "https://example.com/image.png",
            "isPhoto": false
        })
    );
}

#[tokio::test]
async fn search_omits_absent_optional_fields() {
    let transport = FakeTransport::json(200, empty_page());
    let client = client_with(transport.clone(), Some("test-key"));

    client
        .search(&SearchRequest::new(CardType::Edit, SearchType::Object, "lamp"))
        .await
        .unwrap();

    let body = body_of(&transport.calls()[0]);
    let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 3);
    assert!(body.get("link").is_none());
    assert!(body.get("isPhoto").is_none());
    assert_eq!(body["card_type"], "edit");
    assert_eq!(body["search_type"], "object");
}

#[tokio::test]
async fn missing_api_key_sends_no_authorization() {
    let transport = FakeTransport::json(200, empty_page());
    let client = client_with(transport.clone(), None);

    client
        .search(&SearchRequest::keyword(CardType::Create, "x"))
        .await
        .unwrap();

    assert!(transport.calls()[0].header("authorization").is_none());
}

#[tokio::test]
async fn empty_search_value_is_sent_through() {
    let transport = FakeTransport::json(400, json!({"message": "value is required"}));
    let client = client_with(transport.clone(), Some("test-key"));

    let err = client
        .search(&SearchRequest::keyword(CardType::Create, ""))
        .await
        .unwrap_err();

    assert_eq!(transport.calls().len(), 1);
    assert_eq!(err.code(), ErrorCode::HttpError);
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.message(), "value is required");
}

#[tokio::test]
async fn get_prompt_sends_skey() {
    let payload = json!({"success": true, "prompt": "prompt"});
    let transport = FakeTransport::json(200, payload);
    let client = client_with(transport.clone(), Some("test-key"));

    let result = client.get_prompt("card-key").await.unwrap();
    assert!(result.success);
    assert_eq!(result.prompt, "prompt");

    let req = &transport.calls()[0];
    assert_eq!(req.url, "https://api.daims.ai/api/card");
    assert_eq!(body_of(req), json!({"skey": "card-key"}));
}

#[tokio::test]
async fn empty_skey_never_reaches_transport() {
    let transport = FakeTransport::json(200, json!({"success": true, "prompt": "p"}));
    let client = client_with(transport.clone(), Some("test-key"));

    for skey in ["", " ", "\n\t"] {
        let err = client.get_prompt(skey).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn custom_base_url_is_used() {
    let transport = FakeTransport::json(200, empty_page());
    let config = ClientConfig::builder()
        .base_url("http://127.0.0.1:9999/")
        .transport(transport.clone())
        .build()
        .unwrap();
    DaimsClient::new(config)
        .search(&SearchRequest::keyword(CardType::Create, "x"))
        .await
        .unwrap();

    assert_eq!(transport.calls()[0].url, "http://127.0.0.1:9999/api/search");
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_search_result_is_returned_verbatim() {
    let transport = FakeTransport::json(200, empty_page());
    let client = client_with(transport, Some("test-key"));

    let result: SearchResponse = client
        .search(&SearchRequest::keyword(CardType::Create, "cinematic portrait"))
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.data.items.is_empty());
    assert_eq!(serde_json::to_value(&result).unwrap(), empty_page());
}

#[tokio::test]
async fn search_items_keep_server_order() {
    let page = json!({
        "success": true,
        "data": {"count": 3, "hasNext": true, "limit": 3, "offset": 0, "items": [item(3), item(1), item(2)]}
    });
    let client = client_with(FakeTransport::json(200, page.clone()), None);

    let result = client
        .search(&SearchRequest::keyword(CardType::Create, "x"))
        .await
        .unwrap();

    let ids: Vec<&str> = result.data.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["card-3", "card-1", "card-2"]);
    assert!(result.data.has_next);
    assert_eq!(result.data.items[0].image_url(), "https://asset.daims.ai/images/create/0003.png");
    assert_eq!(serde_json::to_value(&result).unwrap(), page);
}

#[tokio::test]
async fn unexpected_shape_is_decode_error() {
    let client = client_with(FakeTransport::json(200, json!({"success": true})), None);

    let err = client.get_prompt("card-key").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::DecodeError);
    assert!(err.status().is_none());
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_error_carries_status_and_body() {
    let transport = FakeTransport::json(401, json!({"message": "unauthorized"}));
    let client = client_with(transport, Some("invalid"));

    let err = client
        .search(&SearchRequest::keyword(CardType::Create, "x"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::HttpError);
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.response_body(), Some(&json!({"message": "unauthorized"})));
    assert_eq!(err.message(), "unauthorized");
    assert_eq!(err.to_string(), "unauthorized");
}

#[tokio::test]
async fn plain_text_error_body_becomes_message() {
    let transport = FakeTransport::new(Reply::Respond(HttpResponse {
        status: 503,
        headers: vec![("content-type".to_string(), "text/plain".to_string())],
        body: "maintenance".to_string(),
    }));
    let err = client_with(transport, None).get_prompt("k").await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::HttpError);
    assert_eq!(err.message(), "maintenance");
    assert_eq!(err.response_body(), Some(&json!("maintenance")));
}

#[tokio::test]
async fn hanging_transport_times_out() {
    let transport = FakeTransport::new(Reply::Hang);
    let config = ClientConfig::builder()
        .api_key("test-key")
        .timeout_ms(1)
        .transport(transport)
        .build()
        .unwrap();
    let client = DaimsClient::new(config);

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        client.search(&SearchRequest::new(CardType::Edit, SearchType::Style, "warm tone")),
    )
    .await
    .expect("client did not give up within the bounded wait")
    .unwrap_err();

    assert_eq!(err.code(), ErrorCode::RequestTimeout);
    assert_eq!(err.message(), "Request timed out after 1ms");
    assert!(err.source().is_some());
}

#[tokio::test]
async fn transport_abort_is_a_timeout() {
    let client = client_with(FakeTransport::new(Reply::Abort), None);

    let err = client.get_prompt("k").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::RequestTimeout);
    assert_eq!(err.message(), "Request timed out after 10000ms");
}

#[tokio::test]
async fn transport_failure_is_network_error() {
    let client = client_with(FakeTransport::new(Reply::Fail("socket hang up")), Some("test-key"));

    let err = client
        .search(&SearchRequest::new(CardType::Create, SearchType::Object, "lamp"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::NetworkError);
    assert_eq!(err.message(), "Network request failed");
    let cause = err.source().unwrap();
    assert!(cause.downcast_ref::<TransportError>().is_some());
    assert!(cause.to_string().contains("socket hang up"));
}

#[tokio::test]
async fn clients_are_shared_across_tasks() {
    let transport = FakeTransport::json(200, empty_page());
    let client = client_with(transport.clone(), Some("test-key"));

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .search(&SearchRequest::keyword(CardType::Create, format!("q{n}")))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(transport.calls().len(), 4);
}

#[cfg(not(feature = "ureq-transport"))]
#[tokio::test]
async fn no_transport_is_fetch_unavailable() {
    let client = DaimsClient::new(ClientConfig::default());
    let err = client
        .search(&SearchRequest::keyword(CardType::Create, "x"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FetchUnavailable);
}
