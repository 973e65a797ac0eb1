//! Request executor: one POST per call, with auth, timeout and uniform error
//! mapping.
//!
//! # Design
//! `build_request` and `parse_response` are pure and carry all of the wire
//! rules; `execute` only resolves the transport, arms the deadline and runs
//! the exchange between them. The timer lives inside `tokio::time::timeout`
//! and is dropped with it on every return path.
//!
//! A timeout is recognised by identity: either the timer elapsed, or the
//! transport reported `TransportError::Aborted`. Any other transport failure
//! is a network error.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::{ClientConfig, DEFAULT_TIMEOUT};
use crate::error::{DaimsError, ErrorCode, Result};
use crate::http::{default_transport, Deadline, HttpRequest, HttpResponse, TransportError};

const NETWORK_ERROR_MESSAGE: &str = "Network request failed";
const FETCH_UNAVAILABLE_MESSAGE: &str = "No HTTP transport is available in this runtime.";

/// Build the POST request for `path`, serializing `body` (`{}` when absent).
pub fn build_request<B: Serialize + ?Sized>(
    config: &ClientConfig,
    path: &str,
    body: Option<&B>,
) -> Result<HttpRequest> {
    let body = match body {
        Some(body) => serde_json::to_string(body).map_err(|e| {
            DaimsError::validation(format!("request body could not be serialized: {e}"))
                .with_cause(e)
        })?,
        None => "{}".to_string(),
    };

    let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
    if let Some(key) = config.api_key() {
        headers.push(("Authorization".to_string(), format!("Bearer {key}")));
    }

    Ok(HttpRequest {
        url: format!("{}{path}", config.base_url()),
        headers,
        body,
    })
}

/// Interpret a response: parse its body by content type, then fail with
/// `HTTP_ERROR` on a non-2xx status.
///
/// The returned body is `None` for an empty non-JSON body and a JSON string
/// for any other non-JSON body.
pub fn parse_response(response: HttpResponse) -> Result<Option<Value>> {
    let body = parse_body(&response)?;

    if !response.is_success() {
        let message = message_from_body(body.as_ref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", response.status));
        return Err(DaimsError::http(response.status, message, body));
    }

    Ok(body)
}

fn parse_body(response: &HttpResponse) -> Result<Option<Value>> {
    let is_json = response
        .header("content-type")
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));

    if is_json {
        return serde_json::from_str(&response.body).map(Some).map_err(|e| {
            DaimsError::new(ErrorCode::NetworkError, NETWORK_ERROR_MESSAGE).with_cause(e)
        });
    }

    if response.body.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::String(response.body.clone())))
    }
}

/// A non-empty string body, else a non-empty string `message` field.
fn message_from_body(body: Option<&Value>) -> Option<&str> {
    match body? {
        Value::String(s) if !s.is_empty() => Some(s.as_str()),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        },
        _ => None,
    }
}

/// Perform one request against `config.base_url() + path`.
///
/// The body is returned unvalidated; decoding into a typed response is the
/// caller's job.
pub async fn execute<B: Serialize + ?Sized>(
    config: &ClientConfig,
    path: &str,
    body: Option<&B>,
) -> Result<Option<Value>> {
    let timeout = config.timeout().unwrap_or(DEFAULT_TIMEOUT);
    let transport = config
        .transport()
        .cloned()
        .or_else(default_transport)
        .ok_or_else(|| DaimsError::new(ErrorCode::FetchUnavailable, FETCH_UNAVAILABLE_MESSAGE))?;

    let request = build_request(config, path, body)?;
    let deadline = Deadline::after(timeout);

    tracing::debug!(path, timeout_ms = millis(timeout), "dispatching request");

    let outcome = tokio::time::timeout(timeout, transport.send(request, deadline)).await;

    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(TransportError::Aborted)) => {
            tracing::warn!(path, "request aborted by transport at deadline");
            return Err(timed_out(timeout).with_cause(TransportError::Aborted));
        }
        Ok(Err(err)) => {
            tracing::warn!(path, error = %err, "request failed");
            return Err(DaimsError::new(ErrorCode::NetworkError, NETWORK_ERROR_MESSAGE).with_cause(err));
        }
        Err(elapsed) => {
            tracing::warn!(path, "request timed out");
            return Err(timed_out(timeout).with_cause(elapsed));
        }
    };

    tracing::debug!(path, status = response.status, "response received");
    parse_response(response)
}

fn timed_out(timeout: Duration) -> DaimsError {
    DaimsError::new(
        ErrorCode::RequestTimeout,
        format!("Request timed out after {}ms", millis(timeout)),
    )
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
