//! HTTP transport seam for the DAIMS client.
//!
//! # Design
//! Requests and responses are plain owned data. The request executor builds
//! an `HttpRequest`, hands it to a `Transport` together with a `Deadline`,
//! and interprets the returned `HttpResponse`. The transport is the only
//! piece that touches the network, so tests substitute an in-process
//! implementation and production code uses `UreqTransport`.
//!
//! Every request is a POST; the method is not carried in the data.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// An HTTP POST request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup; first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Point in time after which the executor abandons a request.
///
/// Armed when the request starts. Transports should bound their own I/O by
/// `remaining()` and report `TransportError::Aborted` when they give up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    timeout: Duration,
    expires_at: Instant,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self {
            timeout,
            expires_at: Instant::now() + timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn has_expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// Failure below the HTTP layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport stopped waiting because the deadline passed.
    #[error("request aborted at deadline")]
    Aborted,

    /// Connection, DNS, TLS or body read failure.
    #[error("transport failure: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl TransportError {
    pub fn failed(cause: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        TransportError::Failed(cause.into())
    }
}

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>>;

/// Sends one `HttpRequest` and yields its response.
///
/// Non-2xx statuses are responses, not errors. Implementations must be safe
/// to share between concurrent calls.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest, deadline: Deadline) -> TransportFuture<'_>;
}

/// Transport used when none is injected, if one is compiled in.
pub fn default_transport() -> Option<std::sync::Arc<dyn Transport>> {
    #[cfg(feature = "ureq-transport")]
    {
        Some(std::sync::Arc::new(UreqTransport::new()))
    }
    #[cfg(not(feature = "ureq-transport"))]
    {
        None
    }
}

#[cfg(feature = "ureq-transport")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq-transport")]
mod ureq_transport {
    use super::{Deadline, HttpRequest, HttpResponse, Transport, TransportError, TransportFuture};

    /// Blocking `ureq` agent driven from tokio's blocking pool.
    ///
    /// A fresh agent is configured per request so its global timeout matches
    /// the time left on the deadline.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UreqTransport;

    impl UreqTransport {
        pub fn new() -> Self {
            Self
        }
    }

    impl Transport for UreqTransport {
        fn send(&self, request: HttpRequest, deadline: Deadline) -> TransportFuture<'_> {
            Box::pin(async move {
                if deadline.has_expired() {
                    return Err(TransportError::Aborted);
                }
                tokio::task::spawn_blocking(move || execute(request, deadline))
                    .await
                    .map_err(TransportError::failed)?
            })
        }
    }

    fn execute(request: HttpRequest, deadline: Deadline) -> Result<HttpResponse, TransportError> {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(deadline.remaining()))
            .build()
            .new_agent();

        let mut builder = agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.send(request.body.as_bytes()).map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string().map_err(classify)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn classify(err: ureq::Error) -> TransportError {
        match err {
            ureq::Error::Timeout(_) => TransportError::Aborted,
            other => TransportError::failed(other),
        }
    }
}
