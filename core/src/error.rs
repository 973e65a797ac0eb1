//! Error type for the DAIMS client.
//!
//! # Design
//! Every failure, whether raised locally or by the remote API, is a single
//! `DaimsError` carrying a machine-readable `ErrorCode`. Callers branch on
//! `code()`; the message is for display and logging only. The underlying
//! cause (transport error, timer elapse) is kept for diagnostics and exposed
//! through `std::error::Error::source`.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, DaimsError>;

/// Machine-readable classification of a `DaimsError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Client configuration is incomplete or invalid.
    ConfigError,
    /// A call argument was rejected before any request was sent.
    ValidationError,
    /// The server answered with a non-2xx status.
    HttpError,
    /// No response arrived before the configured timeout.
    RequestTimeout,
    /// The exchange failed below HTTP (DNS, connect, TLS, unreadable body).
    NetworkError,
    /// No HTTP transport is available to send the request.
    FetchUnavailable,
    /// A 2xx body did not match the expected response shape.
    DecodeError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::HttpError => "HTTP_ERROR",
            ErrorCode::RequestTimeout => "REQUEST_TIMEOUT",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::FetchUnavailable => "FETCH_UNAVAILABLE",
            ErrorCode::DecodeError => "DECODE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every fallible `DaimsClient` operation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DaimsError {
    code: ErrorCode,
    message: String,
    status: Option<u16>,
    response_body: Option<Value>,
    #[source]
    cause: Option<BoxError>,
}

impl DaimsError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            response_body: None,
            cause: None,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// A non-2xx response, keeping its status and parsed body.
    pub(crate) fn http(status: u16, message: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            status: Some(status),
            response_body: body,
            ..Self::new(ErrorCode::HttpError, message)
        }
    }

    pub(crate) fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status for `HttpError`, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Parsed body of the failed response: JSON when the server labelled it
    /// so, a string for other non-empty bodies.
    pub fn response_body(&self) -> Option<&Value> {
        self.response_body.as_ref()
    }

    /// Timeouts, network failures, and `HttpError` with a 408, 429 or 5xx
    /// status. The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self.code {
            ErrorCode::RequestTimeout | ErrorCode::NetworkError => true,
            ErrorCode::HttpError => self
                .status
                .is_some_and(|s| s == 408 || s == 429 || (500..600).contains(&s)),
            _ => false,
        }
    }
}
