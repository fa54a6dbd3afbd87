//! Error types for the metaserv client.
//!
//! # Design
//! Low-level failures (`TransportFault`, `RequestFailure`) describe what
//! happened on the wire. `classify` turns a `RequestFailure` into the
//! caller-facing `ClientError`: a `ServiceError` when the service answered
//! with a structured `{"exception": ...}` payload, a `TransportError`
//! otherwise. Every type here is `Clone + PartialEq` so identical failures
//! classify to equal values.

use std::fmt;

use serde_json::Value;

use crate::http::HttpResponse;

/// The transport could not complete a round trip (refused connection, DNS
/// failure, timeout, TLS error, unreadable body).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportFault {
    pub message: String,
    /// Status and headers of a response whose body could not be read. The
    /// body is left empty.
    pub response: Option<HttpResponse>,
}

impl TransportFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }

    /// A fault raised after the status line and headers were received.
    pub fn incomplete(message: impl Into<String>, response: HttpResponse) -> Self {
        Self {
            message: message.into(),
            response: Some(response),
        }
    }
}

/// A request that did not end in a 2xx response.
///
/// `response` is `None` only when nothing came back from the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request to {url} failed: {reason}")]
pub struct RequestFailure {
    pub url: String,
    pub response: Option<HttpResponse>,
    pub reason: String,
}

impl RequestFailure {
    pub fn from_fault(url: impl Into<String>, fault: TransportFault) -> Self {
        Self {
            url: url.into(),
            response: fault.response,
            reason: fault.message,
        }
    }

    pub fn from_status(url: impl Into<String>, response: HttpResponse) -> Self {
        let url = url.into();
        let reason = format!("HTTP status {} for url {url}", response.status);
        Self {
            url,
            response: Some(response),
            reason,
        }
    }
}

/// The request failed without a structured service payload.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct TransportError {
    pub url: String,
    pub status: Option<u16>,
    pub headers: Option<Vec<(String, String)>>,
    pub body: Option<String>,
    /// Description of the underlying low-level failure.
    pub reason: String,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "(HTTP Error: {status}): ")?,
            None => f.write_str("(HTTP Error: none): ")?,
        }
        match self.body.as_deref() {
            Some(body) if !body.is_empty() => f.write_str(body),
            _ => f.write_str(&self.reason),
        }
    }
}

/// The service reported a failure through an `exception` payload.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("metaserv sent exception {exception} with message: {}", .message.as_deref().unwrap_or("<none>"))]
pub struct ServiceError {
    pub url: String,
    pub status: u16,
    pub exception: String,
    pub message: Option<String>,
    pub cause: Option<Value>,
    pub metadata: Option<Value>,
}

/// Every failure a client call can return.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Invalid caller input, caught before any network call.
    #[error("invalid request: {0}")]
    Usage(String),
}

impl ClientError {
    /// HTTP status of the failed response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Transport(e) => e.status,
            ClientError::Service(e) => Some(e.status),
            ClientError::Usage(_) => None,
        }
    }

    /// Exception identifier sent by the service.
    pub fn exception(&self) -> Option<&str> {
        match self {
            ClientError::Service(e) => Some(e.exception.as_str()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Decide which `ClientError` a failed request maps to.
///
/// Never fails: a body that does not parse falls back to `TransportError`.
pub fn classify(failure: &RequestFailure) -> ClientError {
    let service = failure
        .response
        .as_ref()
        .and_then(|response| service_error(&failure.url, response));
    if let Some(service) = service {
        return ClientError::Service(service);
    }
    ClientError::Transport(transport_error(failure))
}

/// Only a JSON object with a string `exception` member is a service payload.
fn service_error(url: &str, response: &HttpResponse) -> Option<ServiceError> {
    if !response.is_json() {
        return None;
    }
    let Ok(Value::Object(mut payload)) = serde_json::from_str::<Value>(&response.body) else {
        return None;
    };
    let Some(Value::String(exception)) = payload.remove("exception") else {
        return None;
    };
    let present = |v: Value| (!v.is_null()).then_some(v);
    Some(ServiceError {
        url: url.to_string(),
        status: response.status,
        exception,
        message: payload.remove("message").and_then(present).map(|m| match m {
            Value::String(s) => s,
            other => other.to_string(),
        }),
        cause: payload.remove("cause").and_then(present),
        metadata: payload.remove("metadata").and_then(present),
    })
}

fn transport_error(failure: &RequestFailure) -> TransportError {
    let response = failure.response.as_ref();
    TransportError {
        url: failure.url.clone(),
        status: response.map(|r| r.status),
        headers: response.map(|r| r.headers.clone()),
        body: response.map(|r| r.body.clone()),
        reason: failure.reason.clone(),
    }
}
