//! Blocking HTTP transport and the endpoint-agnostic request layer.
//!
//! # Design
//! `Transport` is the only place that touches the network. It returns an
//! `HttpResponse` for every status so that `HttpClient` alone decides what
//! counts as failure. `UreqTransport` is the default implementation; any
//! `Fn(&HttpRequest) -> Result<HttpResponse, TransportFault>` closure also
//! works, which is how tests intercept requests.
//!
//! `HttpClient` resolves the URL, attaches headers and auth, performs exactly
//! one round trip and returns the raw response. It never retries or decodes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ureq::typestate::WithBody;
use ureq::RequestBuilder;

use crate::config::ClientConfig;
use crate::error::{RequestFailure, TransportFault};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::path::resolve;

/// Executes a single HTTP round trip.
///
/// Implementations must be safe to share across threads; sharing one
/// `HttpClient` between threads is only sound if its transport is.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFault>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportFault> + Send + Sync,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFault> {
        self(request)
    }
}

/// `Transport` backed by a ureq `Agent`.
///
/// ureq's status-as-error behavior is disabled so 4xx/5xx responses come back
/// as data. Bodies are read without a size cap unless `body_limit` sets one.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    body_limit: Option<u64>,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: None,
        }
    }

    /// Transport honoring the timeout and body limit of `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.timeout).body_limit(config.max_body_size)
    }

    /// Largest response body to read, in bytes. `None` removes the cap.
    pub fn body_limit(mut self, limit: Option<u64>) -> Self {
        self.body_limit = limit;
        self
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFault> {
        let url = request.url.as_str();
        let body = request.body.as_deref();
        let sent = match request.method {
            HttpMethod::Get => decorate(self.agent.get(url), request).call(),
            HttpMethod::Delete => decorate(self.agent.delete(url), request).call(),
            HttpMethod::Post => send_body(decorate(self.agent.post(url), request), body),
            HttpMethod::Put => send_body(decorate(self.agent.put(url), request), body),
        };
        let mut response = sent.map_err(|e| TransportFault::new(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let mut received = HttpResponse {
            status,
            headers,
            body: String::new(),
        };
        // ureq caps bodies at 10 MiB unless told otherwise.
        let limit = self.body_limit.unwrap_or(u64::MAX);
        match response.body_mut().with_config().limit(limit).read_to_string() {
            Ok(body) => received.body = body,
            Err(e) => {
                return Err(TransportFault::incomplete(
                    format!("failed to read response body: {e}"),
                    received,
                ))
            }
        }
        Ok(received)
    }
}

fn decorate<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (key, value) in &request.params {
        builder = builder.query(key, value);
    }
    builder
}

fn send_body(
    builder: RequestBuilder<WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder
            .content_type("application/json")
            .send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

/// Optional extras for `HttpClient::do_request`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Endpoint-agnostic HTTP client bound to one `ClientConfig`.
#[derive(Clone)]
pub struct HttpClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl HttpClient {
    /// Client using `UreqTransport` with the configured timeout and body limit.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::from_config(&config);
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Full URL for `path` under `endpoint`. `path` must already be encoded.
    pub fn target(&self, endpoint: &str, path: &str) -> String {
        resolve(&resolve(&self.config.base_url, endpoint), path)
    }

    /// Perform one request and return the raw 2xx response.
    ///
    /// Non-2xx responses and transport faults become a `RequestFailure`
    /// carrying the URL and whatever response was received.
    pub fn do_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        target: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, RequestFailure> {
        let url = self.target(endpoint, target);

        let mut request = HttpRequest::new(method, url.clone());
        request.params = options.params;
        request.body = options.body;
        request.set_header("User-Agent", self.config.user_agent.clone());
        for (name, value) in options.headers {
            request.set_header(name, value);
        }
        if let Some(auth) = &self.config.auth {
            auth.apply(&mut request);
        }

        tracing::debug!(method = %method, url = %url, "sending request");
        let response = self
            .transport
            .execute(&request)
            .map_err(|fault| RequestFailure::from_fault(url.clone(), fault))?;
        tracing::debug!(status = response.status, url = %url, "received response");

        if !response.is_success() {
            return Err(RequestFailure::from_status(url, response));
        }
        Ok(response)
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
