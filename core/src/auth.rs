//! Authentication strategies.
//!
//! An `Auth` is a single function applied to every outgoing `HttpRequest`
//! just before it reaches the transport. Token refresh, signing and similar
//! concerns live inside the function; the client only calls it.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::http::HttpRequest;

type AttachFn = dyn Fn(&mut HttpRequest) + Send + Sync;

/// Credential-attachment hook, cheap to clone and shareable across threads.
#[derive(Clone)]
pub struct Auth {
    attach: Arc<AttachFn>,
}

impl Auth {
    /// Wrap an arbitrary attach function.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut HttpRequest) + Send + Sync + 'static,
    {
        Self { attach: Arc::new(f) }
    }

    /// `Authorization: Bearer <token>`.
    pub fn bearer(token: impl Into<String>) -> Self {
        let value = format!("Bearer {}", token.into());
        Self::header("Authorization", value)
    }

    /// HTTP basic authentication.
    pub fn basic(username: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        Self::header("Authorization", format!("Basic {encoded}"))
    }

    /// A fixed header on every request, e.g. an API key.
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        Self::from_fn(move |req| req.set_header(name.clone(), value.clone()))
    }

    pub fn apply(&self, request: &mut HttpRequest) {
        (self.attach)(request);
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Auth(***REDACTED***)")
    }
}
