//! Synchronous client for the metaserv metadata-catalog REST service.
//!
//! # Overview
//! Each `MetaClient` method maps onto one GET endpoint under `/meta`
//! (instances, databases, tables, schemas) and returns the decoded JSON body.
//! Failures come back as a `ClientError`:
//! - `Service`: the service sent a structured `{"exception": ...}` payload.
//! - `Transport`: anything else (connection failure, opaque error status).
//! - `Usage`: invalid input, caught before any network call.
//!
//! # Design
//! - `path` joins URL pieces with exactly one slash and percent-encodes
//!   caller identifiers.
//! - `transport::HttpClient` performs one round trip per call through a
//!   pluggable `Transport` (ureq by default) and never retries.
//! - `error::classify` is a pure function from a failed request to a
//!   `ClientError`.
//! - `ClientConfig` is immutable once built; no process-wide state.
//!
//! ```rust,no_run
//! use metaserv_core::{Auth, MetaClient};
//!
//! let client = MetaClient::from_url("http://localhost:5000", Some(Auth::bearer("token")))?;
//! let schema = client.table_schema("DC", "sources", "galaxies")?;
//! println!("{schema}");
//! # Ok::<(), metaserv_core::ClientError>(())
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod path;
pub mod transport;

pub use auth::Auth;
pub use client::{MetaClient, MetaHttpClient};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{
    classify, ClientError, RequestFailure, Result, ServiceError, TransportError, TransportFault,
};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use path::{encode_segment, resolve, ResourcePath};
pub use transport::{HttpClient, RequestOptions, Transport, UreqTransport};
