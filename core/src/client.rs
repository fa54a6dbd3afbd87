//! Metaserv clients.
//!
//! # Design
//! `MetaHttpClient` maps each metaserv endpoint to one GET through
//! `HttpClient` and hands back the raw `HttpResponse`. `MetaClient` is the
//! caller-facing facade: it validates identifiers, decodes successful bodies
//! to `serde_json::Value` and turns failures into a `ClientError` through
//! `classify`. Neither layer retries or caches.

use serde_json::Value;

use crate::auth::Auth;
use crate::config::ClientConfig;
use crate::error::{classify, ClientError, RequestFailure, Result, TransportError};
use crate::http::{HttpMethod, HttpResponse};
use crate::path::ResourcePath;
use crate::transport::{HttpClient, RequestOptions};

/// Low-level metaserv client. Deals only in raw responses.
///
/// Identifiers are percent-encoded here but otherwise unchecked.
#[derive(Debug, Clone)]
pub struct MetaHttpClient {
    http: HttpClient,
}

impl MetaHttpClient {
    pub const ENDPOINT: &'static str = "/meta";

    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::new(HttpClient::new(config))
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Full URL a request for `path` would hit.
    pub fn url_for(&self, path: &ResourcePath) -> String {
        self.http.target(Self::ENDPOINT, &path.to_string())
    }

    pub fn get(&self, path: &ResourcePath) -> std::result::Result<HttpResponse, RequestFailure> {
        self.http.do_request(
            HttpMethod::Get,
            Self::ENDPOINT,
            &path.to_string(),
            RequestOptions::default(),
        )
    }

    pub fn get_root(&self) -> std::result::Result<HttpResponse, RequestFailure> {
        self.get(&root_path())
    }

    pub fn get_types(&self) -> std::result::Result<HttpResponse, RequestFailure> {
        self.get(&types_path())
    }

    pub fn get_db_names(&self, level: &str) -> std::result::Result<HttpResponse, RequestFailure> {
        self.get(&databases_path(level))
    }

    pub fn get_db_info(
        &self,
        level: &str,
        db: &str,
    ) -> std::result::Result<HttpResponse, RequestFailure> {
        self.get(&database_path(level, db))
    }

    pub fn get_table_names(
        &self,
        level: &str,
        db: &str,
    ) -> std::result::Result<HttpResponse, RequestFailure> {
        self.get(&tables_path(level, db))
    }

    pub fn get_table_info(
        &self,
        level: &str,
        db: &str,
        table: &str,
    ) -> std::result::Result<HttpResponse, RequestFailure> {
        self.get(&table_path(level, db, table))
    }

    pub fn get_table_schema(
        &self,
        level: &str,
        db: &str,
        table: &str,
    ) -> std::result::Result<HttpResponse, RequestFailure> {
        self.get(&schema_path(level, db, table))
    }
}

fn root_path() -> ResourcePath {
    ResourcePath::root()
}

fn types_path() -> ResourcePath {
    ResourcePath::root().literal("db")
}

fn databases_path(level: &str) -> ResourcePath {
    types_path().identifier(level)
}

fn database_path(level: &str, db: &str) -> ResourcePath {
    databases_path(level).identifier(db)
}

fn tables_path(level: &str, db: &str) -> ResourcePath {
    database_path(level, db).literal("tables")
}

fn table_path(level: &str, db: &str, table: &str) -> ResourcePath {
    tables_path(level, db).identifier(table)
}

fn schema_path(level: &str, db: &str, table: &str) -> ResourcePath {
    table_path(level, db, table).literal("schema")
}

/// High-level metaserv client.
///
/// Every method either returns the decoded JSON body or exactly one
/// `ClientError`. Safe to share between threads when the underlying
/// transport is.
#[derive(Debug, Clone)]
pub struct MetaClient {
    http: MetaHttpClient,
}

impl MetaClient {
    pub fn new(http: MetaHttpClient) -> Self {
        Self { http }
    }

    /// Build a client for `url`, optionally authenticating every request.
    pub fn from_url(url: &str, auth: Option<Auth>) -> Result<Self> {
        let config = ClientConfig::builder(url).auth_opt(auth).build()?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::new(MetaHttpClient::from_config(config))
    }

    pub fn http_client(&self) -> &MetaHttpClient {
        &self.http
    }

    pub fn root(&self) -> Result<Value> {
        self.fetch(&root_path())
    }

    /// Instance levels (`DC`, `L1`, `L2`, `L3`, `dev`) with at least one
    /// database.
    pub fn list_types(&self) -> Result<Value> {
        self.fetch(&types_path())
    }

    pub fn list_databases(&self, level: &str) -> Result<Value> {
        require("instance level", level)?;
        self.fetch(&databases_path(level))
    }

    pub fn database_info(&self, level: &str, db: &str) -> Result<Value> {
        require("instance level", level)?;
        require("database name", db)?;
        self.fetch(&database_path(level, db))
    }

    pub fn list_tables(&self, level: &str, db: &str) -> Result<Value> {
        require("instance level", level)?;
        require("database name", db)?;
        self.fetch(&tables_path(level, db))
    }

    pub fn table_info(&self, level: &str, db: &str, table: &str) -> Result<Value> {
        require("instance level", level)?;
        require("database name", db)?;
        require("table name", table)?;
        self.fetch(&table_path(level, db, table))
    }

    pub fn table_schema(&self, level: &str, db: &str, table: &str) -> Result<Value> {
        require("instance level", level)?;
        require("database name", db)?;
        require("table name", table)?;
        self.fetch(&schema_path(level, db, table))
    }

    fn fetch(&self, path: &ResourcePath) -> Result<Value> {
        let response = self.http.get(path).map_err(|failure| classify(&failure))?;
        response.json().map_err(|e| {
            ClientError::Transport(TransportError {
                url: self.http.url_for(path),
                status: Some(response.status),
                headers: Some(response.headers.clone()),
                body: Some(response.body.clone()),
                reason: format!("invalid JSON in response body: {e}"),
            })
        })
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ClientError::Usage(format!("{what} must not be empty")));
    }
    Ok(())
}
