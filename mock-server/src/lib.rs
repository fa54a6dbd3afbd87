//! In-memory metaserv used by integration tests and local development.
//!
//! Serves the read-only `/meta` API over a small seeded catalog. Failures are
//! answered with `application/json` bodies shaped
//! `{"exception": ..., "message": ..., "metadata": ...}`, except for
//! `/meta/broken` which returns plain text.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub description: String,
    pub columns: Vec<Column>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Database {
    pub name: String,
    pub level: String,
    pub description: String,
    #[serde(skip)]
    pub tables: BTreeMap<String, Table>,
}

/// Table summary returned by the table info endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub database: String,
    pub description: String,
    #[serde(rename = "columnCount")]
    pub column_count: usize,
}

/// Instance level → database name → database.
pub type Catalog = BTreeMap<String, BTreeMap<String, Database>>;

struct AppState {
    catalog: Catalog,
    token: Option<String>,
}

type Shared = Arc<AppState>;

/// A metaserv failure rendered as a JSON exception payload.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    exception: &'static str,
    message: String,
    metadata: Option<Value>,
}

impl ApiError {
    fn not_found(message: String, metadata: Value) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            exception: "NotFound",
            message,
            metadata: Some(metadata),
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            exception: "Unauthorized",
            message: "missing or invalid bearer token".to_string(),
            metadata: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "exception": self.exception, "message": self.message });
        if let Some(metadata) = self.metadata {
            body["metadata"] = metadata;
        }
        (self.status, Json(body)).into_response()
    }
}

fn column(name: &str, data_type: &str, nullable: bool) -> Column {
    Column {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable,
    }
}

fn table(name: &str, description: &str, columns: Vec<Column>) -> (String, Table) {
    (
        name.to_string(),
        Table {
            name: name.to_string(),
            description: description.to_string(),
            columns,
        },
    )
}

fn database(
    level: &str,
    name: &str,
    description: &str,
    tables: Vec<(String, Table)>,
) -> (String, Database) {
    (
        name.to_string(),
        Database {
            name: name.to_string(),
            level: level.to_string(),
            description: description.to_string(),
            tables: tables.into_iter().collect(),
        },
    )
}

/// Catalog served by `app()`.
pub fn seed_catalog() -> Catalog {
    let galaxies = table(
        "galaxies",
        "Extended sources",
        vec![
            column("objectId", "BIGINT", false),
            column("ra", "DOUBLE", false),
            column("decl", "DOUBLE", false),
            column("redshift", "FLOAT", true),
        ],
    );
    let stars = table(
        "stars",
        "Point sources",
        vec![
            column("objectId", "BIGINT", false),
            column("ra", "DOUBLE", false),
            column("decl", "DOUBLE", false),
        ],
    );
    let exposures = table(
        "exposures",
        "Raw exposure metadata",
        vec![column("exposureId", "BIGINT", false), column("filter", "CHAR(1)", false)],
    );

    let mut catalog = Catalog::new();
    catalog.insert(
        "DC".to_string(),
        [
            database(
                "DC",
                "sources",
                "Data challenge source catalog",
                vec![galaxies.clone(), stars],
            ),
            database(
                "DC",
                "source catalog",
                "Catalog with a space in its name",
                vec![galaxies],
            ),
        ]
        .into_iter()
        .collect(),
    );
    catalog.insert(
        "L2".to_string(),
        [database("L2", "visits", "Processed visits", vec![exposures])]
            .into_iter()
            .collect(),
    );
    catalog.insert("dev".to_string(), BTreeMap::new());
    catalog
}

pub fn app() -> Router {
    app_with_token(None)
}

/// Like `app()`, but requires `Authorization: Bearer <token>` when a token is
/// given.
pub fn app_with_token(token: Option<String>) -> Router {
    let state: Shared = Arc::new(AppState {
        catalog: seed_catalog(),
        token,
    });
    Router::new()
        .route("/meta", get(root))
        .route("/meta/broken", get(broken))
        .route("/meta/db", get(list_types))
        .route("/meta/db/{level}", get(list_databases))
        .route("/meta/db/{level}/{db}", get(database_info))
        .route("/meta/db/{level}/{db}/tables", get(list_tables))
        .route("/meta/db/{level}/{db}/tables/{table}", get(table_info))
        .route("/meta/db/{level}/{db}/tables/{table}/schema", get(table_schema))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_token(
    listener: TcpListener,
    token: Option<String>,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(token)).await
}

async fn require_token(State(state): State<Shared>, request: Request, next: Next) -> Response {
    if let Some(token) = &state.token {
        let expected = format!("Bearer {token}");
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            tracing::debug!(uri = %request.uri(), "rejecting unauthenticated request");
            return ApiError::unauthorized().into_response();
        }
    }
    next.run(request).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "metaserv",
        "links": { "db": "/meta/db" },
    }))
}

async fn broken() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain")],
        "internal server error",
    )
}

async fn list_types(State(state): State<Shared>) -> Json<Vec<String>> {
    let levels = state
        .catalog
        .iter()
        .filter(|(_, dbs)| !dbs.is_empty())
        .map(|(level, _)| level.clone())
        .collect();
    Json(levels)
}

fn find_level<'a>(
    state: &'a AppState,
    level: &str,
) -> Result<&'a BTreeMap<String, Database>, ApiError> {
    state.catalog.get(level).ok_or_else(|| {
        ApiError::not_found(
            format!("no such instance level: {level}"),
            json!({ "level": level }),
        )
    })
}

fn find_database<'a>(
    state: &'a AppState,
    level: &str,
    db: &str,
) -> Result<&'a Database, ApiError> {
    find_level(state, level)?.get(db).ok_or_else(|| {
        ApiError::not_found(
            format!("no such database: {db}"),
            json!({ "level": level, "db": db }),
        )
    })
}

fn find_table<'a>(
    state: &'a AppState,
    level: &str,
    db: &str,
    name: &str,
) -> Result<&'a Table, ApiError> {
    find_database(state, level, db)?.tables.get(name).ok_or_else(|| {
        ApiError::not_found(
            "no such table".to_string(),
            json!({ "level": level, "db": db, "table": name }),
        )
    })
}

async fn list_databases(
    State(state): State<Shared>,
    Path(level): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let dbs = find_level(&state, &level)?;
    Ok(Json(dbs.keys().cloned().collect()))
}

async fn database_info(
    State(state): State<Shared>,
    Path((level, db)): Path<(String, String)>,
) -> Result<Json<Database>, ApiError> {
    find_database(&state, &level, &db).cloned().map(Json)
}

async fn list_tables(
    State(state): State<Shared>,
    Path((level, db)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, ApiError> {
    let database = find_database(&state, &level, &db)?;
    Ok(Json(database.tables.keys().cloned().collect()))
}

async fn table_info(
    State(state): State<Shared>,
    Path((level, db, name)): Path<(String, String, String)>,
) -> Result<Json<TableInfo>, ApiError> {
    let table = find_table(&state, &level, &db, &name)?;
    Ok(Json(TableInfo {
        name: table.name.clone(),
        database: db,
        description: table.description.clone(),
        column_count: table.columns.len(),
    }))
}

async fn table_schema(
    State(state): State<Shared>,
    Path((level, db, name)): Path<(String, String, String)>,
) -> Result<Json<Vec<Column>>, ApiError> {
    let table = find_table(&state, &level, &db, &name)?;
    Ok(Json(table.columns.clone()))
}
