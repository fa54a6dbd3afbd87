//! Every facade operation against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background tokio runtime,
//! then drives `MetaClient` over real HTTP through the default ureq transport.

use std::io::{BufRead, BufReader, Write};
use std::net::SocketAddr;

use metaserv_core::{Auth, ClientConfig, ClientError, MetaClient};
use serde_json::json;

/// Start a mock server on a random port and return its address.
fn spawn_server(token: Option<String>) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            metaserv_mock::run_with_token(listener, token).await
        })
        .unwrap();
    });

    addr
}

/// Answer every connection with `response`, written verbatim to the socket.
fn spawn_raw_server(response: Vec<u8>) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = stream.unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            // The client may hang up early once its body limit is hit.
            let _ = stream.write_all(&response);
        }
    });

    addr
}

fn json_ok(body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}

#[test]
fn browse_catalog() {
    let addr = spawn_server(None);
    // Trailing slash on the base URL must not double up.
    let client = MetaClient::from_url(&format!("http://{addr}/"), None).unwrap();

    // Step 1: root.
    let root = client.root().unwrap();
    assert_eq!(root["name"], "metaserv");

    // Step 2: instance levels with at least one database.
    assert_eq!(client.list_types().unwrap(), json!(["DC", "L2"]));

    // Step 3: databases in DC.
    assert_eq!(
        client.list_databases("DC").unwrap(),
        json!(["source catalog", "sources"])
    );

    // Step 4: database info, including one whose name needs quoting.
    let info = client.database_info("DC", "sources").unwrap();
    assert_eq!(info["name"], "sources");
    let info = client.database_info("DC", "source catalog").unwrap();
    assert_eq!(info["name"], "source catalog");

    // Step 5: tables.
    assert_eq!(
        client.list_tables("DC", "sources").unwrap(),
        json!(["galaxies", "stars"])
    );

    // Step 6: table info.
    let table = client.table_info("DC", "sources", "galaxies").unwrap();
    assert_eq!(table["columnCount"], 4);

    // Step 7: table schema.
    let schema = client.table_schema("DC", "sources", "galaxies").unwrap();
    let columns = schema.as_array().unwrap();
    assert_eq!(columns.len(), 4);
    assert_eq!(columns[0], json!({"name": "objectId", "type": "BIGINT", "nullable": false}));
}

#[test]
fn missing_table_is_service_error() {
    let addr = spawn_server(None);
    let client = MetaClient::from_url(&format!("http://{addr}"), None).unwrap();

    let err = client.table_schema("DC", "sources", "quasars").unwrap_err();
    let ClientError::Service(service) = err else {
        panic!("expected service error");
    };
    assert_eq!(service.exception, "NotFound");
    assert_eq!(service.status, 404);
    assert_eq!(
        service.url,
        format!("http://{addr}/meta/db/DC/sources/tables/quasars/schema")
    );
    assert_eq!(service.message.as_deref(), Some("no such table"));
    assert_eq!(service.metadata.unwrap()["table"], "quasars");
}

#[test]
fn plain_text_failure_is_transport_error() {
    let addr = spawn_server(None);
    let client = MetaClient::from_url(&format!("http://{addr}"), None).unwrap();

    // Not a facade operation; go through the low-level client.
    let path = metaserv_core::ResourcePath::root().literal("broken");
    let failure = client.http_client().get(&path).unwrap_err();
    let err = metaserv_core::classify(&failure);
    let ClientError::Transport(transport) = err else {
        panic!("expected transport error");
    };
    assert_eq!(transport.status, Some(500));
    assert_eq!(transport.body.as_deref(), Some("internal server error"));
    assert_eq!(transport.url, format!("http://{addr}/meta/broken"));
}

#[test]
fn connection_refused_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = MetaClient::from_url(&format!("http://{addr}"), None).unwrap();

    let err = client.list_types().unwrap_err();
    let ClientError::Transport(transport) = err else {
        panic!("expected transport error");
    };
    assert_eq!(transport.status, None);
    assert_eq!(transport.headers, None);
    assert_eq!(transport.body, None);
}

#[test]
fn large_body_is_read_in_full() {
    // Past ureq's default 10 MiB cap.
    let levels = vec!["\"DC\""; 3 * 1024 * 1024].join(",");
    let addr = spawn_raw_server(json_ok(&format!("[{levels}]")));
    let client = MetaClient::from_url(&format!("http://{addr}"), None).unwrap();

    let types = client.list_types().unwrap();
    assert_eq!(types.as_array().unwrap().len(), 3 * 1024 * 1024);
}

#[test]
fn body_over_limit_keeps_status_and_headers() {
    let addr = spawn_raw_server(json_ok(r#"["DC","L1","L2","L3","dev"]"#));
    let config = ClientConfig::builder(format!("http://{addr}"))
        .max_body_size(8)
        .build()
        .unwrap();
    let client = MetaClient::from_config(config);

    let err = client.list_types().unwrap_err();
    assert_eq!(err.status(), Some(200));
    let ClientError::Transport(transport) = err else {
        panic!("expected transport error");
    };
    let headers = transport.headers.unwrap();
    assert!(headers
        .iter()
        .any(|(name, value)| name.eq_ignore_ascii_case("content-type") && value == "application/json"));
    assert_eq!(transport.body.as_deref(), Some(""));
    assert!(transport.reason.starts_with("failed to read response body"));
}

#[test]
fn bearer_auth_reaches_server() {
    let addr = spawn_server(Some("s3cret".to_string()));

    let anonymous = MetaClient::from_url(&format!("http://{addr}"), None).unwrap();
    let err = anonymous.list_types().unwrap_err();
    assert_eq!(err.exception(), Some("Unauthorized"));

    let config = ClientConfig::builder(format!("http://{addr}"))
        .auth(Auth::bearer("s3cret"))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap();
    let client = MetaClient::from_config(config);
    assert_eq!(client.list_types().unwrap(), json!(["DC", "L2"]));
}
