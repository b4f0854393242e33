//! End-to-end scenarios driven straight through the JSON-RPC kernel, one
//! line in, one decoded response out — no transport involved, since the
//! transport's own framing is already covered by its unit tests.

use std::sync::Arc;

use serde_json::{Value, json};

use mcp_tool_server::config::Config;
use mcp_tool_server::db::manager::ConnectionManager;
use mcp_tool_server::db::module::DatabaseModule;
use mcp_tool_server::module::{Module, ModuleHost};
use mcp_tool_server::registry::ToolRegistry;
use mcp_tool_server::rpc::kernel::{self, ServerInfo};
use mcp_tool_server::web::WebModule;

async fn fresh_registry() -> (ToolRegistry, Arc<ConnectionManager>) {
    let registry = ToolRegistry::new();
    let config = Arc::new(Config::default());
    let manager = Arc::new(ConnectionManager::new());

    let host = ModuleHost::new();
    host.initialize(&DatabaseModule::new(manager.clone(), config.clone()), &registry)
        .await
        .unwrap();

    let host = ModuleHost::new();
    host.initialize(&WebModule::new(config), &registry).await.unwrap();

    (registry, manager)
}

fn info() -> ServerInfo {
    ServerInfo {
        name: "mcp-tool-server".to_string(),
        version: "0.0.0-test".to_string(),
    }
}

fn call(name: &str, arguments: Value, id: i64) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
    .to_string()
}

fn tool_result_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

#[tokio::test]
async fn s1_initialize_reports_protocol_version_and_server_info() {
    let (registry, _manager) = fresh_registry().await;
    let response = kernel::handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#, &registry, &info()).await;

    assert_eq!(response["jsonrpc"], json!("2.0"));
    assert_eq!(response["id"], json!(1));
    assert_eq!(response["result"]["protocolVersion"], json!("2024-11-05"));
    assert_eq!(response["result"]["capabilities"], json!({ "tools": {} }));
    assert_eq!(response["result"]["serverInfo"]["name"], json!("mcp-tool-server"));
}

#[tokio::test]
async fn s2_tools_list_includes_execute_query_with_connection_id_property() {
    let (registry, _manager) = fresh_registry().await;
    let response = kernel::handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#, &registry, &info()).await;

    let tools = response["result"]["tools"].as_array().unwrap();
    let execute_query = tools.iter().find(|t| t["name"] == json!("execute_query")).expect("execute_query must be registered");
    assert!(execute_query["inputSchema"]["properties"]["connectionId"].is_object());
}

#[tokio::test]
async fn s3_connect_then_query_round_trips_a_row() {
    let (registry, _manager) = fresh_registry().await;

    let connect = call("connect_database", json!({"connectionId": "c1", "config": {"type": "sqlite", "file": ":memory:"}}), 3);
    let response = kernel::handle_line(&connect, &registry, &info()).await;
    assert_eq!(response["result"]["is_error"], json!(false));

    let create = call("execute_query", json!({"connectionId": "c1", "query": "CREATE TABLE t(id INTEGER PRIMARY KEY, name TEXT)"}), 4);
    let response = kernel::handle_line(&create, &registry, &info()).await;
    assert_eq!(response["result"]["is_error"], json!(false));

    let insert = call(
        "execute_query",
        json!({"connectionId": "c1", "query": "INSERT INTO t(id,name) VALUES (?,?)", "params": ["1", "alice"]}),
        5,
    );
    let response = kernel::handle_line(&insert, &registry, &info()).await;
    assert_eq!(response["result"]["is_error"], json!(false));

    let select = call("execute_query", json!({"connectionId": "c1", "query": "SELECT * FROM t"}), 6);
    let response = kernel::handle_line(&select, &registry, &info()).await;
    assert_eq!(response["result"]["is_error"], json!(false));

    let decoded: Value = serde_json::from_str(tool_result_text(&response)).unwrap();
    assert_eq!(decoded["rowCount"], json!(1));
    let columns = decoded["columns"].as_array().unwrap();
    assert!(columns.iter().any(|c| c == "id"));
    assert!(columns.iter().any(|c| c == "name"));
    assert_eq!(decoded["rows"][0]["name"], json!("alice"));
}

#[tokio::test]
async fn s4_empty_query_fails_schema_validation() {
    let (registry, _manager) = fresh_registry().await;
    kernel::handle_line(
        &call("connect_database", json!({"connectionId": "c1", "config": {"type": "sqlite", "file": ":memory:"}}), 1),
        &registry,
        &info(),
    )
    .await;

    let response = kernel::handle_line(&call("execute_query", json!({"connectionId": "c1", "query": ""}), 2), &registry, &info()).await;

    assert!(response.as_object().unwrap().get("error").is_none());
    assert_eq!(response["result"]["is_error"], json!(true));
    let text = tool_result_text(&response);
    assert!(text.starts_with("Error: Input validation failed:"));
    assert!(text.contains("$.query"));
}

#[tokio::test]
async fn s5_failed_transaction_statement_rolls_back_all_inserts() {
    let (registry, _manager) = fresh_registry().await;
    kernel::handle_line(
        &call("connect_database", json!({"connectionId": "c1", "config": {"type": "sqlite", "file": ":memory:"}}), 1),
        &registry,
        &info(),
    )
    .await;
    kernel::handle_line(
        &call("execute_query", json!({"connectionId": "c1", "query": "CREATE TABLE t(id INTEGER PRIMARY KEY, name TEXT)"}), 2),
        &registry,
        &info(),
    )
    .await;

    let transaction = call(
        "execute_transaction",
        json!({
            "connectionId": "c1",
            "queries": [
                {"query": "INSERT INTO t(id,name) VALUES (?,?)", "params": ["1", "a"]},
                {"query": "INSERT INTO nonexistent VALUES (?)", "params": ["x"]},
            ]
        }),
        3,
    );
    let response = kernel::handle_line(&transaction, &registry, &info()).await;
    assert_eq!(response["result"]["is_error"], json!(true));

    let count = call("execute_query", json!({"connectionId": "c1", "query": "SELECT COUNT(*) AS n FROM t"}), 4);
    let response = kernel::handle_line(&count, &registry, &info()).await;
    let decoded: Value = serde_json::from_str(tool_result_text(&response)).unwrap();
    assert_eq!(decoded["rows"][0]["n"], json!(0));
}

#[tokio::test]
async fn s6_fetch_multiple_urls_rejects_batches_over_ten() {
    let (registry, _manager) = fresh_registry().await;
    let urls: Vec<String> = (0..11).map(|i| format!("https://example.com/{i}")).collect();

    let response = kernel::handle_line(&call("fetch_multiple_urls", json!({"urls": urls}), 1), &registry, &info()).await;

    assert_eq!(response["result"]["is_error"], json!(true));
    assert!(tool_result_text(&response).contains("Cannot fetch more than 10"));
}
