//! Parses JSON-RPC 2.0 requests, routes `initialize`, `tools/list`, and
//! `tools/call`, and formats responses — preserving the request `id`
//! verbatim, including omitting it when the request didn't carry one.
//!
//! Two-level error split, by design: anything that happens *before*
//! dispatch (parse failures, unknown methods, malformed `tools/call`
//! shape) becomes a JSON-RPC error object with code `-32000`. Anything the
//! dispatch pipeline catches (validation, not-found, handler failures)
//! becomes an error [`Envelope`] embedded in `result` — never a JSON-RPC
//! error object.

use serde_json::{Map, Value, json};

use crate::dispatch;
use crate::registry::ToolRegistry;
use crate::response::Envelope;

const PROTOCOL_VERSION: &str = "2024-11-05";
const PROTOCOL_ERROR_CODE: i64 = -32000;

#[derive(Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Handle one already-framed line of input, returning the JSON value to
/// write back as a single response line. Never panics on malformed input.
pub async fn handle_line(line: &str, registry: &ToolRegistry, info: &ServerInfo) -> Value {
    let parsed: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => return protocol_error(None, format!("Parse error: {e}")),
    };

    let Some(obj) = parsed.as_object() else {
        return protocol_error(None, "Invalid request: expected a JSON object".to_string());
    };

    let has_id = obj.contains_key("id");
    let id = obj.get("id").cloned();

    let Some(method) = obj.get("method").and_then(Value::as_str) else {
        return protocol_error(id_if_present(has_id, id), "Invalid request: missing method".to_string());
    };

    let params = obj.get("params").cloned();

    match method {
        "initialize" => success(has_id, id, initialize_result(info)),
        "tools/list" => success(has_id, id, tools_list_result(registry)),
        "tools/call" => match handle_tools_call(params, registry).await {
            Ok(result) => success(has_id, id, result),
            Err(message) => protocol_error(id_if_present(has_id, id), message),
        },
        other => protocol_error(id_if_present(has_id, id), format!("Unknown method: {other}")),
    }
}

fn id_if_present(has_id: bool, id: Option<Value>) -> Option<Value> {
    if has_id { id } else { None }
}

fn initialize_result(info: &ServerInfo) -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": { "name": info.name, "version": info.version },
    })
}

fn tools_list_result(registry: &ToolRegistry) -> Value {
    let tools: Vec<Value> = registry
        .list()
        .into_iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.schema.raw(),
            })
        })
        .collect();
    json!({ "tools": tools })
}

/// Route a `tools/call` request. The `Err` case here is always a malformed
/// *request* (missing/invalid `params.name`) — a true protocol-level
/// failure. A tool that simply doesn't exist, or a tool whose handler
/// fails, produces an `Ok` envelope instead: those are reported to the
/// caller as error envelopes, not protocol errors.
async fn handle_tools_call(params: Option<Value>, registry: &ToolRegistry) -> Result<Value, String> {
    let params = params.unwrap_or_else(|| json!({}));
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Err("Invalid request: params.name is required".to_string());
    };

    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    let envelope = match registry.get(name) {
        Some(tool) => dispatch::dispatch(&tool, arguments).await,
        None => Envelope::error(format!("Tool not found: {name}")),
    };

    Ok(envelope_to_result(&envelope))
}

fn envelope_to_result(envelope: &Envelope) -> Value {
    json!({
        "content": envelope.content.iter().map(|p| json!({"type": p.kind, "text": p.text})).collect::<Vec<_>>(),
        "is_error": envelope.is_error,
    })
}

fn success(has_id: bool, id: Option<Value>, result: Value) -> Value {
    let mut map = Map::new();
    map.insert("jsonrpc".to_string(), json!("2.0"));
    if has_id {
        map.insert("id".to_string(), id.unwrap_or(Value::Null));
    }
    map.insert("result".to_string(), result);
    Value::Object(map)
}

fn protocol_error(id: Option<Value>, message: String) -> Value {
    let mut map = Map::new();
    map.insert("jsonrpc".to_string(), json!("2.0"));
    if let Some(id) = id {
        map.insert("id".to_string(), id);
    }
    map.insert(
        "error".to_string(),
        json!({ "code": PROTOCOL_ERROR_CODE, "message": message }),
    );
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Tool;
    use crate::response::Envelope;

    fn info() -> ServerInfo {
        ServerInfo { name: "test-server".to_string(), version: "0.0.0".to_string() }
    }

    #[tokio::test]
    async fn initialize_echoes_id_and_reports_protocol_version() {
        let registry = ToolRegistry::new();
        let response = handle_line(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            &registry,
            &info(),
        )
        .await;
        assert_eq!(response["jsonrpc"], json!("2.0"));
        assert_eq!(response["id"], json!(1));
        assert_eq!(response["result"]["protocolVersion"], json!("2024-11-05"));
        assert_eq!(response["result"]["serverInfo"]["name"], json!("test-server"));
    }

    #[tokio::test]
    async fn request_without_id_gets_response_without_id() {
        let registry = ToolRegistry::new();
        let response = handle_line(r#"{"jsonrpc":"2.0","method":"initialize"}"#, &registry, &info()).await;
        assert!(response.as_object().unwrap().get("id").is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_a_protocol_error() {
        let registry = ToolRegistry::new();
        let response = handle_line(
            r#"{"jsonrpc":"2.0","id":2,"method":"nope"}"#,
            &registry,
            &info(),
        )
        .await;
        assert_eq!(response["error"]["code"], json!(-32000));
        assert_eq!(response["error"]["message"], json!("Unknown method: nope"));
        assert!(response.as_object().unwrap().get("result").is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_a_protocol_error_without_id() {
        let registry = ToolRegistry::new();
        let response = handle_line("not json", &registry, &info()).await;
        assert!(response.as_object().unwrap().get("id").is_none());
        assert_eq!(response["error"]["code"], json!(-32000));
    }

    #[tokio::test]
    async fn tools_list_enumerates_registered_tools() {
        let registry = ToolRegistry::new();
        registry
            .register(Tool::new(
                "execute_query",
                "runs a query",
                json!({"type": "object", "properties": {"connectionId": {"type": "string"}}}),
                |_args| async { Ok(Envelope::text("ok")) },
            ))
            .unwrap();
        let response = handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#, &registry, &info()).await;
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], json!("execute_query"));
        assert!(tools[0]["inputSchema"]["properties"]["connectionId"].is_object());
    }

    #[tokio::test]
    async fn calling_unknown_tool_is_an_error_envelope_not_a_protocol_error() {
        let registry = ToolRegistry::new();
        let response = handle_line(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"ghost"}}"#,
            &registry,
            &info(),
        )
        .await;
        assert!(response.as_object().unwrap().get("error").is_none());
        assert_eq!(response["result"]["is_error"], json!(true));
        assert_eq!(
            response["result"]["content"][0]["text"],
            json!("Error: Tool not found: ghost")
        );
    }
}
