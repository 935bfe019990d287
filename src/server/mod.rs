//! MCP request dispatch.
//!
//! Transport-independent: the HTTP router and the stdio loop both hand raw
//! request text to [`McpServer::handle_str`].

pub mod http;
pub mod stdio;
pub mod transport;

use std::sync::Arc;

use serde_json::{Value, json};

use crate::tools::{ToolOutcome, ToolRegistry};
use transport::{
    INVALID_PARAMS, INVALID_REQUEST, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND,
    PARSE_ERROR,
};

pub const SERVER_NAME: &str = "kb-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Version offered when the client asks for one we do not speak.
pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Parse and handle one request. `None` for notifications.
    pub async fn handle_str(&self, input: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(input) {
            Ok(v) => v,
            Err(_) => return Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error")),
        };
        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            )),
        }
    }

    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!("MCP request: method={}", request.method);

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id.clone(), request.params.as_ref()),
            "ping" => JsonRpcResponse::success(request.id.clone(), json!({})),
            "tools/list" => self.handle_tools_list(request.id.clone()),
            "tools/call" => self.handle_tools_call(request.id.clone(), request.params).await,
            _ if request.id.is_none() => return None,
            other => JsonRpcResponse::error(
                request.id.clone(),
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        };

        if request.id.is_none() {
            return None;
        }
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>, params: Option<&Value>) -> JsonRpcResponse {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": negotiate_version(requested),
                "capabilities": {"tools": {}},
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({"tools": self.registry.definitions()}))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params");
        };
        let Some(name) = params.get("name").and_then(|n| n.as_str()) else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing tool name");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        match self.registry.call(name, arguments).await {
            Some(outcome) => JsonRpcResponse::success(id, tool_result(&outcome)),
            None => JsonRpcResponse::error(id, INVALID_PARAMS, format!("Unknown tool: {name}")),
        }
    }
}

/// The client's requested version when supported, otherwise ours.
fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v))
        .copied()
        .unwrap_or(PROTOCOL_VERSION)
}

/// MCP `CallToolResult` for an outcome.
fn tool_result(outcome: &ToolOutcome) -> Value {
    let structured = outcome.to_value();
    let text = serde_json::to_string_pretty(&structured).unwrap_or_else(|_| structured.to_string());
    json!({
        "content": [{"type": "text", "text": text}],
        "structuredContent": structured,
        "isError": outcome.is_error(),
    })
}
