//! MCP server over stdio
//!
//! Reads newline-delimited JSON-RPC messages, answers requests in order and
//! stays silent for notifications. Only protocol messages go to the writer;
//! diagnostics go through `tracing` to stderr.

pub mod protocol;

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::errors::{AnalyzerError, Result};
use crate::tools::ToolExecutor;
use protocol::{
    Request, Response, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};

/// MCP tool server
pub struct McpServer {
    executor: Arc<ToolExecutor>,
    name: String,
}

impl McpServer {
    pub fn new(executor: Arc<ToolExecutor>, name: impl Into<String>) -> Self {
        Self {
            executor,
            name: name.into(),
        }
    }

    /// Serve stdin/stdout until stdin closes
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve one message per line from `reader` until end of input
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = %self.name, tools = self.executor.registry().len(), "MCP server started");
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(reply) = self.handle_line(&line).await {
                writer.write_all(reply.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        let mut stats: Vec<_> = self.executor.all_stats().into_iter().collect();
        stats.sort_by(|a, b| a.0.cmp(&b.0));
        for (tool, stats) in stats {
            info!(
                tool = %tool,
                calls = stats.total_executions,
                failed = stats.failed_executions,
                total_ms = stats.total_duration_ms,
                "Tool usage"
            );
        }
        info!("Input closed, MCP server stopping");
        Ok(())
    }

    /// Handle one raw message, returning the serialized reply if any
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_message(message).await?,
            Err(e) => {
                warn!(error = %e, "Unparseable message");
                Response::error(Value::Null, PARSE_ERROR, format!("Parse error: {}", e))
            }
        };

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Failed to serialize response");
                None
            }
        }
    }

    /// Handle one parsed message; `None` for notifications
    pub async fn handle_message(&self, message: Value) -> Option<Response> {
        let id = message.get("id").cloned();
        let request: Request = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                return Some(Response::error(
                    id.unwrap_or(Value::Null),
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ))
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(Response::error(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            ));
        }

        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification");
            return None;
        };

        let started = Instant::now();
        let outcome = self.dispatch(&request.method, request.params).await;
        debug!(
            method = %request.method,
            ok = outcome.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request handled"
        );

        Some(match outcome {
            Ok(result) => Response::success(id, result),
            Err((code, message)) => Response::error(id, code, message),
        })
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> std::result::Result<Value, (i64, String)> {
        match method {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(params.unwrap_or(Value::Null)).await,
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {}", other))),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": self.name,
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .executor
            .registry()
            .schemas()
            .into_iter()
            .map(|schema| schema.to_mcp())
            .collect();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, params: Value) -> std::result::Result<Value, (i64, String)> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| (INVALID_PARAMS, "Missing tool name".to_string()))?
            .to_string();
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(args) => args.clone(),
        };

        match self.executor.execute(&name, arguments).await {
            Ok(result) => Ok(json!({
                "content": [{ "type": "text", "text": result.text() }],
                "isError": !result.success,
            })),
            Err(e @ (AnalyzerError::UnknownTool(_) | AnalyzerError::InvalidArguments { .. })) => {
                Err((INVALID_PARAMS, e.to_string()))
            }
            Err(e) => Err((INTERNAL_ERROR, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SyntaxAnalyzer;

    fn server() -> McpServer {
        let executor = Arc::new(ToolExecutor::new(Arc::new(SyntaxAnalyzer::new())));
        McpServer::new(executor, "c-code-analyzer")
    }

    async fn reply(server: &McpServer, line: &str) -> Value {
        let text = server.handle_line(line).await.unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server();
        let response = reply(
            &server,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "c-code-analyzer");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let server = server();
        assert!(server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());
        assert!(server
            .handle_line(r#"{"jsonrpc":"2.0","method":"no/such"}"#)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_error_codes() {
        let server = server();

        let parse = reply(&server, "{not json").await;
        assert_eq!(parse["error"]["code"], PARSE_ERROR);
        assert_eq!(parse["id"], Value::Null);

        let invalid = reply(&server, r#"{"jsonrpc":"2.0","id":2}"#).await;
        assert_eq!(invalid["error"]["code"], INVALID_REQUEST);
        assert_eq!(invalid["id"], 2);

        let version = reply(&server, r#"{"jsonrpc":"1.0","id":3,"method":"ping"}"#).await;
        assert_eq!(version["error"]["code"], INVALID_REQUEST);

        let unknown = reply(&server, r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#).await;
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let params = reply(
            &server,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"find_symbol","arguments":{"file_path":"a.c"}}}"#,
        )
        .await;
        assert_eq!(params["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_result() {
        let server = server();
        let response = reply(
            &server,
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"list_functions","arguments":{"file_path":"/no/such/file.c"}}}"#,
        )
        .await;

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error executing list_functions: File not found"));
    }

    #[tokio::test]
    async fn test_ping_and_list() {
        let server = server();
        let ping = reply(&server, r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#).await;
        assert_eq!(ping["result"], json!({}));

        let list = reply(&server, r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#).await;
        let tools = list["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 11);
        assert_eq!(tools[0]["name"], "analyze_c_file");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["file_path"]));
    }
}
