//! MCP server that reads JSON-RPC 2.0 messages line by line and writes one
//! response line per request.
//!
//! Requests are handled strictly in arrival order; the next line is not read
//! until the previous request's engine work has returned.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::errors::{GraphMcpError, Result};
use crate::service::GraphService;

use super::prompts::{check_prompt_catalog, get_prompt_definitions, handle_prompt_get};
use super::tools::{check_catalog, get_tool_definitions, handle_tool_call};
use super::transport::{ErrorCode, JsonRpcRequest, JsonRpcResponse};

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Runtime statistics for the MCP server.
pub struct ServerStats {
    started_at: Instant,
    total_requests: AtomicU64,
    tool_calls: AtomicU64,
    tool_errors: AtomicU64,
    transport_errors: AtomicU64,
}

impl ServerStats {
    fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_requests: AtomicU64::new(0),
            tool_calls: AtomicU64::new(0),
            tool_errors: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
        }
    }

    /// Returns the counters as a JSON value.
    pub fn to_json(&self) -> Value {
        json!({
            "uptime_secs": self.started_at.elapsed().as_secs(),
            "total_requests": self.total_requests.load(Ordering::Relaxed),
            "tool_calls": self.tool_calls.load(Ordering::Relaxed),
            "tool_errors": self.tool_errors.load(Ordering::Relaxed),
            "transport_errors": self.transport_errors.load(Ordering::Relaxed),
        })
    }
}

/// The MCP server wrapping the ready [`GraphService`].
pub struct McpServer {
    service: GraphService,
    stats: ServerStats,
}

impl McpServer {
    /// Creates a server, rejecting an inconsistent tool or prompt catalog.
    pub fn new(service: GraphService) -> Result<Self> {
        check_catalog()?;
        check_prompt_catalog()?;
        Ok(Self {
            service,
            stats: ServerStats::new(),
        })
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    /// Serves stdin/stdout until stdin is closed.
    pub async fn run(&self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serves newline-delimited JSON-RPC from `reader` to `writer` until EOF.
    ///
    /// A line that is not valid UTF-8 or not valid JSON is answered with a
    /// `ParseError` and the loop keeps reading; only I/O failures end it.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        info!("mcp server ready");

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let Some(output) = self.handle_bytes(&buf) else {
                continue;
            };
            writer.write_all(output.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        info!(stats = %self.stats.to_json(), "input closed, shutting down");
        Ok(())
    }

    /// Handles one raw input line, rejecting bytes that are not UTF-8.
    pub fn handle_bytes(&self, bytes: &[u8]) -> Option<String> {
        match std::str::from_utf8(bytes) {
            Ok(line) => self.handle_line(line),
            Err(e) => self.parse_error(format!("request is not valid UTF-8: {e}")),
        }
    }

    /// Handles one input line; returns the serialized response, if any.
    pub fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => encode(&self.handle_request(&request)?),
            Err(e) => self.parse_error(format!("failed to parse JSON-RPC request: {e}")),
        }
    }

    fn parse_error(&self, message: String) -> Option<String> {
        self.stats.transport_errors.fetch_add(1, Ordering::Relaxed);
        debug!(%message, "unparseable input line");
        encode(&JsonRpcResponse::error(
            Value::Null,
            ErrorCode::ParseError,
            message,
        ))
    }

    /// Dispatches a parsed JSON-RPC request to the appropriate handler.
    ///
    /// Returns `None` for notifications.
    pub fn handle_request(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        self.stats.total_requests.fetch_add(1, Ordering::Relaxed);
        debug!(method = %request.method, id = %request.id, "request");

        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return None;
        }

        let id = request.id.clone();
        let params = request.params.as_ref().unwrap_or(&Value::Null);
        let result = match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": get_tool_definitions() })),
            "tools/call" => self.call_tool(params),
            "prompts/list" => Ok(json!({ "prompts": get_prompt_definitions() })),
            "prompts/get" => self.get_prompt(params),
            other => {
                self.stats.transport_errors.fetch_add(1, Ordering::Relaxed);
                return Some(JsonRpcResponse::error(
                    id,
                    ErrorCode::MethodNotFound,
                    format!("method not found: {other}"),
                ));
            }
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                self.stats.transport_errors.fetch_add(1, Ordering::Relaxed);
                debug!(error = %e, "request failed at transport level");
                JsonRpcResponse::from_error(id, &e)
            }
        })
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
                "prompts": {}
            },
            "serverInfo": {
                "name": "kuzu",
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn call_tool(&self, params: &Value) -> Result<Value> {
        let name = required_name(params, "tools/call")?;
        let arguments = params.get("arguments").unwrap_or(&Value::Null);

        self.stats.tool_calls.fetch_add(1, Ordering::Relaxed);
        let result = handle_tool_call(&self.service, name, arguments)?;
        if result.is_error {
            self.stats.tool_errors.fetch_add(1, Ordering::Relaxed);
        }
        Ok(serde_json::to_value(result)?)
    }

    fn get_prompt(&self, params: &Value) -> Result<Value> {
        let name = required_name(params, "prompts/get")?;
        let arguments = params.get("arguments").unwrap_or(&Value::Null);
        let result = handle_prompt_get(&self.service, name, arguments)?;
        Ok(serde_json::to_value(result)?)
    }
}

fn encode(response: &JsonRpcResponse) -> Option<String> {
    match serde_json::to_string(response) {
        Ok(s) => Some(s),
        Err(e) => {
            error!(error = %e, "failed to serialize response");
            None
        }
    }
}

/// Extracts `params.name`, treating an absent or blank name as missing.
fn required_name<'a>(params: &'a Value, method: &str) -> Result<&'a str> {
    if !params.is_object() {
        return Err(GraphMcpError::protocol(format!(
            "missing params for {method}"
        )));
    }
    let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
    if name.trim().is_empty() {
        let what = if method == "tools/call" { "tool" } else { "prompt" };
        return Err(GraphMcpError::protocol(format!("missing {what} name")));
    }
    Ok(name)
}
