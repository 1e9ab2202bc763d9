//! Request dispatch shared by the stdio and HTTP transports.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::handlers::handle_tool_call;
use super::protocol::{
    INVALID_PARAMS, InitializeResult, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND,
    PARSE_ERROR, PROTOCOL_VERSION, ServerCapabilities, ServerInfo, ToolCallParams,
    ToolsCapability,
};
use super::tools::{ToolResult, tool_definitions};
use crate::error::{Error, Result};
use crate::registry::RepositoryRegistry;
use crate::service::Fetcher;
use crate::transport::Transport;

/// MCP server exposing the download, decompile, and registry operations as
/// tools. The registry is shared behind a mutex and saved on every change.
pub struct McpServer<T> {
    transport: T,
    registry: Mutex<RepositoryRegistry>,
    cfr_jar: PathBuf,
    java: Option<String>,
}

impl<T: Transport + Clone> McpServer<T> {
    pub fn new(transport: T, registry: RepositoryRegistry, cfr_jar: PathBuf) -> Self {
        Self {
            transport,
            registry: Mutex::new(registry),
            cfr_jar,
            java: None,
        }
    }

    pub fn with_java(mut self, java: impl Into<String>) -> Self {
        self.java = Some(java.into());
        self
    }

    pub(crate) fn fetcher(&self) -> Fetcher<T> {
        let fetcher = Fetcher::new(self.transport.clone(), self.cfr_jar.clone());
        match &self.java {
            Some(java) => fetcher.with_java(java.clone()),
            None => fetcher,
        }
    }

    pub(crate) fn with_registry<R>(
        &self,
        f: impl FnOnce(&mut RepositoryRegistry) -> Result<R>,
    ) -> Result<R> {
        let mut guard: MutexGuard<'_, RepositoryRegistry> =
            self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Serves newline-delimited JSON-RPC on stdin/stdout until EOF.
    pub fn run_stdio(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let io_err = |e| Error::io("<stdio>", e);

        info!("MCP server ready, listening on stdio");
        for line in stdin.lock().lines() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_message(&line)?;
            if !response.is_empty() {
                writeln!(stdout, "{response}").map_err(io_err)?;
                stdout.flush().map_err(io_err)?;
            }
        }
        info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handles one JSON-RPC message. Returns an empty string for
    /// notifications.
    pub fn handle_message(&self, message: &str) -> Result<String> {
        debug!(request = %message, "received message");

        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                let resp = JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}"));
                return Ok(serde_json::to_string(&resp)?);
            }
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id)?,
            "initialized" | "notifications/initialized" => return Ok(String::new()),
            method if method.starts_with("notifications/") => return Ok(String::new()),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                request.id,
                json!({ "tools": tool_definitions() }),
            ),
            "tools/call" => self.handle_tools_call(request.id, request.params)?,
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        Ok(serde_json::to_string(&response)?)
    }

    fn handle_initialize(&self, id: Option<Value>) -> Result<JsonRpcResponse> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "jar-fetch".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    fn handle_tools_call(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return Ok(JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {e}"),
                ));
            }
        };

        let result = match handle_tool_call(self, &params.name, params.arguments) {
            Ok(value) => ToolResult::text(serde_json::to_string_pretty(&value)?),
            Err(e) => {
                warn!(tool = %params.name, error = %e, "tool call failed");
                ToolResult::error(e.to_string())
            }
        };
        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }
}
