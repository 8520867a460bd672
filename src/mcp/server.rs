//! MCP server implementation
//!
//! Implements the Model Context Protocol server for stdio transport.

use std::io::{BufRead, Write};

use serde_json::Value;

use crate::error::Result;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;

/// MCP server info
const SERVER_NAME: &str = "gmail-mcp-server";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const SERVER_INSTRUCTIONS: &str =
    "Provides tools for common operations with Gmail (e.g., send_mail)";

/// MCP server for Gmail
pub struct McpServer {
    /// Tool handler
    tool_handler: ToolHandler,

    /// Whether initialized
    initialized: bool,
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl McpServer {
    /// Create a new MCP server
    pub fn new() -> Self {
        Self {
            tool_handler: ToolHandler::new(),
            initialized: false,
        }
    }

    /// Run the server on stdio
    pub async fn run_stdio(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        let reader = stdin.lock();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match self.handle_message(&line).await {
                Ok(Some(response)) => {
                    let response_str = serde_json::to_string(&response)?;
                    writeln!(stdout, "{}", response_str)?;
                    stdout.flush()?;
                }
                Ok(None) => {
                    // Notification, no response needed
                }
                Err(e) => {
                    tracing::error!("error handling message: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Handle an incoming JSON-RPC message
    async fn handle_message(&mut self, message: &str) -> Result<Option<JsonRpcResponse>> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                // Id-less messages are notifications and must be consumed
                // without a response.
                if let Ok(notification) = serde_json::from_str::<JsonRpcNotification>(message) {
                    if notification.method == methods::INITIALIZED {
                        self.initialized = true;
                    }
                    return Ok(None);
                }
                return Ok(Some(JsonRpcResponse::error(
                    RequestId::Number(0),
                    JsonRpcError::parse_error(e.to_string()),
                )));
            }
        };

        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = self.handle_initialize()?;
                Ok(Some(JsonRpcResponse::success(request.id, result)))
            }
            methods::INITIALIZED => {
                self.initialized = true;
                Ok(None) // Notification, no response
            }
            methods::PING => Ok(Some(JsonRpcResponse::success(
                request.id,
                serde_json::json!({}),
            ))),
            methods::LIST_TOOLS => {
                let result = self.handle_list_tools()?;
                Ok(Some(JsonRpcResponse::success(request.id, result)))
            }
            methods::CALL_TOOL => {
                let result = self.handle_call_tool(&request).await;
                Ok(Some(JsonRpcResponse::success(request.id, result)))
            }
            _ => Ok(Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::method_not_found(&request.method),
            ))),
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self) -> Result<Value> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request
    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> Value {
        let params: CallToolParams = match request.params.as_ref() {
            Some(p) => match serde_json::from_value(p.clone()) {
                Ok(params) => params,
                Err(e) => {
                    return wrap_tool_output(serde_json::to_value(CallToolResult::error(format!(
                        "Invalid tool parameters: {}",
                        e
                    )))
                    .unwrap_or_default());
                }
            },
            None => {
                return wrap_tool_output(
                    serde_json::to_value(CallToolResult::error("Missing tool parameters"))
                        .unwrap_or_default(),
                );
            }
        };

        let output = self
            .tool_handler
            .call_tool(&params.name, params.arguments)
            .await;
        wrap_tool_output(output)
    }
}

/// Adapt a tool envelope to the tools/call result shape.
///
/// Content-convention envelopes pass through unchanged. Raw and
/// flag-convention envelopes are serialized into a text content block so the
/// payload shape survives verbatim in the text.
fn wrap_tool_output(output: Value) -> Value {
    if output.get("content").is_some() {
        return output;
    }

    let text = serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string());
    serde_json::to_value(CallToolResult::text(text)).unwrap_or(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrap_passes_content_envelope_through() {
        let envelope = json!({
            "content": [{"type": "text", "text": "done"}]
        });
        assert_eq!(wrap_tool_output(envelope.clone()), envelope);
    }

    #[test]
    fn test_wrap_serializes_raw_envelope() {
        let raw = json!({"labels": [{"id": "INBOX"}]});
        let wrapped = wrap_tool_output(raw.clone());
        let text = wrapped["content"][0]["text"].as_str().unwrap();
        let roundtrip: Value = serde_json::from_str(text).unwrap();
        assert_eq!(roundtrip, raw);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut server = McpServer::new();
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_initialize_reports_tools_capability() {
        let mut server = McpServer::new();
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#)
            .await
            .unwrap()
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(result["instructions"], SERVER_INSTRUCTIONS);
    }

    #[tokio::test]
    async fn test_initialized_notification_without_id_is_consumed_silently() {
        let mut server = McpServer::new();
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .unwrap();
        assert!(response.is_none());
        assert!(server.initialized);
    }

    #[tokio::test]
    async fn test_unknown_notification_gets_no_response() {
        let mut server = McpServer::new();
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{}}"#)
            .await
            .unwrap();
        assert!(response.is_none());
        assert!(!server.initialized);
    }

    #[tokio::test]
    async fn test_parse_error_response() {
        let mut server = McpServer::new();
        let response = server
            .handle_message("this is not json")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
    }
}
