//! MCP tool definitions and handlers
//!
//! One handler per exposed capability. Handlers are stateless: every call
//! resolves its own credentials, builds a fresh Gmail session, and maps any
//! failure into an envelope. Nothing escapes to the transport as a fault.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::{self, BackendError};
use crate::config::backend::DEFAULT_BASE_URL;
use crate::config::gmail::labels::UNREAD;
use crate::config::{keys, ConfigSource};
use crate::error::Result;
use crate::gmail::auth::Credentials;
use crate::gmail::client::GmailClient;
use crate::gmail::mime::{encode_outbound, OutboundMessage};
use crate::mcp::types::{CallToolResult, Tool};

/// Tool handler
#[derive(Default)]
pub struct ToolHandler;

impl ToolHandler {
    /// Create a new tool handler
    pub fn new() -> Self {
        Self
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            tool_def(
                "send_mail",
                "Send a new email to recipient(s) with a subject and body",
                send_mail_schema(),
            ),
            tool_def(
                "get_latest_message",
                "Fetch the newest message in the INBOX",
                env_only_schema(),
            ),
            tool_def(
                "list_labels",
                "Retrieve all Gmail labels for the authenticated user",
                env_only_schema(),
            ),
            tool_def(
                "create_label",
                "Create a new Gmail label",
                create_label_schema(),
            ),
            tool_def(
                "modify_message_labels",
                "Add or remove labels on a message",
                modify_message_labels_schema(),
            ),
            tool_def("mark_read", "Mark a message as read", mark_read_schema()),
            tool_def(
                "refresh_gmail_token",
                "Refresh the stored Gmail refresh token via the connector backend",
                env_only_schema(),
            ),
        ]
    }

    /// Call a tool by name.
    ///
    /// The returned value is the tool's envelope: content convention for
    /// send_mail (and for any handler failure), raw remote JSON for the
    /// label/message tools, flag convention for refresh_gmail_token.
    pub async fn call_tool(&self, name: &str, args: Value) -> Value {
        tracing::debug!(tool = name, "dispatching tool call");
        match name {
            "send_mail" => self.handle_send_mail(args).await,
            "get_latest_message" => self.handle_get_latest_message(args).await,
            "list_labels" => self.handle_list_labels(args).await,
            "create_label" => self.handle_create_label(args).await,
            "modify_message_labels" => self.handle_modify_message_labels(args).await,
            "mark_read" => self.handle_mark_read(args).await,
            "refresh_gmail_token" => self.handle_refresh_gmail_token(args).await,
            _ => envelope(CallToolResult::error(format!("Unknown tool: {}", name))),
        }
    }

    // ==================== Tool handlers ====================

    async fn handle_send_mail(&self, args: Value) -> Value {
        #[derive(Deserialize)]
        struct Args {
            to: String,
            subject: String,
            body: String,
            cc: Option<String>,
            bcc: Option<String>,
            env_override: Option<HashMap<String, String>>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => {
                return envelope(CallToolResult::error(format!("Invalid arguments: {}", e)))
            }
        };

        let message = OutboundMessage {
            to: args.to,
            subject: args.subject,
            body: args.body,
            cc: args.cc,
            bcc: args.bcc,
        };

        match send_mail(&message, args.env_override.as_ref()).await {
            Ok(id) => envelope(CallToolResult::text(format!(
                "Email sent successfully. Message ID: {}",
                id
            ))),
            Err(e) => envelope(CallToolResult::error(format!("Error sending email: {}", e))),
        }
    }

    async fn handle_get_latest_message(&self, args: Value) -> Value {
        let env_override = match parse_env_only(args) {
            Ok(o) => o,
            Err(e) => return e,
        };

        let result = async {
            let client = session(env_override.as_ref())?;
            client.latest_inbox_message().await
        }
        .await;

        match result {
            Ok(None) => json!({ "found": false }),
            Ok(Some(summary)) => json!({
                "found": true,
                "id": summary.id,
                "subject": summary.subject,
                "from": summary.from,
                "date": summary.date,
                "snippet": summary.snippet,
                "body": summary.body,
            }),
            Err(e) => envelope(CallToolResult::error(e.to_string())),
        }
    }

    async fn handle_list_labels(&self, args: Value) -> Value {
        let env_override = match parse_env_only(args) {
            Ok(o) => o,
            Err(e) => return e,
        };

        let result = async {
            let client = session(env_override.as_ref())?;
            client.list_labels().await
        }
        .await;

        raw_or_error(result)
    }

    async fn handle_create_label(&self, args: Value) -> Value {
        #[derive(Deserialize)]
        struct Args {
            label: Value,
            env_override: Option<HashMap<String, String>>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => {
                return envelope(CallToolResult::error(format!("Invalid arguments: {}", e)))
            }
        };

        let result = async {
            let client = session(args.env_override.as_ref())?;
            client.create_label(&args.label).await
        }
        .await;

        raw_or_error(result)
    }

    async fn handle_modify_message_labels(&self, args: Value) -> Value {
        #[derive(Deserialize)]
        struct Args {
            message_id: String,
            mods: Value,
            env_override: Option<HashMap<String, String>>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => {
                return envelope(CallToolResult::error(format!("Invalid arguments: {}", e)))
            }
        };

        modify_message_labels(&args.message_id, &args.mods, args.env_override.as_ref()).await
    }

    async fn handle_mark_read(&self, args: Value) -> Value {
        #[derive(Deserialize)]
        struct Args {
            message_id: String,
            env_override: Option<HashMap<String, String>>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => {
                return envelope(CallToolResult::error(format!("Invalid arguments: {}", e)))
            }
        };

        // Pure delegation: the envelope is whatever the modify handler
        // produces for the synthesized body.
        modify_message_labels(&args.message_id, &mark_read_mods(), args.env_override.as_ref())
            .await
    }

    async fn handle_refresh_gmail_token(&self, args: Value) -> Value {
        let env_override = match parse_env_only(args) {
            Ok(o) => o,
            Err(e) => return e,
        };
        let env_override = env_override.as_ref();

        let Some(api_token) = backend_api_token(env_override) else {
            return json!({
                "isError": true,
                "error": "Missing API_TOKEN in env_override or environment",
            });
        };
        let base_url = backend_base_url(env_override);

        match backend::refresh_gmail_token(&base_url, &api_token).await {
            Ok(result) => json!({ "isError": false, "result": result }),
            Err(BackendError::Http {
                status_code,
                details,
            }) => json!({
                "isError": true,
                "status_code": status_code,
                "details": details,
            }),
            Err(BackendError::NonJson { body }) => json!({
                "isError": true,
                "error": "Non-JSON response from backend",
                "body": body,
            }),
            Err(BackendError::Network(message)) => json!({
                "isError": true,
                "error": message,
            }),
        }
    }
}

// ==================== Shared handler plumbing ====================

/// Label modification body synthesized by mark_read
pub fn mark_read_mods() -> Value {
    json!({ "removeLabelIds": [UNREAD] })
}

/// Resolve credentials for a call and open a fresh Gmail session
fn session(env_override: Option<&HashMap<String, String>>) -> Result<GmailClient> {
    let credentials = Credentials::resolve(ConfigSource::from_override(env_override))?;
    Ok(GmailClient::new(credentials))
}

async fn send_mail(
    message: &OutboundMessage,
    env_override: Option<&HashMap<String, String>>,
) -> Result<String> {
    let raw = encode_outbound(message);
    let client = session(env_override)?;
    let sent = client.send_raw(raw).await?;
    Ok(sent.id)
}

async fn modify_message_labels(
    message_id: &str,
    mods: &Value,
    env_override: Option<&HashMap<String, String>>,
) -> Value {
    let result = async {
        let client = session(env_override)?;
        client.modify_message(message_id, mods).await
    }
    .await;

    raw_or_error(result)
}

/// Parse the `{env_override?}` argument shape shared by several tools
fn parse_env_only(args: Value) -> std::result::Result<Option<HashMap<String, String>>, Value> {
    #[derive(Deserialize, Default)]
    struct Args {
        env_override: Option<HashMap<String, String>>,
    }

    // Tools without required arguments may be called with no params at all
    if args.is_null() {
        return Ok(None);
    }

    match serde_json::from_value::<Args>(args) {
        Ok(a) => Ok(a.env_override),
        Err(e) => Err(envelope(CallToolResult::error(format!(
            "Invalid arguments: {}",
            e
        )))),
    }
}

/// Raw remote passthrough on success, content-convention error otherwise
fn raw_or_error(result: Result<Value>) -> Value {
    match result {
        Ok(value) => value,
        Err(e) => envelope(CallToolResult::error(e.to_string())),
    }
}

/// Serialize a content-convention envelope to its JSON value
fn envelope(result: CallToolResult) -> Value {
    serde_json::to_value(&result).unwrap_or_else(|e| {
        json!({
            "content": [{ "type": "text", "text": e.to_string() }],
            "isError": true,
        })
    })
}

/// Backend base URL: override `BASE_API_URL`, else override `API_BASE_URL`,
/// else environment `BASE_API_URL`, else the localhost default
fn backend_base_url(env_override: Option<&HashMap<String, String>>) -> String {
    let from_override = |key: &str| {
        env_override
            .and_then(|m| m.get(key))
            .filter(|v| !v.is_empty())
            .cloned()
    };

    from_override(keys::BASE_API_URL)
        .or_else(|| from_override(keys::API_BASE_URL))
        .or_else(|| std::env::var(keys::BASE_API_URL).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Backend API token: override `API_TOKEN`, else environment `API_TOKEN`
fn backend_api_token(env_override: Option<&HashMap<String, String>>) -> Option<String> {
    env_override
        .and_then(|m| m.get(keys::API_TOKEN))
        .filter(|v| !v.is_empty())
        .cloned()
        .or_else(|| std::env::var(keys::API_TOKEN).ok().filter(|v| !v.is_empty()))
}

// ==================== Schema definitions ====================

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

fn env_override_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": {"type": "string"},
        "description": "Per-request environment overrides (e.g. CLIENT_ID, CLIENT_SECRET, REFRESH_TOKEN); fully shadows process environment when present"
    })
}

fn env_only_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "env_override": env_override_schema()
        }
    })
}

fn send_mail_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to": {
                "type": "string",
                "description": "Recipient email address(es), comma-separated"
            },
            "subject": {
                "type": "string",
                "description": "Email subject"
            },
            "body": {
                "type": "string",
                "description": "Plain-text email body"
            },
            "cc": {
                "type": "string",
                "description": "CC recipients, comma-separated"
            },
            "bcc": {
                "type": "string",
                "description": "BCC recipients, comma-separated"
            },
            "env_override": env_override_schema()
        },
        "required": ["to", "subject", "body"]
    })
}

fn create_label_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "label": {
                "type": "object",
                "description": "Label resource passed to the Gmail API as-is (must include name)"
            },
            "env_override": env_override_schema()
        },
        "required": ["label"]
    })
}

fn modify_message_labels_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "message_id": {
                "type": "string",
                "description": "ID of the message to modify"
            },
            "mods": {
                "type": "object",
                "description": "Modification body passed to the Gmail API as-is (addLabelIds and/or removeLabelIds)"
            },
            "env_override": env_override_schema()
        },
        "required": ["message_id", "mods"]
    })
}

fn mark_read_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "message_id": {
                "type": "string",
                "description": "ID of the message to mark as read"
            },
            "env_override": env_override_schema()
        },
        "required": ["message_id"]
    })
}
