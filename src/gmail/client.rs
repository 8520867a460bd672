//! Gmail API client
//!
//! A session over the Gmail REST API, constructed fresh for every tool
//! invocation from per-call credentials. No pooling, no reuse across calls.

use serde_json::Value;

use crate::config::gmail::{labels, API_BASE_URL, TOKEN_URL, USER_ID};
use crate::error::{GmailMcpError, Result};
use crate::gmail::auth::{Authenticator, Credentials};
use crate::gmail::mime::{extract_plain_text, find_header};
use crate::gmail::types::{Message, MessageList, SendMessageRequest};

/// Gmail API client
pub struct GmailClient {
    http_client: reqwest::Client,
    authenticator: Authenticator,
    api_base_url: String,
}

impl GmailClient {
    /// Create a client against the production Gmail endpoints
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoints(credentials, API_BASE_URL, TOKEN_URL)
    }

    /// Create a client against explicit endpoints (used by tests with a
    /// mocked server)
    pub fn with_endpoints(credentials: Credentials, api_base_url: &str, token_url: &str) -> Self {
        let http_client = reqwest::Client::new();
        Self {
            authenticator: Authenticator::new(
                credentials,
                token_url.to_string(),
                http_client.clone(),
            ),
            http_client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn access_token(&self) -> Result<String> {
        self.authenticator.access_token().await
    }

    fn messages_url(&self) -> String {
        format!("{}/users/{}/messages", self.api_base_url, USER_ID)
    }

    fn labels_url(&self) -> String {
        format!("{}/users/{}/labels", self.api_base_url, USER_ID)
    }

    /// Map a non-success response into a remote-API error
    async fn remote_error(response: reqwest::Response) -> GmailMcpError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        GmailMcpError::RemoteApi { status, body }
    }

    // ==================== Message operations ====================

    /// Send a raw (base64url-encoded) message for the authenticated user
    pub async fn send_raw(&self, raw: String) -> Result<Message> {
        let token = self.access_token().await?;
        let url = format!("{}/send", self.messages_url());

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&SendMessageRequest { raw })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::remote_error(response).await)
        }
    }

    /// Newest message in INBOX, fully fetched and projected.
    ///
    /// Returns `None` on an empty inbox without issuing a get.
    pub async fn latest_inbox_message(&self) -> Result<Option<InboundMessageSummary>> {
        let token = self.access_token().await?;
        let url = format!(
            "{}?labelIds={}&maxResults=1",
            self.messages_url(),
            labels::INBOX
        );

        let response = self.http_client.get(&url).bearer_auth(&token).send().await?;
        if !response.status().is_success() {
            return Err(Self::remote_error(response).await);
        }

        let list: MessageList = response.json().await?;
        let Some(msg_ref) = list.messages.first() else {
            return Ok(None);
        };

        let url = format!("{}/{}?format=full", self.messages_url(), msg_ref.id);
        let response = self.http_client.get(&url).bearer_auth(&token).send().await?;
        if !response.status().is_success() {
            return Err(Self::remote_error(response).await);
        }

        let message: Message = response.json().await?;
        let payload = message.payload.as_ref();
        let header = |name: &str| {
            payload
                .and_then(|p| find_header(p, name))
                .map(str::to_string)
        };

        Ok(Some(InboundMessageSummary {
            subject: header("subject"),
            from: header("from"),
            date: header("date"),
            snippet: message.snippet.clone(),
            body: extract_plain_text(&message),
            id: message.id,
        }))
    }

    /// Apply a label modification to one message.
    ///
    /// The modification body is posted verbatim and the remote response is
    /// returned unwrapped.
    pub async fn modify_message(&self, message_id: &str, mods: &Value) -> Result<Value> {
        let token = self.access_token().await?;
        let url = format!("{}/{}/modify", self.messages_url(), message_id);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(mods)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::remote_error(response).await)
        }
    }

    // ==================== Label operations ====================

    /// List all labels for the authenticated user (raw response)
    pub async fn list_labels(&self) -> Result<Value> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .get(self.labels_url())
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::remote_error(response).await)
        }
    }

    /// Create a label from the given body (raw response)
    pub async fn create_label(&self, label: &Value) -> Result<Value> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .post(self.labels_url())
            .bearer_auth(&token)
            .json(label)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::remote_error(response).await)
        }
    }
}

/// Read-only projection of a remote message
#[derive(Debug, Clone)]
pub struct InboundMessageSummary {
    pub id: String,
    pub subject: Option<String>,
    pub from: Option<String>,
    pub date: Option<String>,
    pub snippet: Option<String>,
    /// Best-effort plain-text part; `None` when no matching part exists
    pub body: Option<String>,
}
