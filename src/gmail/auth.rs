//! OAuth credentials and access-token refresh for the Gmail API
//!
//! Credentials are resolved per tool call and never persisted. The access
//! token is fetched lazily, on the first authenticated call, via the OAuth2
//! refresh-token grant against the fixed Google token endpoint.

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::{keys, ConfigSource};
use crate::error::{GmailMcpError, Result};

/// The three OAuth secrets needed to mint a Gmail session.
///
/// All fields are non-empty by construction; the set is owned by the single
/// tool invocation that resolved it.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl Credentials {
    /// Resolve credentials from the given source.
    ///
    /// Fails with `MissingCredentials` when any of `CLIENT_ID`,
    /// `CLIENT_SECRET`, `REFRESH_TOKEN` is absent or empty. Synchronous, no
    /// side effects, no network.
    pub fn resolve(source: ConfigSource<'_>) -> Result<Self> {
        let client_id = source.get(keys::CLIENT_ID);
        let client_secret = source.get(keys::CLIENT_SECRET);
        let refresh_token = source.get(keys::REFRESH_TOKEN);

        match (client_id, client_secret, refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Ok(Self {
                client_id,
                client_secret,
                refresh_token,
            }),
            _ => Err(GmailMcpError::MissingCredentials),
        }
    }
}

/// Token response from the OAuth token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchanges the refresh token for access tokens on demand.
///
/// Invocation-local: one authenticator per tool call, discarded on return.
pub struct Authenticator {
    credentials: Credentials,
    token_url: String,
    http_client: reqwest::Client,
    // Filled on first authenticated call, reused for the rest of the call
    access_token: RwLock<Option<String>>,
}

impl Authenticator {
    pub fn new(credentials: Credentials, token_url: String, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            token_url,
            http_client,
            access_token: RwLock::new(None),
        }
    }

    /// Get a valid access token, fetching one on first use
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.access_token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let token = self.fetch_access_token().await?;
        *self.access_token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Perform the refresh-token grant
    async fn fetch_access_token(&self) -> Result<String> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GmailMcpError::TokenRefresh(text));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.access_token)
    }
}
