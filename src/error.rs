//! Error types for the Gmail MCP server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the Gmail MCP server
#[derive(Error, Debug)]
pub enum GmailMcpError {
    /// One or more OAuth credential fields absent or empty. Raised
    /// synchronously, before any network call.
    #[error("Required Google OAuth credentials not found in environment or env_override parameter")]
    MissingCredentials,

    /// The Gmail API returned a non-success status
    #[error("Gmail API error ({status}): {body}")]
    RemoteApi { status: u16, body: String },

    /// The OAuth token endpoint rejected the refresh-token grant
    #[error("Failed to refresh access token: {0}")]
    TokenRefresh(String),

    /// Unsupported transport selected at startup
    #[error("Unsupported transport: {0} (only \"stdio\" is available)")]
    UnsupportedTransport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Gmail MCP operations
pub type Result<T> = std::result::Result<T, GmailMcpError>;
