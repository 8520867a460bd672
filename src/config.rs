//! Configuration for the Gmail MCP server
//!
//! Per-call configuration lookup (override map vs. process environment),
//! environment key names, and remote endpoint constants.

use std::collections::HashMap;

use crate::error::{GmailMcpError, Result};

/// Environment keys consumed by this server
pub mod keys {
    pub const CLIENT_ID: &str = "CLIENT_ID";
    pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
    pub const REFRESH_TOKEN: &str = "REFRESH_TOKEN";
    pub const BASE_API_URL: &str = "BASE_API_URL";
    pub const API_BASE_URL: &str = "API_BASE_URL";
    pub const API_TOKEN: &str = "API_TOKEN";
    pub const TRANSPORT: &str = "TRANSPORT";
}

/// Where a tool call reads its configuration from.
///
/// A caller-supplied override map fully shadows the process environment:
/// keys missing from the map are absent, never auto-filled from the
/// environment. Empty values count as absent.
#[derive(Debug, Clone, Copy)]
pub enum ConfigSource<'a> {
    /// Per-call override map supplied as a tool argument
    Override(&'a HashMap<String, String>),

    /// Process-wide environment variables
    Environment,
}

impl<'a> ConfigSource<'a> {
    /// Select the source for a call: the override map when present, else the
    /// process environment.
    pub fn from_override(env_override: Option<&'a HashMap<String, String>>) -> Self {
        match env_override {
            Some(map) => ConfigSource::Override(map),
            None => ConfigSource::Environment,
        }
    }

    /// Look up a key, treating empty strings as absent
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match self {
            ConfigSource::Override(map) => map.get(key).cloned(),
            ConfigSource::Environment => std::env::var(key).ok(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Invocation transport, selected once at process start via `TRANSPORT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
}

impl Transport {
    /// Parse the `TRANSPORT` environment variable (default: stdio)
    pub fn from_env() -> Result<Self> {
        match std::env::var(keys::TRANSPORT) {
            Ok(value) if value == "stdio" => Ok(Transport::Stdio),
            Err(_) => Ok(Transport::Stdio),
            Ok(other) => Err(GmailMcpError::UnsupportedTransport(other)),
        }
    }
}

/// Gmail API constants
pub mod gmail {
    /// Base URL for the Gmail REST API
    pub const API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

    /// Fixed Google OAuth2 token endpoint
    pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

    /// User ID for the authenticated user
    pub const USER_ID: &str = "me";

    /// System label IDs
    pub mod labels {
        pub const INBOX: &str = "INBOX";
        pub const UNREAD: &str = "UNREAD";
    }
}

/// Refresh-token backend constants
pub mod backend {
    use std::time::Duration;

    /// Default base URL when neither override nor environment supplies one
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

    /// Path appended to the base URL
    pub const REFRESH_PATH: &str = "/api/connectors/gmail/refresh";

    /// Header carrying the backend API token
    pub const API_TOKEN_HEADER: &str = "x-api-token";

    /// Hard timeout on the refresh call
    pub const TIMEOUT: Duration = Duration::from_secs(20);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_shadows_environment() {
        // The key is set in the environment but missing from the override
        // map, so the lookup must come back empty.
        std::env::set_var("GMAIL_MCP_TEST_SHADOWED", "from-env");
        let map = HashMap::new();
        let source = ConfigSource::Override(&map);
        assert_eq!(source.get("GMAIL_MCP_TEST_SHADOWED"), None);
        std::env::remove_var("GMAIL_MCP_TEST_SHADOWED");
    }

    #[test]
    fn test_override_lookup() {
        let mut map = HashMap::new();
        map.insert("CLIENT_ID".to_string(), "abc".to_string());
        let source = ConfigSource::Override(&map);
        assert_eq!(source.get("CLIENT_ID"), Some("abc".to_string()));
    }

    #[test]
    fn test_empty_value_is_absent() {
        let mut map = HashMap::new();
        map.insert("CLIENT_ID".to_string(), String::new());
        let source = ConfigSource::Override(&map);
        assert_eq!(source.get("CLIENT_ID"), None);
    }

    #[test]
    fn test_environment_lookup() {
        std::env::set_var("GMAIL_MCP_TEST_ENV_LOOKUP", "value");
        let source = ConfigSource::Environment;
        assert_eq!(
            source.get("GMAIL_MCP_TEST_ENV_LOOKUP"),
            Some("value".to_string())
        );
        std::env::remove_var("GMAIL_MCP_TEST_ENV_LOOKUP");
    }

    #[test]
    fn test_from_override_selection() {
        let map = HashMap::new();
        assert!(matches!(
            ConfigSource::from_override(Some(&map)),
            ConfigSource::Override(_)
        ));
        assert!(matches!(
            ConfigSource::from_override(None),
            ConfigSource::Environment
        ));
    }
}
