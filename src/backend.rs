//! Refresh-token backend client
//!
//! The one non-Gmail remote call: POST to the connector backend that rotates
//! the stored Gmail refresh token. Failures are an explicit sum type the
//! handler pattern-matches into the flag-convention envelope.

use serde_json::Value;
use thiserror::Error;

use crate::config::backend::{API_TOKEN_HEADER, REFRESH_PATH, TIMEOUT};

/// Failure modes of the refresh call
#[derive(Error, Debug)]
pub enum BackendError {
    /// Backend answered with HTTP status >= 400 and a JSON body
    #[error("backend returned status {status_code}")]
    Http { status_code: u16, details: Value },

    /// Backend answered with a body that is not JSON
    #[error("Non-JSON response from backend")]
    NonJson { body: String },

    /// Transport-level failure: timeout, DNS, connection refused
    #[error("{0}")]
    Network(String),
}

/// POST `{base_url}/api/connectors/gmail/refresh` with the `x-api-token`
/// header and a 20-second timeout.
///
/// Trailing slashes on `base_url` are stripped before the path is appended.
/// The body is parsed before the status check, so a non-JSON error page
/// reports as non-JSON rather than as an HTTP error without details.
pub async fn refresh_gmail_token(base_url: &str, api_token: &str) -> Result<Value, BackendError> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH);

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .header(API_TOKEN_HEADER, api_token)
        .timeout(TIMEOUT)
        .send()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;

    let parsed: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => return Err(BackendError::NonJson { body }),
    };

    if status >= 400 {
        return Err(BackendError::Http {
            status_code: status,
            details: parsed,
        });
    }

    Ok(parsed)
}
