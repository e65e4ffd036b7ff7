//! Clients for the hosted backend: PostgREST tables, GoTrue auth, the
//! management SQL endpoint and the realtime change feed.

pub mod auth;
pub mod management;
pub mod realtime;
pub mod rest;

use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

pub use auth::{AuthClient, AuthSession, SessionUser};
pub use management::{ManagementClient, ManagementSettings};
pub use realtime::{ChangeEvent, ChangeHub, ChangeKind, RealtimeListener, TableSubscription};
pub use rest::{Query, RestClient};

/// PostgREST code for "the result contains 0 rows" on a single-object request.
pub const NO_ROWS_CODE: &str = "PGRST116";

#[derive(Debug, Deserialize, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: Secret<String>,
}

impl SupabaseSettings {
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<String>,
        hint: Option<String>,
    },

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("realtime connection error: {0}")]
    Realtime(String),
}

impl SupabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SupabaseError::Api { code: Some(code), .. } if code == NO_ROWS_CODE)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::Api { status, .. } => Some(*status),
            SupabaseError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The message a user should see: the backend's own text when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            SupabaseError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Union of the error shapes the three backend APIs return.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    error_code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

pub(crate) fn api_error(status: u16, body: &str) -> SupabaseError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let code = match parsed.code {
        Some(serde_json::Value::String(code)) => Some(code),
        _ => parsed.error_code,
    };

    let message = parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            }
        });

    SupabaseError::Api {
        status,
        code,
        message,
        details: parsed.details,
        hint: parsed.hint,
    }
}

pub(crate) async fn send(
    url: &str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, SupabaseError> {
    let response = request.send().await.map_err(|source| SupabaseError::Transport {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(url = %url, status = status.as_u16(), body = %body, "Backend request rejected");
    Err(api_error(status.as_u16(), &body))
}

pub(crate) async fn read_body(url: &str, response: reqwest::Response) -> Result<String, SupabaseError> {
    response.text().await.map_err(|source| SupabaseError::Transport {
        url: url.to_string(),
        source,
    })
}
