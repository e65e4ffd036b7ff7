use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{read_body, send, SupabaseError};

pub const DEFAULT_MANAGEMENT_API: &str = "https://api.supabase.com";

#[derive(Debug, Deserialize, Clone)]
pub struct ManagementSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub project_ref: String,
    pub access_token: Secret<String>,
}

fn default_api_url() -> String {
    DEFAULT_MANAGEMENT_API.to_string()
}

/// Runs raw SQL through the project's management endpoint.
#[derive(Clone)]
pub struct ManagementClient {
    client: Client,
    settings: ManagementSettings,
}

impl ManagementClient {
    pub fn new(settings: ManagementSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn query_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/database/query",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.project_ref
        )
    }

    #[tracing::instrument(skip(self, sql), fields(project = %self.settings.project_ref))]
    pub async fn run_query(&self, sql: &str) -> Result<Value, SupabaseError> {
        let url = self.query_url();
        let request = self
            .client
            .post(&url)
            .bearer_auth(self.settings.access_token.expose_secret())
            .json(&json!({ "query": sql }));

        let response = send(&url, request).await?;
        let body = read_body(&url, response).await?;
        if body.trim().is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
        Ok(serde_json::from_str(&body)?)
    }
}
