use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use super::{read_body, send, SupabaseError, SupabaseSettings};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: SessionUser,
}

impl AuthSession {
    /// Unix time the access token stops working, taken from `expires_at` or
    /// derived from `expires_in`.
    pub fn expiry(&self, now: i64) -> Option<i64> {
        self.expires_at.or(self.expires_in.map(|secs| now + secs))
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// GoTrue client for admin sign-in.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: Secret<String>,
}

impl AuthClient {
    pub fn new(settings: &SupabaseSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/auth/v1", settings.base_url()),
            anon_key: settings.anon_key.clone(),
        }
    }

    async fn token_grant<B: Serialize>(&self, grant_type: &str, grant: &B) -> Result<AuthSession, SupabaseError> {
        let url = format!("{}/token", self.base_url);
        let request = self
            .client
            .post(&url)
            .query(&[("grant_type", grant_type)])
            .header("apikey", self.anon_key.expose_secret().as_str())
            .json(grant);

        let response = send(&url, request).await?;
        let body = read_body(&url, response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, SupabaseError> {
        let session = self
            .token_grant("password", &PasswordGrant { email, password })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Sign-in rejected");
                e
            })?;

        tracing::info!(user_id = %session.user.id, "Admin signed in");
        Ok(session)
    }

    /// Trades a refresh token for a new access token.
    #[tracing::instrument(skip(self, refresh_token))]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError> {
        let session = self
            .token_grant("refresh_token", &RefreshGrant { refresh_token })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Session refresh rejected");
                e
            })?;

        tracing::debug!(user_id = %session.user.id, "Admin session refreshed");
        Ok(session)
    }

    /// Revokes the session behind `access_token`.
    #[tracing::instrument(skip(self, access_token))]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let url = format!("{}/logout", self.base_url);
        let request = self
            .client
            .post(&url)
            .header("apikey", self.anon_key.expose_secret().as_str())
            .bearer_auth(access_token);

        send(&url, request).await?;
        Ok(())
    }
}
