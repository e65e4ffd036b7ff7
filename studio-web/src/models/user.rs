use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use studio_core::error::AppError;
use studio_core::supabase::AuthSession;
use tower_sessions::Session;

use crate::AppState;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const EXPIRES_AT_KEY: &str = "expires_at";
pub const USER_ID_KEY: &str = "user_id";
pub const EMAIL_KEY: &str = "email";

/// Tokens this close to expiry are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Signed-in studio admin, read from the session.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
}

impl AdminUser {
    /// Bearer for table writes made on the admin's behalf.
    pub fn token(&self) -> Option<&str> {
        Some(self.access_token.as_str())
    }
}

pub fn needs_refresh(expires_at: Option<i64>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|at| now.timestamp() >= at - REFRESH_MARGIN_SECS)
}

async fn store(session: &Session, key: &str, value: impl serde::Serialize) -> Result<(), AppError> {
    session
        .insert(key, value)
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to write session: {e}")))
}

/// Writes a sign-in or refresh result into the browser session.
pub async fn store_auth_session(
    session: &Session,
    auth: &AuthSession,
    fallback_email: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    store(session, ACCESS_TOKEN_KEY, &auth.access_token).await?;
    if let Some(refresh) = auth.refresh_token.as_deref() {
        store(session, REFRESH_TOKEN_KEY, refresh).await?;
    }
    if let Some(expires_at) = auth.expiry(now.timestamp()) {
        store(session, EXPIRES_AT_KEY, expires_at).await?;
    }
    store(session, USER_ID_KEY, &auth.user.id).await?;
    store(session, EMAIL_KEY, auth.user.email.as_deref().unwrap_or(fallback_email)).await
}

/// Drops the admin session and sends the browser back to the login page.
pub async fn sign_in_again(session: &Session) -> Response {
    session.clear().await;
    Redirect::to("/login").into_response()
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Failed to extract session").into_response())?;

        let access_token: Option<String> = session.get(ACCESS_TOKEN_KEY).await.unwrap_or(None);
        let user_id: Option<String> = session.get(USER_ID_KEY).await.unwrap_or(None);
        let email: String = session.get(EMAIL_KEY).await.unwrap_or(None).unwrap_or_default();
        let expires_at: Option<i64> = session.get(EXPIRES_AT_KEY).await.unwrap_or(None);

        let (Some(access_token), Some(user_id)) = (access_token, user_id) else {
            return Err(Redirect::to("/login").into_response());
        };

        let now = Utc::now();
        if !needs_refresh(expires_at, now) {
            return Ok(AdminUser {
                user_id,
                email,
                access_token,
            });
        }

        let refresh_token: Option<String> = session.get(REFRESH_TOKEN_KEY).await.unwrap_or(None);
        let Some(refresh_token) = refresh_token else {
            tracing::info!(user_id = %user_id, "Admin token expired without a refresh token");
            return Err(sign_in_again(&session).await);
        };

        match state.auth.refresh_session(&refresh_token).await {
            Ok(auth) => {
                store_auth_session(&session, &auth, &email, now)
                    .await
                    .map_err(IntoResponse::into_response)?;
                Ok(AdminUser {
                    user_id: auth.user.id,
                    email: auth.user.email.unwrap_or(email),
                    access_token: auth.access_token,
                })
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Could not refresh admin session");
                Err(sign_in_again(&session).await)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn refreshes_shortly_before_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let ts = now.timestamp();

        assert!(!needs_refresh(None, now));
        assert!(!needs_refresh(Some(ts + 3600), now));
        assert!(needs_refresh(Some(ts + 30), now));
        assert!(needs_refresh(Some(ts - 10), now));
    }
}
