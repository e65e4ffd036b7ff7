use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use studio_core::error::AppError;
use studio_core::supabase::SupabaseError;
use tower_sessions::Session;
use validator::Validate;

use super::Layout;
use crate::models::user::{store_auth_session, ACCESS_TOKEN_KEY};
use crate::AppState;

const MISSING_CREDENTIALS: &str = "Please enter both email and password";
const INVALID_CREDENTIALS: &str = "Invalid login credentials";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Please enter both email and password"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please enter both email and password"))]
    pub password: String,
}

fn login_form(state: &AppState, email: String, error: &str) -> Response {
    let page = LoginTemplate {
        layout: Layout::new("Admin Login", &state.settings.current()),
        email,
        error: error.to_string(),
    };
    if error.is_empty() {
        page.into_response()
    } else {
        (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
    }
}

pub async fn login_page(State(state): State<AppState>, session: Session) -> Response {
    let signed_in: Option<String> = session.get(ACCESS_TOKEN_KEY).await.unwrap_or(None);
    if signed_in.is_some() {
        return Redirect::to("/admin").into_response();
    }
    login_form(&state, String::new(), "")
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Form(payload): Form<LoginRequest>,
) -> Result<Response, AppError> {
    let email = payload.email.trim().to_string();
    if payload.validate().is_err() || email.is_empty() {
        return Ok(login_form(&state, email, MISSING_CREDENTIALS));
    }

    let auth = match state.auth.sign_in_with_password(&email, &payload.password).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!(email = %email, error = %e, "Admin sign-in failed");
            let message = match &e {
                SupabaseError::Api { .. } => e.user_message(),
                _ => INVALID_CREDENTIALS.to_string(),
            };
            return Ok(login_form(&state, email, &message));
        }
    };

    store_auth_session(&session, &auth, &email, Utc::now()).await?;

    tracing::info!(user_id = %auth.user.id, "Admin session started");
    Ok(Redirect::to("/admin").into_response())
}

pub async fn logout_handler(State(state): State<AppState>, session: Session) -> Redirect {
    if let Some(access_token) = session.get::<String>(ACCESS_TOKEN_KEY).await.unwrap_or(None) {
        // Revocation is best effort; the local session is cleared regardless.
        if let Err(e) = state.auth.sign_out(&access_token).await {
            tracing::warn!(error = %e, "Failed to revoke admin session");
        }
    }

    session.clear().await;
    Redirect::to("/")
}
