use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::user::ACCESS_TOKEN_KEY;

/// Sends visitors without an admin session to the login page.
pub async fn require_admin(session: Session, request: Request<Body>, next: Next) -> Response {
    let access_token: Option<String> = session.get(ACCESS_TOKEN_KEY).await.unwrap_or(None);

    if access_token.is_none() {
        tracing::debug!(path = %request.uri().path(), "No admin session, redirecting to login");
        return Redirect::to("/login").into_response();
    }

    next.run(request).await
}
