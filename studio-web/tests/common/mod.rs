#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use http_body_util::BodyExt;
use secrecy::Secret;
use studio_core::config::TelemetrySettings;
use studio_core::supabase::{ChangeHub, RestClient, SupabaseSettings};
use studio_web::config::{ServerSettings, Settings, StudioSettings};
use studio_web::AppState;
use wiremock::MockServer;

pub const ANON_KEY: &str = "anon-key";

pub fn test_settings(server: &MockServer) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            secure_cookies: false,
        },
        supabase: SupabaseSettings {
            url: server.uri(),
            anon_key: Secret::new(ANON_KEY.to_string()),
        },
        studio: StudioSettings {
            realtime: false,
            ..StudioSettings::default()
        },
        telemetry: TelemetrySettings::default(),
    }
}

/// State pointed at the mock backend; stores are not mounted.
pub fn test_state(server: &MockServer) -> AppState {
    AppState::new(&test_settings(server), ChangeHub::default())
}

pub fn rest_client(server: &MockServer) -> RestClient {
    RestClient::new(&test_settings(server).supabase)
}

pub fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// The `name=value` part of the session cookie a response sets.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
