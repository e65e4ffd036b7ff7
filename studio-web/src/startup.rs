use std::time::Duration as StdDuration;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use studio_core::error::AppError;
use studio_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use studio_core::supabase::{ChangeHub, RealtimeListener};
use time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Settings;
use crate::handlers::{admin, app, auth, quote};
use crate::middleware::auth::require_admin;
use crate::models::{Receipt, Service};
use crate::stores::settings::TABLE as SETTINGS_TABLE;
use crate::stores::{Mount, Record};
use crate::AppState;

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/services", post(admin::create_service))
        .route("/admin/services/:id", post(admin::update_service))
        .route("/admin/services/:id/toggle", post(admin::toggle_service))
        .route("/admin/services/:id/delete", post(admin::delete_service))
        .route("/admin/receipts/:id/status", post(admin::update_receipt_status))
        .route("/admin/receipts/:id/delete", post(admin::delete_receipt))
        .route("/admin/settings/business", post(admin::save_business))
        .route("/admin/settings/payments", post(admin::save_payments))
        .route("/admin/settings/theme", post(admin::set_theme))
        .route("/admin/settings/dark-mode", post(admin::toggle_dark_mode))
        .route_layer(from_fn(require_admin))
}

pub fn build_router(state: AppState, secure_cookies: bool) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    Router::new()
        .route("/", get(quote::index))
        .route("/quote/items/:id/add", post(quote::add_item))
        .route("/quote/items/:id/quantity", post(quote::set_quantity))
        .route("/quote/items/:id/remove", post(quote::remove_item))
        .route("/quote/details", post(quote::save_details))
        .route("/quote/submit", post(quote::submit))
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route("/logout", get(auth::logout_handler))
        .route("/health", get(app::health_check))
        .route("/metrics", get(app::metrics))
        .merge(admin_routes())
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    state: AppState,
    _mounts: Vec<Mount>,
    realtime: Option<JoinHandle<()>>,
}

impl Application {
    /// Mounts the stores, starts the realtime feed when enabled and binds the
    /// HTTP listener. Port 0 picks a free port.
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        let hub = ChangeHub::default();
        let state = AppState::new(&settings, hub.clone());

        let mounts = vec![state.services.mount(), state.receipts.mount(), state.settings.mount()];

        let realtime = if settings.studio.realtime {
            let listener = RealtimeListener::new(
                &settings.supabase,
                &[Service::TABLE, Receipt::TABLE, SETTINGS_TABLE],
                hub,
            )?
            .with_reconnect_delay(StdDuration::from_secs(settings.studio.reconnect_delay_secs));
            Some(listener.spawn())
        } else {
            tracing::info!("Realtime feed disabled, relying on local change echoes");
            None
        };

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, addr = %address, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();
        tracing::info!(port, "Studio web listener bound");

        let router = build_router(state.clone(), settings.server.secure_cookies);

        Ok(Self {
            port,
            listener,
            router,
            state,
            _mounts: mounts,
            realtime,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serves until Ctrl+C or SIGTERM, then stops the realtime feed and the
    /// store subscriptions.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(realtime) = self.realtime {
            realtime.abort();
        }
        tracing::info!("Studio web stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
