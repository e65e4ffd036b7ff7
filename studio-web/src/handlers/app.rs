use axum::{extract::State, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "studio-web",
        "stores": {
            "services": { "loading": state.services.is_loading(), "count": state.services.len() },
            "receipts": { "loading": state.receipts.is_loading(), "count": state.receipts.len() },
            "settings": { "loading": state.settings.is_loading() }
        }
    }))
}

pub async fn metrics() -> impl IntoResponse {
    crate::services::metrics::get_metrics()
}
