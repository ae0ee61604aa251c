use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use crate::server::AppState;

/// Liveness of the proxy. Does not call the backend.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "login": state.login.is_some(),
    }))
}
