use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::server::AppState;

/// Rejects requests without a session before any handler runs. On success
/// the [`crate::types::Session`] is available to handlers as an extension.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = state.sessions.session(request.headers()).await;
    match session {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "not_authenticated",
                "description": "The user does not have an active session or is not authenticated"
            })),
        )
            .into_response(),
    }
}
