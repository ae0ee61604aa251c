use axum::{
    Json,
    body::Bytes,
    http::{
        HeaderValue, Method, StatusCode,
        header::{ALLOW, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::{
    auth::resolve_token,
    client::{ApiBody, ApiResponse},
    server::AppState,
    types::{ErrorBody, Session},
    warning,
};

/// Forwards a call to the backend on behalf of `session` and relays the
/// answer. The token is resolved for the configured audience; without one the
/// call goes out unauthenticated and the backend decides.
pub async fn forward(
    state: &AppState,
    session: &Session,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> Response {
    let token = resolve_token(
        state.sessions.as_ref(),
        session,
        Some(&state.config.audience),
    )
    .await;

    match state
        .api
        .send(method.clone(), path, body.as_ref(), token.as_deref())
        .await
    {
        Ok(response) => {
            if !response.status.is_success() {
                warning!("{} {} answered {}", method, path, response.status);
            }
            relay(response)
        }
        Err(e) => {
            warning!("Proxy call {} {} failed: {}", method, path, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Passes a backend response through: same status, JSON stays JSON, text
/// stays text.
pub fn relay(response: ApiResponse) -> Response {
    match response.body {
        ApiBody::Json(value) => (response.status, Json(value)).into_response(),
        ApiBody::Text(text) => (
            response.status,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            text,
        )
            .into_response(),
    }
}

/// Request body to forward. An empty body becomes `{}`.
pub fn json_body(body: &Bytes) -> Result<Value, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e))
    })
}

pub fn method_not_allowed(allowed: &[Method]) -> Response {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut response = (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Backend path of a single recipe. Ids are opaque, but must stay one path
/// segment.
pub fn recipe_path(id: &str, suffix: &str) -> Result<String, Response> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '?', '#', '%']);
    if !valid {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid recipe id '{}'", id),
        ));
    }
    Ok(format!("/recipes/{}{}", id, suffix))
}
