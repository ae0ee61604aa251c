use axum::{
    Extension,
    body::Bytes,
    extract::{Path, State},
    http::Method,
    response::Response,
};

use super::relay::{forward, json_body, method_not_allowed, recipe_path};
use crate::{server::AppState, types::Session};

/// `/api/recipes`: list (`GET`) and create (`POST`).
pub async fn collection(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    method: Method,
    body: Bytes,
) -> Response {
    match method {
        Method::GET => forward(&state, &session, Method::GET, "/recipes", None).await,
        Method::POST => match json_body(&body) {
            Ok(body) => forward(&state, &session, Method::POST, "/recipes", Some(body)).await,
            Err(rejection) => rejection,
        },
        _ => method_not_allowed(&[Method::GET, Method::POST]),
    }
}

/// `/api/recipes/{id}`: fetch (`GET`), full update (`PUT`) and remove
/// (`DELETE`).
pub async fn item(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    method: Method,
    body: Bytes,
) -> Response {
    if !matches!(method, Method::GET | Method::PUT | Method::DELETE) {
        return method_not_allowed(&[Method::GET, Method::PUT, Method::DELETE]);
    }
    let path = match recipe_path(&id, "") {
        Ok(path) => path,
        Err(rejection) => return rejection,
    };

    let body = if method == Method::PUT {
        match json_body(&body) {
            Ok(body) => Some(body),
            Err(rejection) => return rejection,
        }
    } else {
        None
    };

    forward(&state, &session, method, &path, body).await
}
