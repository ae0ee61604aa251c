use axum::{
    Extension,
    body::Bytes,
    extract::{Path, State},
    http::Method,
    response::Response,
};

use super::relay::{forward, json_body, method_not_allowed, recipe_path};
use crate::{server::AppState, types::Session};

/// `POST /api/recipes/{id}/export-pdf`. The body (`{"style": ..., "paper":
/// ...}`) goes to the backend as is; its answer carries the URL of the
/// generated PDF.
pub async fn export_pdf(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return method_not_allowed(&[Method::POST]);
    }
    let path = match recipe_path(&id, "/export-pdf") {
        Ok(path) => path,
        Err(rejection) => return rejection,
    };
    match json_body(&body) {
        Ok(body) => forward(&state, &session, Method::POST, &path, Some(body)).await,
        Err(rejection) => rejection,
    }
}
