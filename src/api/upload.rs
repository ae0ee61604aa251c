//! Photo upload relay.
//!
//! `received → validated → forwarded → rewritten → returned`. The route reads
//! the multipart stream itself, checks the `file` field, re-encodes it for the
//! backend and makes the returned photo URL absolute.

use axum::{
    Extension, Json,
    extract::{FromRequest, Multipart, Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::relay::{error_response, method_not_allowed, relay};
use crate::{
    auth::resolve_token, client::ApiBody, error::ApiError, server::AppState, types::Session,
    utils, warning,
};

/// Largest accepted photo: 5 MiB.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Request body limit of the upload route. Leaves room for multipart framing
/// so oversized files reach the relay's own size check.
pub const BODY_LIMIT: usize = MAX_PHOTO_BYTES + 1024 * 1024;

const FILE_FIELD: &str = "file";
const DEFAULT_FILENAME: &str = "upload.jpg";

struct Upload {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

/// `POST /api/upload-photo`.
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    request: Request,
) -> Response {
    if request.method() != Method::POST {
        return method_not_allowed(&[Method::POST]);
    }

    let multipart = match Multipart::from_request(request, &state).await {
        Ok(multipart) => multipart,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let upload = match read_photo(multipart).await {
        Ok(upload) => upload,
        Err(reason) => return error_response(StatusCode::BAD_REQUEST, reason),
    };

    let token = resolve_token(
        state.sessions.as_ref(),
        &session,
        Some(&state.config.audience),
    )
    .await;
    let Some(token) = token else {
        return error_response(StatusCode::UNAUTHORIZED, "No access token");
    };

    match forward_photo(&state, upload, &token).await {
        Ok(response) => response,
        Err(e) => {
            warning!("Photo upload failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn read_photo(mut multipart: Multipart) -> Result<Upload, String> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read multipart data: {}", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.to_ascii_lowercase().starts_with("image/") {
            return Err(format!(
                "Invalid content type '{}'. Only image uploads are accepted",
                content_type
            ));
        }

        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| format!("Failed to read file data: {}", e))?
        {
            if data.len() + chunk.len() > MAX_PHOTO_BYTES {
                return Err(format!(
                    "File too large. Maximum size is {} bytes",
                    MAX_PHOTO_BYTES
                ));
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(Upload {
            filename,
            content_type,
            data,
        });
    }

    Err("No file provided".to_string())
}

async fn forward_photo(state: &AppState, upload: Upload, token: &str) -> Result<Response, ApiError> {
    let part = Part::bytes(upload.data)
        .file_name(upload.filename)
        .mime_str(&upload.content_type)?;
    let form = Form::new().part(FILE_FIELD, part);

    let response = state
        .api
        .post_multipart("/upload-photo", form, token)
        .await?;
    let status = response.status;

    if !status.is_success() {
        warning!("Backend rejected photo upload with {}", status);
        return Ok(relay(response));
    }

    // must be JSON whatever its declared content type
    let mut body: Value = match response.body {
        ApiBody::Json(value) => value,
        ApiBody::Text(text) => serde_json::from_str(&text)?,
    };

    let rewritten = body
        .get("photo_url")
        .and_then(Value::as_str)
        .map(|url| utils::absolutize_photo_url(state.api.base_url(), url));
    if let Some(url) = rewritten {
        body["photo_url"] = Value::String(url);
    }

    Ok((status, Json(body)).into_response())
}
