use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::{connect, spinner};
use crate::{
    api::upload::MAX_PHOTO_BYTES,
    config::AppConfig,
    error,
    types::{PhotoUploadResponse, Recipe, RecipeInput},
    success, utils,
};

fn image_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// Uploads a photo and, with `recipe`, stores its URL on that recipe.
pub async fn upload_photo(config: &AppConfig, file: &Path, recipe: Option<&str>) {
    let Some(content_type) = image_content_type(file) else {
        error!("{} does not look like an image", file.display());
    };

    let data = match async_fs::read(file).await {
        Ok(data) => data,
        Err(e) => error!("Cannot read {}. Err: {}", file.display(), e),
    };
    if data.len() > MAX_PHOTO_BYTES {
        error!(
            "File too large. Maximum size is {} bytes",
            MAX_PHOTO_BYTES
        );
    }

    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.jpg")
        .to_string();
    let part = match Part::bytes(data).file_name(filename).mime_str(content_type) {
        Ok(part) => part,
        Err(e) => error!("Cannot build upload. Err: {}", e),
    };

    let backend = connect(config).await;
    let pb = spinner("Uploading photo...");
    let result = backend
        .client
        .post_multipart("/upload-photo", Form::new().part("file", part), &backend.token)
        .await;
    pb.finish_and_clear();

    let uploaded = result
        .and_then(|response| response.into_result())
        .and_then(|body| body.into_typed::<PhotoUploadResponse>());
    let uploaded = match uploaded {
        Ok(uploaded) => uploaded,
        Err(e) => error!("Upload failed. Err: {}", e),
    };
    let photo_url = utils::absolutize_photo_url(backend.client.base_url(), &uploaded.photo_url);
    success!("Photo uploaded: {}", photo_url);

    let Some(id) = recipe else {
        return;
    };

    let path = format!("/recipes/{}", id);
    let pb = spinner("Attaching photo...");
    let recipe = match backend.client.get::<Recipe>(&path, Some(&backend.token)).await {
        Ok(recipe) => recipe,
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to load recipe {}. Err: {}", id, e);
        }
    };

    let mut input = RecipeInput::from(recipe);
    input.photo_url = Some(photo_url);
    let result = backend
        .client
        .put::<Value, _>(&path, &input, Some(&backend.token))
        .await;
    pb.finish_and_clear();

    match result {
        Ok(_) => success!("Photo attached to recipe {}", id),
        Err(e) => error!("Failed to update recipe {}. Err: {}", id, e),
    }
}
