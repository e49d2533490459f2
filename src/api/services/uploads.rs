//! Image uploads into the local image store

use axum::{
    Json,
    extract::rejection::JsonRejection,
    extract::{Multipart, State},
};
use tracing::info;

use crate::api::error::ApiError;
use crate::api::models::{UploadResponse, UrlUploadRequest, UrlUploadResponse};
use crate::api::state::AppState;
use crate::api::utils::parse_image_content_type;
use crate::api::validation::validate_upload_url;

/// Multipart field holding the files
pub const UPLOAD_FIELD: &str = "images";
/// Files accepted per request
pub const MAX_UPLOAD_FILES: usize = 20;

/// Store up to 20 images from the `images` multipart field (POST /api/uploads)
///
/// Other fields are ignored. Each file is checked against the size limit
/// before it is written.
pub async fn upload_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut urls = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if urls.len() == MAX_UPLOAD_FILES {
            return Err(ApiError::InvalidPayload(format!(
                "at most {MAX_UPLOAD_FILES} files per upload"
            )));
        }

        let content_type = parse_image_content_type(field.content_type())?;
        let data = field.bytes().await?;
        let stored = state
            .images
            .put(data, content_type.as_ref().map(|m| m.essence_str()))
            .await?;
        urls.push(stored.url);
    }

    if urls.is_empty() {
        return Err(ApiError::InvalidPayload("No files uploaded".to_string()));
    }

    info!(count = urls.len(), "Images uploaded");
    Ok(Json(UploadResponse { urls }))
}

/// Store an image given by URL (POST /api/uploads/url)
///
/// `data:` URLs are decoded in place; anything else is downloaded.
pub async fn upload_from_url(
    State(state): State<AppState>,
    payload: Result<Json<UrlUploadRequest>, JsonRejection>,
) -> Result<Json<UrlUploadResponse>, ApiError> {
    let Json(request) = payload?;
    validate_upload_url(&request)?;

    let stored = if request.url.starts_with("data:") {
        state.images.put_data_url(&request.url).await?
    } else {
        state.images.fetch_and_put(&request.url).await?
    };

    Ok(Json(UrlUploadResponse { url: stored.url }))
}
