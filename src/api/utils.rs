//! API utility functions
//!
//! Pure, stateless helpers for HTTP request processing, kept apart from the
//! handlers so they can be unit tested.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use crate::api::error::ApiError;

/// Parses the content type of an uploaded file, accepting only `image/*`
///
/// A missing content type is treated as an image; the stored extension then
/// falls back to jpg.
pub fn parse_image_content_type(content_type: Option<&str>) -> Result<Option<mime::Mime>, ApiError> {
    let Some(content_type) = content_type else {
        return Ok(None);
    };

    let media_type: mime::Mime = content_type.parse().map_err(|_| {
        ApiError::InvalidPayload(format!("invalid Content-Type: {}", content_type))
    })?;

    if media_type.type_() != mime::IMAGE {
        return Err(ApiError::InvalidPayload(format!(
            "uploads must be images, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(Some(media_type))
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
