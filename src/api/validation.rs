use thiserror::Error;

use super::error::ApiError;
use super::models::{PublishRequest, SettingRequest, UrlUploadRequest};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} must be an http/https url")]
    InvalidUrl(&'static str),
    #[error("{0} must be an http/https url or a /uploads/ path")]
    InvalidImageUrl(&'static str),
}

impl From<RequestValidationError> for ApiError {
    fn from(value: RequestValidationError) -> Self {
        ApiError::InvalidPayload(value.to_string())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn require(value: &str, field: &'static str) -> Result<(), RequestValidationError> {
    if value.trim().is_empty() {
        return Err(RequestValidationError::Missing(field));
    }
    Ok(())
}

pub fn validate_publish(request: &PublishRequest) -> Result<(), RequestValidationError> {
    require(&request.image_url, "imageUrl")?;
    require(&request.link_url, "linkUrl")?;

    if !is_http_url(&request.image_url) && !request.image_url.starts_with('/') {
        return Err(RequestValidationError::InvalidImageUrl("imageUrl"));
    }
    if !is_http_url(&request.link_url) {
        return Err(RequestValidationError::InvalidUrl("linkUrl"));
    }
    Ok(())
}

pub fn validate_setting(request: &SettingRequest) -> Result<(), RequestValidationError> {
    require(&request.key, "key")?;
    require(&request.value, "value")
}

/// Remote downloads must be http(s); `data:` URLs are decoded locally
pub fn validate_upload_url(request: &UrlUploadRequest) -> Result<(), RequestValidationError> {
    require(&request.url, "url")?;
    if request.url.starts_with("data:") || is_http_url(&request.url) {
        Ok(())
    } else {
        Err(RequestValidationError::InvalidUrl("url"))
    }
}
