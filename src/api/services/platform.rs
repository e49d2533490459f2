//! Platform configuration, immediate publish and token refresh

use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::api::error::ApiError;
use crate::api::models::{
    PlatformConfigResponse, PublishRequest, PublishResponse, TokenRefreshResponse,
};
use crate::api::state::AppState;
use crate::api::validation::validate_publish;
use crate::platform::{self, PublishCredentials};
use crate::worker::{StoryRequest, publish_story};

pub async fn platform_config(
    State(state): State<AppState>,
) -> Result<Json<PlatformConfigResponse>, ApiError> {
    Ok(Json(PlatformConfigResponse {
        configured: platform::is_configured(&state.catalog)?,
    }))
}

/// Publish a story now, bypassing the queue (POST /api/platform/publish)
///
/// Runs the full container protocol inside the request, so the response can
/// take as long as the poll policy allows.
pub async fn publish_now(
    State(state): State<AppState>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<Json<PublishResponse>, ApiError> {
    let Json(request) = payload?;
    validate_publish(&request)?;

    let credentials =
        PublishCredentials::require(&state.catalog, &state.config.server.public_base_url)?;

    let story = StoryRequest {
        image_url: request.image_url,
        link_url: request.link_url,
        caption: request.caption,
    };
    let post_id = publish_story(state.platform.as_ref(), &credentials, &story, state.poll).await?;
    state.metrics.item_published();

    Ok(Json(PublishResponse {
        success: true,
        post_id,
    }))
}

pub async fn refresh_token(
    State(state): State<AppState>,
) -> Result<Json<TokenRefreshResponse>, ApiError> {
    let refreshed = platform::refresh_token(&state.catalog, state.platform.as_ref()).await?;
    Ok(Json(TokenRefreshResponse {
        success: true,
        new_token: refreshed.new_token,
        expires_in_days: refreshed.expires_in_days,
    }))
}
