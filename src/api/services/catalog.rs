//! Collections, assets, slots, settings and the sent log

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
};
use tracing::info;

use crate::api::error::ApiError;
use crate::api::models::{
    AssetUpdateRequest, SentLogCreated, SettingRequest, SettingResponse, SuccessResponse,
};
use crate::api::state::AppState;
use crate::api::validation::validate_setting;
use crate::catalog::{
    Asset, Collection, CollectionUpdate, CollectionWithAssets, NewAsset, NewCollection,
    NewSentLogEntry, NewSlot, SentLogEntry, Slot,
};
use crate::schedule::calendar::now_ms;

pub async fn list_collections(
    State(state): State<AppState>,
) -> Result<Json<Vec<CollectionWithAssets>>, ApiError> {
    Ok(Json(state.catalog.list_collections()?))
}

pub async fn create_collection(
    State(state): State<AppState>,
    payload: Result<Json<NewCollection>, JsonRejection>,
) -> Result<Json<Collection>, ApiError> {
    let Json(input) = payload?;
    let collection = state.catalog.create_collection(input, now_ms())?;
    info!(collection_id = %collection.id, "Collection created");
    Ok(Json(collection))
}

pub async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CollectionUpdate>, JsonRejection>,
) -> Result<Json<Collection>, ApiError> {
    let Json(update) = payload?;
    Ok(Json(state.catalog.update_collection(&id, update)?))
}

/// Deletes the collection and its assets, then their stored images
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let assets = state.catalog.delete_collection(&id)?;
    for asset in &assets {
        state.images.delete_best_effort(&asset.image_url).await;
    }
    info!(collection_id = %id, assets = assets.len(), "Collection deleted");
    Ok(Json(SuccessResponse::ok()))
}

pub async fn add_asset(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    payload: Result<Json<NewAsset>, JsonRejection>,
) -> Result<Json<Asset>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.catalog.add_asset(&collection_id, input)?))
}

pub async fn update_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AssetUpdateRequest>, JsonRejection>,
) -> Result<Json<Asset>, ApiError> {
    let Json(update) = payload?;
    Ok(Json(state.catalog.update_asset(
        &id,
        update.description,
        update.last_used,
    )?))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let asset = state.catalog.delete_asset(&id)?;
    state.images.delete_best_effort(&asset.image_url).await;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn list_slots(State(state): State<AppState>) -> Result<Json<Vec<Slot>>, ApiError> {
    Ok(Json(state.catalog.list_slots()?))
}

pub async fn create_slot(
    State(state): State<AppState>,
    payload: Result<Json<NewSlot>, JsonRejection>,
) -> Result<Json<Slot>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.catalog.create_slot(input)?))
}

pub async fn delete_slot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.catalog.delete_slot(&id)?;
    Ok(Json(SuccessResponse::ok()))
}

/// Unknown keys answer `{"value": null}`, not 404
pub async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SettingResponse>, ApiError> {
    Ok(Json(SettingResponse {
        value: state.catalog.get_setting(&key)?,
    }))
}

pub async fn put_setting(
    State(state): State<AppState>,
    payload: Result<Json<SettingRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = payload?;
    validate_setting(&request)?;
    state.catalog.put_setting(request.key.trim(), &request.value)?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn list_sent_log(
    State(state): State<AppState>,
) -> Result<Json<Vec<SentLogEntry>>, ApiError> {
    Ok(Json(state.catalog.list_sent_log()?))
}

pub async fn add_sent_log(
    State(state): State<AppState>,
    payload: Result<Json<NewSentLogEntry>, JsonRejection>,
) -> Result<Json<SentLogCreated>, ApiError> {
    let Json(input) = payload?;
    let entry = state.catalog.add_sent_log(input, now_ms())?;
    Ok(Json(SentLogCreated { id: entry.id }))
}

pub async fn delete_sent_log(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Path(id) = id?;
    state.catalog.delete_sent_log(id)?;
    Ok(Json(SuccessResponse::ok()))
}
