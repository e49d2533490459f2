use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
};
use tracing::info;

use crate::api::error::ApiError;
use crate::api::models::{EnqueueResponse, SuccessResponse};
use crate::api::state::AppState;
use crate::queue::{NewQueueItem, QueueItem};
use crate::schedule::calendar::now_ms;

/// All items, soonest first
pub async fn list_queue(State(state): State<AppState>) -> Result<Json<Vec<QueueItem>>, ApiError> {
    Ok(Json(state.queue.list()?))
}

pub async fn enqueue(
    State(state): State<AppState>,
    payload: Result<Json<NewQueueItem>, JsonRejection>,
) -> Result<Json<EnqueueResponse>, ApiError> {
    let Json(input) = payload?;
    let item = state.queue.enqueue(input, now_ms())?;
    state.metrics.items_enqueued(1);
    Ok(Json(EnqueueResponse { queue_id: item.id }))
}

/// Cancel a pending item; anything past `pending` is a 409
pub async fn cancel(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Path(id) = id?;
    state.queue.cancel(id)?;
    info!(item_id = id, "Queue item cancelled");
    Ok(Json(SuccessResponse::ok()))
}
