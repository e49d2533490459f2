//! Schedule generation, confirmation and CTA regeneration

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use rand::thread_rng;

use crate::api::error::ApiError;
use crate::api::models::{ConfirmRequest, CtaRequest, CtaResponse, GenerateRequest};
use crate::api::state::AppState;
use crate::schedule::{
    self, ConfirmOptions, ConfirmationReport, GenerationResult, RangeRequest,
    calendar::now_ms, cta, generate_from_catalog,
};

/// Generate a draft schedule (POST /api/schedule/generate)
///
/// Read-only: nothing is stamped until the draft is confirmed.
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<Vec<GenerationResult>>, ApiError> {
    let Json(request) = payload?;
    let range = RangeRequest::parse(
        &request.start,
        &request.end,
        state.config.schedule.max_range_days,
    )?;

    let days = generate_from_catalog(&state.catalog, &range, state.offset, &mut thread_rng())?;
    state.metrics.schedule_generated();
    Ok(Json(days))
}

/// Confirm a reviewed schedule (POST /api/schedule/confirm)
///
/// Conflicts and vanished assets are reported in the body, not as errors.
pub async fn confirm(
    State(state): State<AppState>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Result<Json<ConfirmationReport>, ApiError> {
    let Json(request) = payload?;
    let options = ConfirmOptions {
        enqueue: request.enqueue,
        caption_source: request.caption_source,
    };

    let report = schedule::confirm(
        &state.catalog,
        &state.queue,
        &request.days,
        &options,
        state.offset,
        now_ms(),
    )?;

    if !report.enqueued.is_empty() {
        state.metrics.items_enqueued(report.enqueued.len() as u64);
    }
    Ok(Json(report))
}

pub async fn regenerate_cta(
    payload: Result<Json<CtaRequest>, JsonRejection>,
) -> Result<Json<CtaResponse>, ApiError> {
    let Json(request) = payload?;
    let cta = cta::regenerate_commercial(&request.current, &mut thread_rng());
    Ok(Json(CtaResponse { cta }))
}
