use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use super::{
    error::ApiError,
    models::{DeadLetterQuery, DeadLetterView, SyncJobAccepted, SyncJobRequest},
    state::AppState,
    validation::validate_sync_request,
};
use crate::observability::MetricsSnapshot;
use crate::proto::SyncJob;

/// Liveness plus queue readability (GET /health)
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state
        .queue
        .read()
        .await
        .health_check()
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;

    if !state.broker.health_check() {
        return Err(ApiError::Unavailable("worker channels closed".to_string()));
    }

    Ok((StatusCode::OK, "ok"))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Persist a sync job and hand it to the worker pool (POST /sync-jobs)
///
/// Returns 202 once the job is durable; the import itself runs later.
/// Submitting the same folder twice is harmless, the second run skips
/// everything already cataloged.
pub async fn enqueue_sync_job(
    State(state): State<AppState>,
    Json(request): Json<SyncJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_sync_request(&request)?;

    let job = SyncJob::new(request.channel_id, request.integration_id, request.folder_id);
    let trace_id = job.trace_id.clone();

    let seq = state.broker.enqueue(job).await?;
    state.metrics.job_accepted();

    info!(seq, trace_id = %trace_id, "Sync job accepted");

    Ok((StatusCode::ACCEPTED, Json(SyncJobAccepted { seq, trace_id })))
}

/// GET /operators/dlq?limit=N
pub async fn list_dead_letters(
    State(state): State<AppState>,
    Query(query): Query<DeadLetterQuery>,
) -> Result<Json<Vec<DeadLetterView>>, ApiError> {
    let entries = state.queue.read().await.list_dlq(query.limit)?;

    Ok(Json(
        entries
            .into_iter()
            .map(|(seq, entry)| DeadLetterView::new(seq, entry))
            .collect(),
    ))
}
