use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::errors::AppError;
use crate::saved_jobs::{Ack, SavedJobView};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Deserialize)]
pub struct SavedJobRequest {
    pub user_email: String,
    pub job_id: String,
}

/// GET /api/v1/saved-jobs
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<EmailQuery>,
) -> Result<Json<Vec<SavedJobView>>, AppError> {
    let jobs = state.saved_jobs.list(&params.email, Utc::now()).await?;
    Ok(Json(jobs))
}

/// POST /api/v1/saved-jobs
pub async fn handle_save(
    State(state): State<AppState>,
    Json(req): Json<SavedJobRequest>,
) -> Result<Json<Ack>, AppError> {
    Ok(Json(state.saved_jobs.save(&req.user_email, &req.job_id).await?))
}

/// DELETE /api/v1/saved-jobs
pub async fn handle_remove(
    State(state): State<AppState>,
    Json(req): Json<SavedJobRequest>,
) -> Result<Json<Ack>, AppError> {
    Ok(Json(
        state
            .saved_jobs
            .remove(&req.user_email, &req.job_id)
            .await?,
    ))
}
