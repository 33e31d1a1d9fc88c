use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::applications::decision::Decision;
use crate::applications::submission::SubmissionRequest;
use crate::attachments::form::MultipartForm;
use crate::attachments::resolver::SlotKind;
use crate::errors::AppError;
use crate::models::application::{ApplicationId, JobApplication};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
}

/// POST /api/v1/applications
pub async fn handle_submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JobApplication>), AppError> {
    let mut form = MultipartForm::read(multipart, state.max_upload_bytes).await?;
    let request = SubmissionRequest {
        user_email: form.require("user_email")?,
        job_id: form.require("job_id")?,
        resume: form.take_selection(SlotKind::Resume),
        cover_letter: form.take_selection(SlotKind::CoverLetter),
    };
    let application = state.submitter.submit(request).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobApplication>, AppError> {
    let id = ApplicationId(id);
    let application = state
        .backend
        .fetch_application(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    Ok(Json(application))
}

/// POST /api/v1/applications/:id/decision
pub async fn handle_decide(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<JobApplication>, AppError> {
    let updated = state
        .decisions
        .decide(&ApplicationId(id), req.decision)
        .await?;
    Ok(Json(updated))
}
