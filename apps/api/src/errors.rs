use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::applications::decision::DecisionError;
use crate::applications::submission::SubmissionError;
use crate::attachments::form::FormError;
use crate::attachments::resolver::{ResolveError, ValidationError};
use crate::backend::BackendError;
use crate::profiles::ProfileError;
use crate::saved_jobs::SavedJobError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        tracing::debug!("Rejected form field '{}': {err}", err.field());
        AppError::Validation(err.to_string())
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(msg) => AppError::NotFound(msg),
            BackendError::Conflict(msg) => AppError::Conflict(msg),
            BackendError::Transport(msg) => AppError::Upstream(msg),
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Validation(err) => err.into(),
            upload @ ResolveError::UploadFailed { .. } => AppError::Upstream(upload.to_string()),
        }
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Validation(err) => err.into(),
            malformed @ FormError::Malformed(_) => AppError::Validation(malformed.to_string()),
        }
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        if err.is_conflict() {
            return AppError::Conflict(err.to_string());
        }
        match err {
            SubmissionError::Validation(err) => err.into(),
            SubmissionError::ProfilePersistFailed(BackendError::NotFound(_)) => {
                AppError::NotFound(err.to_string())
            }
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<DecisionError> for AppError {
    fn from(err: DecisionError) -> Self {
        match err {
            DecisionError::AlreadyDecided { .. } | DecisionError::InFlight(_) => {
                AppError::Conflict(err.to_string())
            }
            DecisionError::NotFound(_) => AppError::NotFound(err.to_string()),
            DecisionError::Backend(_) => AppError::Upstream(err.to_string()),
        }
    }
}

impl From<SavedJobError> for AppError {
    fn from(err: SavedJobError) -> Self {
        match err {
            SavedJobError::MissingKey => AppError::Validation(err.to_string()),
            SavedJobError::Backend(err) => err.into(),
        }
    }
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Resolve(err) => err.into(),
            ProfileError::NotFound(_) => AppError::NotFound(err.to_string()),
            ProfileError::LookupFailed(_) | ProfileError::PersistFailed(_) => {
                AppError::Upstream(err.to_string())
            }
        }
    }
}
