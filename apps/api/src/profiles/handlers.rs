use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::Deserialize;

use crate::attachments::form::MultipartForm;
use crate::attachments::resolver::SlotKind;
use crate::errors::AppError;
use crate::models::profile::{PersonalDetails, UserProfile};
use crate::profiles::{ProfileUpdate, ProfileView};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<EmailQuery>,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(state.profiles.view(&params.email).await?))
}

/// PUT /api/v1/profile
pub async fn handle_save_profile(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UserProfile>, AppError> {
    let mut form = MultipartForm::read(multipart, state.max_upload_bytes).await?;
    let update = ProfileUpdate {
        email: form.text_or_default("email"),
        details: PersonalDetails {
            full_name: form.text_or_default("full_name"),
            phone: form.text_or_default("phone"),
            address: form.text_or_default("address"),
            education: form.text_or_default("education"),
            experience: form.text_or_default("experience"),
            skills: split_skills(form.text("skills").unwrap_or_default()),
        },
        resume: form.take_selection(SlotKind::Resume),
        cover_letter: form.take_selection(SlotKind::CoverLetter),
        profile_photo: form.take_selection(SlotKind::ProfilePhoto),
        self_intro_video: form.take_selection(SlotKind::SelfIntroVideo),
    };
    Ok(Json(state.profiles.save(update).await?))
}

/// Skills arrive as one comma-separated field.
fn split_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
