pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::attachments::handlers as attachments;
use crate::attachments::resolver::SlotKind;
use crate::profiles::handlers as profiles;
use crate::saved_jobs::handlers as saved_jobs;
use crate::state::AppState;

/// Room for the text parts of a form on top of its files.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Per-file limits are enforced while reading the form; this caps the body.
    let body_limit = state
        .max_upload_bytes
        .saturating_mul(SlotKind::ALL.len())
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/profile",
            get(profiles::handle_get_profile).put(profiles::handle_save_profile),
        )
        .route("/api/v1/applications", post(applications::handle_submit))
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application),
        )
        .route(
            "/api/v1/applications/:id/decision",
            post(applications::handle_decide),
        )
        .route(
            "/api/v1/saved-jobs",
            get(saved_jobs::handle_list)
                .post(saved_jobs::handle_save)
                .delete(saved_jobs::handle_remove),
        )
        .route(
            "/api/v1/attachments/url",
            get(attachments::handle_resolve_url),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
