use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::attachments::reference::AttachmentReference;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReferenceQuery {
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Serialize)]
pub struct AttachmentUrlResponse {
    pub reference: AttachmentReference,
    pub url: Option<String>,
}

/// GET /api/v1/attachments/url
pub async fn handle_resolve_url(
    State(state): State<AppState>,
    Query(params): Query<ReferenceQuery>,
) -> Json<AttachmentUrlResponse> {
    let reference = AttachmentReference::from_stored(params.reference.as_deref());
    let url = state.store.resolve_url(&reference);
    Json(AttachmentUrlResponse { reference, url })
}
