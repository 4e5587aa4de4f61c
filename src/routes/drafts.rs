use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::device::DraftCache;
use crate::journal::model::Author;
use crate::state::AppState;

// -- Request/Response types --

#[derive(Serialize)]
pub struct DraftResponse {
    pub author: Author,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct DraftBody {
    pub comment: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/drafts/{author}",
        get(get_draft).put(put_draft).delete(delete_draft),
    )
}

// -- Handlers --

/// GET /api/drafts/{author}
/// The author's unsaved comment text, if any survived.
async fn get_draft(
    State(state): State<AppState>,
    Path(author): Path<Author>,
) -> Json<DraftResponse> {
    let comment = DraftCache::new(&*state.device).get(author);
    Json(DraftResponse { author, comment })
}

/// PUT /api/drafts/{author}
/// Overwrite the draft; the last write wins.
async fn put_draft(
    State(state): State<AppState>,
    Path(author): Path<Author>,
    Json(body): Json<DraftBody>,
) -> StatusCode {
    DraftCache::new(&*state.device).set(author, &body.comment);
    StatusCode::NO_CONTENT
}

/// DELETE /api/drafts/{author}
async fn delete_draft(State(state): State<AppState>, Path(author): Path<Author>) -> StatusCode {
    DraftCache::new(&*state.device).clear(author);
    StatusCode::NO_CONTENT
}
