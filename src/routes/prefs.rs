use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::device::Preferences;
use crate::journal::model::{Author, FontSize};
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub selected_author: Option<Author>,
    pub font_size: Option<FontSize>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/preferences", get(get_preferences).put(update_preferences))
}

// -- Handlers --

/// GET /api/preferences
/// The device's author and font-size choices, created with defaults on
/// first use.
async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    Json(Preferences::load(&*state.device))
}

/// PUT /api/preferences
/// Update either preference; omitted fields keep their value.
async fn update_preferences(
    State(state): State<AppState>,
    Json(update): Json<PreferencesUpdate>,
) -> Json<Preferences> {
    if let Some(author) = update.selected_author {
        Preferences::set_selected_author(&*state.device, author);
    }
    if let Some(size) = update.font_size {
        Preferences::set_font_size(&*state.device, size);
    }
    Json(Preferences::load(&*state.device))
}
