pub mod calendar;
pub mod drafts;
pub mod posts;
pub mod prefs;
pub mod today;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Largest accepted request body. Phone photos land well under this.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// The whole application: the JSON API plus the image bucket served as
/// static files under /images.
pub fn app(state: AppState) -> Router {
    let images_dir = state.config.images_path().clone();

    Router::new()
        .merge(today::router())
        .merge(posts::router())
        .merge(calendar::router())
        .merge(prefs::router())
        .merge(drafts::router())
        .nest_service("/images", ServeDir::new(images_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
