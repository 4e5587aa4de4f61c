use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Serialize;

use crate::journal::model::{today_utc, Author, Post};
use crate::state::AppState;

pub const FETCH_ERROR: &str = "データの取得に失敗しました";

#[derive(Serialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub father: Option<Post>,
    pub mother: Option<Post>,
    pub error: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/today", get(today))
}

/// GET /api/today
/// Both authors' entries for the current UTC day. A failed fetch still
/// answers with an empty day plus the error so the view can render.
async fn today(State(state): State<AppState>) -> Json<TodayResponse> {
    let date = today_utc();

    let mut response = TodayResponse { date, father: None, mother: None, error: None };
    match state.repo.posts_for_date(date).await {
        Ok(posts) => {
            for post in posts {
                match post.author {
                    Author::Father => response.father = Some(post),
                    Author::Mother => response.mother = Some(post),
                }
            }
        }
        Err(e) => {
            tracing::error!("Fetching today's entries failed: {}", e);
            response.error = Some(FETCH_ERROR.to_string());
        }
    }

    Json(response)
}
