use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::journal::model::CalendarDay;
use crate::journal::timeline::{month_bounds, month_grid, next_month, prev_month};
use crate::routes::today::FETCH_ERROR;
use crate::state::AppState;

// -- Response types --

#[derive(Serialize)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
    pub prev: MonthRef,
    pub next: MonthRef,
    pub error: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/calendar/{year}/{month}", get(month_view))
}

/// GET /api/calendar/{year}/{month}
/// The month grid with posts attached to their days, plus where the
/// prev/next arrows lead. A failed fetch still returns the full grid,
/// just with empty days and the error set.
async fn month_view(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> AppResult<Json<CalendarResponse>> {
    let Some((first, last)) = month_bounds(year, month) else {
        return Err(AppError::BadRequest(format!("No such month: {}-{}", year, month)));
    };

    let (posts, error) = match state.repo.posts_for_range(first, last).await {
        Ok(posts) => (posts, None),
        Err(e) => {
            tracing::error!("Fetching the month's entries failed: {}", e);
            (Vec::new(), Some(FETCH_ERROR.to_string()))
        }
    };

    let (prev_year, prev_mon) = prev_month(year, month);
    let (next_year, next_mon) = next_month(year, month);

    Ok(Json(CalendarResponse {
        year,
        month,
        days: month_grid(year, month, &posts),
        prev: MonthRef { year: prev_year, month: prev_mon },
        next: MonthRef { year: next_year, month: next_mon },
        error,
    }))
}
