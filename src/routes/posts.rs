use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::journal::model::{today_utc, Author, ImageChange, NewImage, Post, PostsByDate};
use crate::journal::timeline::group_by_date;
use crate::journal::workflow::{EntryState, EntryWorkflow};
use crate::routes::today::FETCH_ERROR;
use crate::state::AppState;

const ALREADY_POSTED: &str = "今日はすでに投稿済みです";

// -- Request/Response types --

/// One multipart entry form. `author` only matters on create; `comment`
/// always carries the final text; a picked `image` beats `remove_image`.
struct EntryForm {
    author: Option<Author>,
    comment: String,
    image: Option<NewImage>,
    remove_image: bool,
}

#[derive(Serialize)]
pub struct PostListResponse {
    pub groups: Vec<PostsByDate>,
    pub error: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/{id}", axum::routing::put(update_post).delete(delete_post))
}

// -- Handlers --

/// GET /api/posts
/// The whole diary grouped by day, newest first. A failed fetch
/// degrades to an empty history plus the error.
async fn list_posts(State(state): State<AppState>) -> Json<PostListResponse> {
    match state.repo.all_posts().await {
        Ok(posts) => Json(PostListResponse { groups: group_by_date(posts), error: None }),
        Err(e) => {
            tracing::error!("Fetching the diary history failed: {}", e);
            Json(PostListResponse { groups: Vec::new(), error: Some(FETCH_ERROR.to_string()) })
        }
    }
}

/// POST /api/posts
/// Save today's entry for one author. Each author gets one entry per
/// day; when the day is already taken nothing is written and the
/// answer is 409.
async fn create_post(State(state): State<AppState>, mut multipart: Multipart) -> AppResult<Response> {
    let form = read_entry_form(&mut multipart).await?;
    let author = form
        .author
        .ok_or_else(|| AppError::BadRequest("author is required".into()))?;

    let workflow = EntryWorkflow::new(&*state.repo, &*state.device, author, today_utc());

    let opened = workflow.open().await?;
    if let EntryState::HasEntryToday { .. } = opened {
        return Err(AppError::Conflict(ALREADY_POSTED.into()));
    }

    let mut entry = workflow.edit_comment(opened, form.comment)?;
    if let Some(image) = form.image {
        entry = entry.attach_image(image)?;
    }

    match workflow.submit(entry).await? {
        EntryState::Saved { post, .. } => Ok((StatusCode::CREATED, Json(post)).into_response()),
        EntryState::ConflictRejected { .. } => Err(AppError::Conflict(ALREADY_POSTED.into())),
        other => Err(AppError::Internal(format!(
            "Saving the entry ended in {} state",
            other.state_name()
        ))),
    }
}

/// PUT /api/posts/{id}
/// Rewrite an entry's comment and image reference. Without an image
/// field the saved image stays; `remove_image` clears it.
async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> AppResult<Json<Post>> {
    let form = read_entry_form(&mut multipart).await?;

    let image = if let Some(image) = form.image {
        ImageChange::Replace(image)
    } else if form.remove_image {
        ImageChange::Remove
    } else {
        ImageChange::Keep
    };
    let comment = if form.comment.is_empty() { None } else { Some(form.comment) };

    let post = state.repo.update_post(id, comment, image).await?;
    Ok(Json(post))
}

/// DELETE /api/posts/{id}
/// Soft-delete: the entry leaves every view and the day opens up again.
async fn delete_post(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    state.repo.delete_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_entry_form(multipart: &mut Multipart) -> AppResult<EntryForm> {
    let mut form =
        EntryForm { author: None, comment: String::new(), image: None, remove_image: false };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("author") => {
                let text = field.text().await?;
                let author = text
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("Unknown author: {}", text)))?;
                form.author = Some(author);
            }
            Some("comment") => {
                form.comment = field.text().await?;
            }
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                // Browsers send an empty part for an untouched file input.
                if data.is_empty() {
                    continue;
                }
                let file_name = file_name
                    .ok_or_else(|| AppError::BadRequest("Image upload needs a file name".into()))?;
                let image = NewImage::from_upload(&file_name, data).ok_or_else(|| {
                    AppError::BadRequest(format!("Image file name needs an extension: {}", file_name))
                })?;
                if !crate::storage::is_image_ext(&image.ext) {
                    return Err(AppError::BadRequest(format!("Not an image: {}", file_name)));
                }
                form.image = Some(image);
            }
            Some("remove_image") => {
                let text = field.text().await?;
                form.remove_image = matches!(text.as_str(), "1" | "true" | "on");
            }
            _ => {}
        }
    }

    Ok(form)
}
